use crate::entries::{normalize_tags, Entry, EntryError, EntryPayload, TagsInput};

fn payload(url: &str) -> EntryPayload {
    EntryPayload {
        url: Some(url.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_searchable_text() {
    let entry = Entry {
        id: "1".into(),
        title: "Rust Book".into(),
        url: "https://Doc.Rust-Lang.org".into(),
        description: "The Book".into(),
        tags: vec!["dev/Rust".into(), "books".into()],
        ..Default::default()
    };
    assert_eq!(
        entry.searchable_text(),
        "rust book https://doc.rust-lang.org the book dev/rust books"
    );
}

#[test]
fn test_is_untagged() {
    let mut entry = Entry::default();
    assert!(entry.is_untagged());
    entry.tags = vec![" ".into()];
    assert!(entry.is_untagged());
    entry.tags.push("x".into());
    assert!(!entry.is_untagged());
}

#[test]
fn test_entry_deserialize_defaults() {
    let entry: Entry =
        serde_json::from_str(r#"{"id": "e-1", "url": "https://a.com", "tags": null}"#).unwrap();
    assert_eq!(entry.id, "e-1");
    assert!(entry.tags.is_empty());
    assert!(entry.title.is_empty());

    let json = serde_json::to_value(&entry).unwrap();
    assert!(json.get("iconUrl").is_some());
    assert!(json.get("createdAt").is_some());
}

#[test]
fn test_normalize_tags() {
    let list = TagsInput::List(vec![" dev/go ".into(), "".into(), "a   b".into()]);
    assert_eq!(normalize_tags(&list), vec!["dev/go", "a b"]);

    let csv = TagsInput::Csv("dev, news ,, read  later".into());
    assert_eq!(normalize_tags(&csv), vec!["dev", "news", "read later"]);
}

#[test]
fn test_normalize_tags_path_segments() {
    let list = TagsInput::List(vec![
        "dev / go".into(),
        "a//b/".into(),
        "/".into(),
        " read   later / tech ".into(),
    ]);
    assert_eq!(normalize_tags(&list), vec!["dev/go", "a/b", "read later/tech"]);
}

#[test]
fn test_payload_null_is_cleared_and_absent_is_none() {
    let p: EntryPayload = serde_json::from_str(r#"{"title": null, "tags": null}"#).unwrap();
    assert_eq!(p.title.as_deref(), Some(""));
    assert_eq!(p.tags, Some(TagsInput::List(vec![])));
    assert_eq!(p.description, None);
}

#[test]
fn test_tags_input_from_json() {
    let p: EntryPayload = serde_json::from_str(r#"{"tags": "a,b"}"#).unwrap();
    assert_eq!(p.tags, Some(TagsInput::Csv("a,b".into())));
    let p: EntryPayload = serde_json::from_str(r#"{"tags": ["a", "b"]}"#).unwrap();
    assert_eq!(p.tags, Some(TagsInput::List(vec!["a".into(), "b".into()])));
}

#[test]
fn test_validate_requires_url() {
    assert_eq!(EntryPayload::default().validate(), Err(EntryError::UrlRequired));
    assert_eq!(payload("   ").validate(), Err(EntryError::UrlRequired));
}

#[test]
fn test_validate_url_scheme() {
    assert_eq!(payload("ftp://x.org").validate(), Err(EntryError::UrlScheme));
    assert_eq!(payload("example.com").validate(), Err(EntryError::UrlScheme));
    assert!(payload("http://example.com").validate().is_ok());
    assert!(payload(" https://example.com ").validate().is_ok());
}

#[test]
fn test_validate_import_accepts_any_scheme() {
    assert!(payload("ftp://x.org").validate_for_import().is_ok());
    assert_eq!(
        payload("").validate_for_import(),
        Err(EntryError::UrlRequired)
    );
}

#[test]
fn test_validate_title_defaults_to_url() {
    let clean = payload("https://example.com").validate().unwrap();
    assert_eq!(clean.title, "https://example.com");

    let mut p = payload("https://example.com");
    p.title = Some("   ".into());
    assert_eq!(p.validate().unwrap().title, "https://example.com");
}

#[test]
fn test_validate_clips_fields() {
    let mut p = payload("https://example.com");
    p.title = Some("é".repeat(200));
    p.description = Some("d".repeat(1000));
    let clean = p.validate().unwrap();
    assert_eq!(clean.title.chars().count(), 120);
    assert_eq!(clean.description.len(), 600);
}

#[test]
fn test_clean_id() {
    assert_eq!(payload("x").clean_id(), None);
    let mut p = payload("x");
    p.id = Some("  my-id ".into());
    assert_eq!(p.clean_id().as_deref(), Some("my-id"));
    p.id = Some("i".repeat(100));
    assert_eq!(p.clean_id().unwrap().len(), 80);
}

#[test]
fn test_merged_over() {
    let existing = Entry {
        id: "1".into(),
        title: "Old".into(),
        url: "https://old.com".into(),
        tags: vec!["keep".into()],
        created_at: "2024-01-01T00:00:00.000Z".into(),
        ..Default::default()
    };
    let patch = EntryPayload {
        title: Some("New".into()),
        ..Default::default()
    };
    let clean = patch.merged_over(&existing).validate().unwrap();
    assert_eq!(clean.title, "New");
    assert_eq!(clean.url, "https://old.com");
    assert_eq!(clean.tags, vec!["keep"]);

    let cleared: EntryPayload =
        serde_json::from_str(r#"{"title": null, "description": null, "tags": null}"#).unwrap();
    let clean = cleared.merged_over(&existing).validate().unwrap();
    assert_eq!(clean.title, "https://old.com");
    assert!(clean.description.is_empty());
    assert!(clean.tags.is_empty());
}
