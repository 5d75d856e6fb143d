use serde::{Deserialize, Deserializer, Serialize};
use std::hash::Hash;

pub const MAX_URL_LEN: usize = 2048;
pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 600;
pub const MAX_ID_LEN: usize = 80;
pub const MAX_TIMESTAMP_LEN: usize = 64;

#[derive(Debug, Clone, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,

    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

impl Hash for Entry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Entry {
    /// Lowercased `title url description tags...`, the text queries run against.
    pub fn searchable_text(&self) -> String {
        let tags = self.tags.join(" ");
        [
            self.title.as_str(),
            self.url.as_str(),
            self.description.as_str(),
            tags.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// No tag survives trimming.
    pub fn is_untagged(&self) -> bool {
        self.tags.iter().all(|t| t.trim().is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_cleared<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

/// Tags as sent by clients: either a list or a comma separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(vec![])
    }
}

impl From<Vec<String>> for TagsInput {
    fn from(tags: Vec<String>) -> Self {
        TagsInput::List(tags)
    }
}

/// Trim, drop empties and collapse inner whitespace runs. Path segments are
/// trimmed and empty ones dropped, so `"dev / go"` and `"dev//go"` both
/// become `"dev/go"`.
pub fn normalize_tags(tags: &TagsInput) -> Vec<String> {
    let raw: Vec<&str> = match tags {
        TagsInput::List(list) => list.iter().map(String::as_str).collect(),
        TagsInput::Csv(csv) => csv.split(',').collect(),
    };
    raw.into_iter()
        .map(normalize_tag)
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_tag(tag: &str) -> String {
    tag.split('/')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("url is required")]
    UrlRequired,

    #[error("url must start with http:// or https://")]
    UrlScheme,
}

/// Create / update / import payload. Every field is optional on the wire.
///
/// An absent field is `None` and keeps the stored value on update. An
/// explicit `null` is read as the empty value and clears it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_cleared",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_cleared",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_cleared",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_cleared",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_cleared",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<TagsInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Validated entry fields, without id or timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    pub title: String,
    pub url: String,
    pub icon_url: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl CleanEntry {
    pub fn into_entry(self, id: String, created_at: String, updated_at: String) -> Entry {
        Entry {
            id,
            created_at,
            updated_at,
            title: self.title,
            url: self.url,
            icon_url: self.icon_url,
            description: self.description,
            tags: self.tags,
        }
    }
}

impl EntryPayload {
    /// Payload fields layered over an existing entry.
    pub fn merged_over(self, entry: &Entry) -> EntryPayload {
        EntryPayload {
            id: Some(entry.id.clone()),
            title: self.title.or_else(|| Some(entry.title.clone())),
            url: self.url.or_else(|| Some(entry.url.clone())),
            icon_url: self.icon_url.or_else(|| Some(entry.icon_url.clone())),
            description: self.description.or_else(|| Some(entry.description.clone())),
            tags: self.tags.or_else(|| Some(TagsInput::List(entry.tags.clone()))),
            created_at: Some(entry.created_at.clone()),
            updated_at: Some(entry.updated_at.clone()),
        }
    }

    /// Strict validation used by create and update.
    pub fn validate(&self) -> Result<CleanEntry, EntryError> {
        self.clean(true)
    }

    /// Import keeps any non-empty url, whatever its scheme.
    pub fn validate_for_import(&self) -> Result<CleanEntry, EntryError> {
        self.clean(false)
    }

    fn clean(&self, require_web_scheme: bool) -> Result<CleanEntry, EntryError> {
        let url = clip(self.url.as_deref().unwrap_or_default(), MAX_URL_LEN)
            .trim()
            .to_string();
        if url.is_empty() {
            return Err(EntryError::UrlRequired);
        }
        if require_web_scheme && !has_web_scheme(&url) {
            return Err(EntryError::UrlScheme);
        }

        let title = clip(self.title.as_deref().unwrap_or(&url), MAX_TITLE_LEN)
            .trim()
            .to_string();

        Ok(CleanEntry {
            title: if title.is_empty() { url.clone() } else { title },
            icon_url: clip(self.icon_url.as_deref().unwrap_or_default(), MAX_URL_LEN)
                .trim()
                .to_string(),
            description: clip(
                self.description.as_deref().unwrap_or_default(),
                MAX_DESCRIPTION_LEN,
            )
            .trim()
            .to_string(),
            tags: self.tags.as_ref().map(normalize_tags).unwrap_or_default(),
            url,
        })
    }

    /// Client supplied id, clipped; `None` when blank.
    pub fn clean_id(&self) -> Option<String> {
        let id = clip(self.id.as_deref().unwrap_or_default(), MAX_ID_LEN).trim();
        (!id.is_empty()).then(|| id.to_string())
    }
}

fn has_web_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// First `max` chars of `s`.
pub fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Current UTC time, RFC 3339 with a `Z` suffix.
pub fn utc_now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
