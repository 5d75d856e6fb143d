use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entries::Entry;

/// Path of the synthetic root holding every entry.
pub const ALL_PATH: &str = "__ALL__";
/// Name and path of the bucket for entries without tags.
pub const UNTAGGED: &str = "Untagged";

const ROOT_NAME: &str = "All";

/// One segment of a `/` delimited tag path.
///
/// `ids` holds every entry tagged with this path or any path below it, so a
/// node's set is always the union of its children's sets plus its own
/// directly tagged entries. Children carry no ordering; use
/// [`TagNode::sorted_children`] for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub name: String,
    pub path: String,
    pub children: HashMap<String, TagNode>,
    pub ids: HashSet<String>,
}

impl TagNode {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            children: HashMap::new(),
            ids: HashSet::new(),
        }
    }

    /// Number of unique entries under this node.
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn child(&self, name: &str) -> Option<&TagNode> {
        self.children.get(name)
    }

    /// Look up a node by full path, `__ALL__` or `Untagged`.
    pub fn find(&self, path: &str) -> Option<&TagNode> {
        if path == ALL_PATH {
            return Some(self);
        }
        if path == UNTAGGED {
            return self.child(UNTAGGED);
        }
        split_path(path)
            .into_iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Children by descending count, then name.
    pub fn sorted_children(&self) -> Vec<&TagNode> {
        let mut kids: Vec<&TagNode> = self.children.values().collect();
        kids.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.name.cmp(&b.name)));
        kids
    }

    pub fn view(&self) -> TagTreeView {
        TagTreeView {
            name: self.name.clone(),
            path: self.path.clone(),
            count: self.count(),
            children: self
                .children
                .iter()
                .map(|(name, child)| (name.clone(), child.view()))
                .collect(),
        }
    }

    fn child_mut_or_insert(&mut self, segment: &str) -> &mut TagNode {
        let path = if self.path == ALL_PATH {
            segment.to_string()
        } else {
            format!("{}/{segment}", self.path)
        };
        self.children
            .entry(segment.to_string())
            .or_insert_with(|| TagNode::new(segment, &path))
    }
}

/// Serializable tree with counts instead of id sets, children keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTreeView {
    pub name: String,
    pub path: String,
    pub count: usize,
    pub children: BTreeMap<String, TagTreeView>,
}

/// Trimmed, non-empty segments: `"a//b/"` → `["a", "b"]`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Build the navigation tree. Entries with an empty id are skipped.
pub fn build_tag_tree<'a, I>(entries: I) -> TagNode
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut root = TagNode::new(ROOT_NAME, ALL_PATH);
    root.children
        .insert(UNTAGGED.to_string(), TagNode::new(UNTAGGED, UNTAGGED));

    for entry in entries {
        if !entry.has_id() {
            continue;
        }
        root.ids.insert(entry.id.clone());

        if entry.is_untagged() {
            if let Some(untagged) = root.children.get_mut(UNTAGGED) {
                untagged.ids.insert(entry.id.clone());
            }
            continue;
        }

        for tag in &entry.tags {
            let segments = split_path(tag);
            if segments.is_empty() {
                continue;
            }
            let mut node = &mut root;
            for segment in segments {
                node = node.child_mut_or_insert(segment);
                node.ids.insert(entry.id.clone());
            }
        }
    }

    log::debug!(
        "built tag tree: {} entries, {} top level nodes",
        root.count(),
        root.children.len()
    );

    root
}

/// Entries belonging to the tree node at `path`.
///
/// A tag matches when it equals `path` or continues it with `/`, so
/// `dev/go` is under `dev` but not under `dev/g`.
pub fn filter_by_path<'a, I>(entries: I, path: &str) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let entries = entries.into_iter().filter(|e| e.has_id());
    match path {
        ALL_PATH => entries.collect(),
        UNTAGGED => entries.filter(|e| e.is_untagged()).collect(),
        prefix => {
            let child_prefix = format!("{prefix}/");
            entries
                .filter(|e| {
                    e.tags.iter().map(|t| t.trim()).any(|t| {
                        t == prefix || t.starts_with(&child_prefix)
                    })
                })
                .collect()
        }
    }
}
