use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Instant,
};

use crate::{
    eid::Eid,
    entries::{clip, utc_now_iso, Entry, EntryPayload, MAX_TIMESTAMP_LEN},
    errors::AppError,
    search_query,
    storage::{BackendLocal, StorageManager},
    tag_tree::{self, TagNode},
};

pub const DOCUMENT_VERSION: u32 = 1;

/// On-disk document: `{ version, exportedAt, entries }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "utc_now_iso")]
    pub exported_at: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            exported_at: utc_now_iso(),
            entries: vec![],
        }
    }
}

impl Document {
    /// Accepts a full document, a bare entry array, or anything else as empty.
    /// Entries that fail to deserialize are skipped.
    pub fn from_value(value: Value) -> Self {
        let (version, exported_at, raw_entries) = match value {
            Value::Array(items) => (None, None, items),
            Value::Object(mut obj) => {
                let version = obj
                    .get("version")
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok());
                let exported_at = obj
                    .get("exportedAt")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let entries = match obj.remove("entries") {
                    Some(Value::Array(items)) => items,
                    _ => vec![],
                };
                (version, exported_at, entries)
            }
            _ => (None, None, vec![]),
        };

        let entries = raw_entries
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Entry>(raw) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("skipping malformed entry: {err}");
                    None
                }
            })
            .collect();

        Self {
            version: version.unwrap_or(DOCUMENT_VERSION),
            exported_at: exported_at.unwrap_or_else(utc_now_iso),
            entries,
        }
    }
}

/// Result of a path + query search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub q: String,
    pub path: String,
    pub count: usize,
    pub entries: Vec<Entry>,
}

/// Entries persisted as one JSON document, held in memory and rewritten on
/// every mutation.
#[derive(Debug)]
pub struct EntryStore {
    doc: RwLock<Document>,
    storage: BackendLocal,
    ident: String,
}

impl EntryStore {
    pub fn load(storage: BackendLocal, ident: &str) -> Result<Self, AppError> {
        let now = Instant::now();

        let doc = if storage.exists(ident) {
            let bytes = storage.read(ident)?;
            Document::from_value(serde_json::from_slice::<Value>(&bytes)?)
        } else {
            log::info!(
                "no entries at {}, starting empty",
                storage.path_of(ident).display()
            );
            Document::default()
        };

        log::debug!(
            "loaded {} entries in {}ms",
            doc.entries.len(),
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(Self {
            doc: RwLock::new(doc),
            storage,
            ident: ident.to_string(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.doc.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.doc.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist `next`, then swap it in. On failure `doc` is left untouched.
    fn commit(&self, doc: &mut Document, mut next: Document) -> Result<(), AppError> {
        next.exported_at = utc_now_iso();
        let data = serde_json::to_vec_pretty(&next)?;
        self.storage.write(&self.ident, &data)?;
        *doc = next;
        Ok(())
    }

    pub fn list(&self) -> Vec<Entry> {
        self.read().entries.clone()
    }

    pub fn total(&self) -> usize {
        self.read().entries.len()
    }

    pub fn get(&self, id: &str) -> Result<Entry, AppError> {
        self.read()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    pub fn create(&self, payload: EntryPayload) -> Result<Entry, AppError> {
        let clean = payload.validate()?;
        let mut doc = self.write();

        let id = payload.clean_id().unwrap_or_else(Eid::entry_id);
        if doc.entries.iter().any(|e| e.id == id) {
            return Err(AppError::AlreadyExists(id));
        }

        let now = utc_now_iso();
        let entry = clean.into_entry(id, now.clone(), now);
        let mut next = doc.clone();
        next.entries.insert(0, entry.clone());
        self.commit(&mut doc, next)?;

        log::info!("created entry {}", entry.id);
        Ok(entry)
    }

    /// Merge `patch` over the stored entry and re-validate the result.
    pub fn update(&self, id: &str, patch: EntryPayload) -> Result<Entry, AppError> {
        let mut doc = self.write();
        let idx = doc
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(AppError::NotFound)?;

        let current = &doc.entries[idx];
        let clean = patch.merged_over(current).validate()?;
        let entry = clean.into_entry(
            current.id.clone(),
            current.created_at.clone(),
            utc_now_iso(),
        );
        let mut next = doc.clone();
        next.entries[idx] = entry.clone();
        self.commit(&mut doc, next)?;

        log::info!("updated entry {id}");
        Ok(entry)
    }

    pub fn delete(&self, id: &str) -> Result<Entry, AppError> {
        let mut doc = self.write();
        let idx = doc
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(AppError::NotFound)?;

        let mut next = doc.clone();
        let removed = next.entries.remove(idx);
        self.commit(&mut doc, next)?;

        log::info!("deleted entry {id}");
        Ok(removed)
    }

    /// Replace every entry. Items that are not objects or have no url are
    /// dropped. Returns the number imported.
    pub fn import(&self, items: Vec<Value>) -> Result<usize, AppError> {
        let now = utc_now_iso();
        let mut entries: Vec<Entry> = Vec::with_capacity(items.len());

        for item in items {
            if !item.is_object() {
                continue;
            }
            let payload: EntryPayload = match serde_json::from_value(item) {
                Ok(payload) => payload,
                Err(err) => {
                    log::warn!("skipping import item: {err}");
                    continue;
                }
            };
            let Ok(clean) = payload.validate_for_import() else {
                continue;
            };
            let id = payload.clean_id().unwrap_or_else(Eid::entry_id);
            let stamp = |ts: &Option<String>| {
                ts.as_deref()
                    .map(|ts| clip(ts, MAX_TIMESTAMP_LEN).to_string())
                    .unwrap_or_else(|| now.clone())
            };
            let entry = clean.into_entry(id, stamp(&payload.created_at), stamp(&payload.updated_at));
            entries.push(entry);
        }

        let imported = entries.len();
        let next = Document {
            version: DOCUMENT_VERSION,
            exported_at: now.clone(),
            entries,
        };
        let mut doc = self.write();
        self.commit(&mut doc, next)?;

        log::info!("imported {imported} entries");
        Ok(imported)
    }

    pub fn export(&self) -> Document {
        self.read().clone()
    }

    pub fn tag_tree(&self) -> TagNode {
        tag_tree::build_tag_tree(self.read().entries.iter())
    }

    /// Filter by tree path, then by query. Input order is kept.
    pub fn search(&self, q: &str, path: &str) -> SearchResults {
        let doc = self.read();
        let in_path = tag_tree::filter_by_path(doc.entries.iter(), path);
        let entries: Vec<Entry> = search_query::filter_entries(in_path, q)
            .into_iter()
            .cloned()
            .collect();

        SearchResults {
            q: q.to_string(),
            path: path.to_string(),
            count: entries.len(),
            entries,
        }
    }
}
