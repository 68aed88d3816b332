// ── Index registry ──
//
// Name → index mapping for index-keyed tables, built from ONE read of
// the live table at the start of planning and treated as read-only for
// the rest of the batch. It can go stale mid-batch; resolution misses
// are reported per item, never treated as fatal.

use indexmap::IndexMap;
use tracing::debug;

use dpctl_api::{CcClient, paths};

use crate::error::CoreError;
use crate::model::EntityKind;

/// Snapshot of an index-keyed table's name/index pairs.
#[derive(Debug, Clone)]
pub struct IndexRegistry {
    table: &'static str,
    entries: IndexMap<String, String>,
}

impl IndexRegistry {
    /// Fetch the live table once and build the registry.
    ///
    /// Fails with [`CoreError::RegistryFetch`] -- a batch-level
    /// precondition failure, since nothing name-based can be resolved
    /// without it.
    pub async fn fetch(
        client: &CcClient,
        device: &str,
        kind: EntityKind,
    ) -> Result<Self, CoreError> {
        let spec = kind.table_spec();
        let index_field = spec.index_field.ok_or_else(|| CoreError::Validation {
            message: format!("{} is not an index-keyed table", spec.table),
        })?;

        let path = paths::config_path(device, spec.table, &[]);
        let resp = client.get(&path).await.map_err(|e| CoreError::RegistryFetch {
            table: spec.table.to_owned(),
            message: e.to_string(),
        })?;

        if !resp.is_success() {
            return Err(CoreError::RegistryFetch {
                table: spec.table.to_owned(),
                message: format!("HTTP {}: {}", resp.status, resp.body),
            });
        }

        let body = resp.json().map_err(|e| CoreError::RegistryFetch {
            table: spec.table.to_owned(),
            message: e.to_string(),
        })?;

        let mut entries = IndexMap::new();
        if let Some(rows) = body.get(spec.table).and_then(|v| v.as_array()) {
            for row in rows {
                let name = row.get(spec.name_field).and_then(scalar_to_string);
                let index = row.get(index_field).and_then(scalar_to_string);
                // Rows missing either field are stale or partial; skip
                // them rather than failing the whole registry.
                if let (Some(name), Some(index)) = (name, index) {
                    entries.insert(name, index);
                }
            }
        }

        debug!(table = spec.table, count = entries.len(), "index registry built");
        Ok(Self { table: spec.table, entries })
    }

    /// Build a registry from known pairs (used by planners under test).
    pub fn from_entries<I, K, V>(table: &'static str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table,
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// The table this registry was read from.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Resolve a name to its table index. Stale or unknown names return
    /// `None`.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Whether the given numeric index was present in the snapshot.
    pub fn contains_index(&self, index: u32) -> bool {
        let wanted = index.to_string();
        self.entries.values().any(|v| *v == wanted)
    }

    /// Reverse lookup: the name registered at `index`, if any.
    pub fn name_for_index(&self, index: u32) -> Option<&str> {
        let wanted = index.to_string();
        self.entries
            .iter()
            .find(|(_, v)| **v == wanted)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Table cells arrive as strings or numbers depending on firmware.
fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
