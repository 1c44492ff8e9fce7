/// Record identifier as reported by the service (`objectIds`).
pub type ObjectId = i64;

/// The full identifier set of a layer, strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentifierManifest {
    id_field: String,
    ids: Vec<ObjectId>,
}

impl IdentifierManifest {
    /// Build from server order. Servers do not guarantee sorted output, and a
    /// repeated identifier would otherwise be extracted twice.
    pub fn from_unsorted(id_field: impl Into<String>, mut ids: Vec<ObjectId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self {
            id_field: id_field.into(),
            ids,
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
