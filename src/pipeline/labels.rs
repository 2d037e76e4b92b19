use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::store::{StoreError, tags};

/// Tag name to class index for one training run.
///
/// Names are sorted and deduplicated before indices are assigned, so the same
/// set of tag names always produces the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIntegerMap {
    names: Vec<String>,
}

impl LabelIntegerMap {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    /// Build the map from the distinct tag names of a dataset.
    pub fn for_dataset(
        conn: &Connection,
        user_id: &str,
        dataset_id: &str,
    ) -> Result<Self, StoreError> {
        Ok(Self::from_names(tags::distinct_names(conn, user_id, dataset_id)?))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|candidate| candidate.as_str().cmp(name)).ok()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Mapping stored on the model after a successful run.
    pub fn to_mapping(&self) -> BTreeMap<String, usize> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect()
    }

    /// Index to name, as written into detection manifests.
    pub fn class_map(&self) -> BTreeMap<usize, String> {
        self.names.iter().cloned().enumerate().collect()
    }
}
