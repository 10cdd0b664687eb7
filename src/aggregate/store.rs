use super::record::ProductRecord;
use crate::url::canonical_key;
use std::collections::HashMap;

/// Insertion-ordered product store keyed by canonical URL
///
/// The first record seen for a key is kept; later records with the same key
/// are discarded whatever their payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStore {
    index: HashMap<String, usize>,
    records: Vec<ProductRecord>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record unless its key is already present
    ///
    /// Returns true if the record was kept.
    pub fn insert(&mut self, record: ProductRecord) -> bool {
        let key = canonical_key(&record.url);
        if self.index.contains_key(&key) {
            tracing::trace!("Duplicate product {}", record.url);
            return false;
        }
        self.index.insert(key, self.records.len());
        self.records.push(record);
        true
    }

    /// Appends the records of `other` whose keys are new, in `other`'s order
    ///
    /// Returns the number of records kept.
    pub fn merge(&mut self, other: AggregateStore) -> usize {
        other
            .records
            .into_iter()
            .map(|record| self.insert(record))
            .filter(|kept| *kept)
            .count()
    }

    pub fn get(&self, url: &str) -> Option<&ProductRecord> {
        self.index
            .get(&canonical_key(url))
            .map(|&position| &self.records[position])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(&canonical_key(url))
    }

    /// Records in insertion order
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ProductRecord> for AggregateStore {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}
