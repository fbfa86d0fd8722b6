//! Collection-scoped record store
//!
//! Each collection is one JSON array stored under a fixed key. Every call
//! reads the whole array, works on it, and writes the whole array back.
//! There is no transaction across collections: a caller touching two
//! collections performs two independent read-modify-write cycles.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::backend::KeyValueStore;
use super::error::StorageResult;

/// The named array partitions of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    QuestionPapers,
    AnswerSheets,
}

impl Collection {
    /// Storage key of the collection
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::QuestionPapers => "questionPapers",
            Collection::AnswerSheets => "answerSheets",
        }
    }

    pub fn all() -> [Collection; 3] {
        [
            Collection::Users,
            Collection::QuestionPapers,
            Collection::AnswerSheets,
        ]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A record type that lives in exactly one collection
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

/// Typed list/append/remove over a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct RecordStore<S> {
    backend: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// All records of `R`'s collection, in stored order
    ///
    /// A missing key is an empty collection. So is a value that does not
    /// parse; the anomaly is logged and the caller carries on.
    pub fn list<R: Record>(&self) -> StorageResult<Vec<R>> {
        let key = R::COLLECTION.key();
        let Some(raw) = self.backend.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(collection = key, error = %e, "unparsable collection, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Records matching `predicate`, in stored order
    pub fn find_all<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> StorageResult<Vec<R>> {
        Ok(self
            .list::<R>()?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }

    /// First record matching `predicate`
    pub fn find<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> StorageResult<Option<R>> {
        Ok(self.list::<R>()?.into_iter().find(|r| predicate(r)))
    }

    /// Whether any record matches `predicate`
    pub fn any<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> StorageResult<bool> {
        Ok(self.list::<R>()?.iter().any(predicate))
    }

    /// Number of records in `R`'s collection
    pub fn count<R: Record>(&self) -> StorageResult<usize> {
        Ok(self.list::<R>()?.len())
    }

    /// Append `record` as the last element of its collection
    pub fn append<R: Record>(&mut self, record: R) -> StorageResult<()> {
        let key = R::COLLECTION.key();
        let mut records = self.list::<R>()?;
        records.push(record);
        self.write(key, &records)?;
        debug!(collection = key, len = records.len(), "appended record");
        Ok(())
    }

    /// Remove every record matching `predicate`, returning how many went
    ///
    /// Survivors keep their order. Nothing is written when nothing matched.
    pub fn remove<R: Record>(&mut self, predicate: impl Fn(&R) -> bool) -> StorageResult<usize> {
        let key = R::COLLECTION.key();
        let records = self.list::<R>()?;
        let before = records.len();

        let kept: Vec<R> = records.into_iter().filter(|r| !predicate(r)).collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        self.write(key, &kept)?;
        debug!(collection = key, removed, len = kept.len(), "removed records");
        Ok(removed)
    }

    /// Drop the whole collection
    pub fn clear(&mut self, collection: Collection) -> StorageResult<()> {
        self.backend.remove(collection.key())
    }

    fn write<T: Serialize>(&mut self, key: &str, records: &[T]) -> StorageResult<()> {
        let encoded = serde_json::to_string(records)?;
        self.backend.set(key, &encoded)
    }
}
