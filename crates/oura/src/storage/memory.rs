//! In-memory storage implementation
//!
//! Used in tests and for dry runs that should not touch the database.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{RecordStore, TokenStore};
use crate::models::{Credential, Record, RecordKind, UpsertOutcome};

/// In-memory implementation of [`TokenStore`] and [`RecordStore`]
///
/// Uses HashMaps protected by RwLocks for thread-safe access.
#[derive(Default)]
pub struct InMemoryStore {
    credentials: RwLock<HashMap<String, Credential>>,
    /// Insertion order of account ids
    account_order: RwLock<Vec<String>>,
    records: RwLock<HashMap<(RecordKind, String), Record>>,
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryStore {
    fn load_credential(&self, account_id: &str) -> Result<Option<Credential>> {
        let credentials = self.credentials.read().map_err(|_| poisoned())?;
        Ok(credentials.get(account_id).cloned())
    }

    fn upsert_credential(&self, credential: &Credential) -> Result<()> {
        let mut credentials = self.credentials.write().map_err(|_| poisoned())?;
        let previous = credentials.insert(credential.account_id.clone(), credential.clone());

        if previous.is_none() {
            let mut order = self.account_order.write().map_err(|_| poisoned())?;
            order.push(credential.account_id.clone());
        }
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<String>> {
        let order = self.account_order.read().map_err(|_| poisoned())?;
        Ok(order.clone())
    }
}

impl RecordStore for InMemoryStore {
    fn find_record(&self, kind: RecordKind, id: &str) -> Result<Option<Record>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&(kind, id.to_string())).cloned())
    }

    fn upsert_record(&self, record: &Record) -> Result<UpsertOutcome> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let key = (record.kind(), record.id().to_string());
        match records.insert(key, record.clone()) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    fn count_records(&self, kind: RecordKind) -> Result<usize> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.keys().filter(|(k, _)| *k == kind).count())
    }
}
