//! Storage trait definitions

use crate::models::{Credential, Record, RecordKind, UpsertOutcome};
use anyhow::Result;

/// Durable keyed storage of OAuth credentials
///
/// Every call is its own unit of work: it either fully applies or leaves
/// the stored record untouched.
pub trait TokenStore: Send + Sync {
    /// Get the credential for an account
    fn load_credential(&self, account_id: &str) -> Result<Option<Credential>>;

    /// Insert or replace the credential for `credential.account_id`
    fn upsert_credential(&self, credential: &Credential) -> Result<()>;

    /// Account ids with stored credentials, oldest first
    fn list_accounts(&self) -> Result<Vec<String>>;
}

/// Storage for typed records produced by the field mappers
pub trait RecordStore: Send + Sync {
    /// Get a record by kind and provider id
    fn find_record(&self, kind: RecordKind, id: &str) -> Result<Option<Record>>;

    /// Insert or update a record, reporting which one happened
    fn upsert_record(&self, record: &Record) -> Result<UpsertOutcome>;

    /// Count stored records of a kind
    fn count_records(&self, kind: RecordKind) -> Result<usize>;
}
