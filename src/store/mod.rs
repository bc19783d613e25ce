use std::str::FromStr;

use actix_web::web::Data;
use async_trait::async_trait;
use derive_more::{Display, Error};

use crate::records::Record;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DB = Data<dyn DocumentStore>;

#[derive(Debug, Display, Error)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "invalid counter name `{}`", name)]
    InvalidCounterName { name: String },
    #[display(fmt = "record already exists: {}/{}", kind, id)]
    Duplicate { kind: String, id: String },
    #[display(fmt = "store unavailable: {}", reason)]
    Unavailable { reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

/// Durable storage for records and named counters.
///
/// Every write except [`DocumentStore::increment_counter`] creates a new,
/// independently keyed document, so the counter is the only shared mutable
/// state between concurrent requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Adds one to the counter `name` and returns the new value, creating the
    /// counter at zero first if it does not exist yet.
    ///
    /// Must be a single atomic read-modify-write: concurrent callers never
    /// observe the same value, and a failed call leaves the counter untouched.
    async fn increment_counter(&self, name: &str) -> Result<i64, StoreError>;

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError>;

    /// All records of one kind, oldest first.
    async fn list_records(&self, kind: &str) -> Result<Vec<Record>, StoreError>;

    async fn find_record(&self, kind: &str, id: &str) -> Result<Option<Record>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend `{}`, expected postgres or memory", other)),
        }
    }
}
