use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{media::BlobError, store::StoreError};

pub mod form;
pub mod routes;
pub mod schema;
pub mod service;

pub use form::{ImagePart, RecordForm};
pub use schema::RecordSchema;

/// A persisted entity: scalar fields plus the url of its image.
///
/// Serializes as a flat JSON object, e.g.
/// `{"blog_id": 1, "blog_title": "T", "blog_image": "https://..", "created_at": ".."}`.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    #[serde(skip)]
    pub kind: String,
    /// Lookup key, the id field's value rendered as a string
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub document: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }
}

#[derive(Debug, Display, Error)]
pub enum RecordError {
    #[display(fmt = "no image was supplied")]
    MissingImage,
    #[display(fmt = "required field `{}` is missing", field)]
    MissingField { field: &'static str },
    #[display(fmt = "upload exceeds the size limit")]
    PayloadTooLarge,
    #[display(fmt = "malformed form: {}", reason)]
    MalformedForm { reason: String },
    #[display(fmt = "{}", _0)]
    Upload(BlobError),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl From<BlobError> for RecordError {
    fn from(err: BlobError) -> Self {
        Self::Upload(err)
    }
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
