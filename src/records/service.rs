use chrono::Utc;
use log::{info, warn};
use nanoid::nanoid;
use serde_json::{Map, Value};

use super::{
    schema::{IdStrategy, RecordSchema},
    Record, RecordError, RecordForm,
};
use crate::{
    media::{BlobStore, MediaUpload},
    sequence,
    store::{DocumentStore, StoreError},
};

/// Checks a form against a schema before anything leaves the process.
pub fn validate(schema: &RecordSchema, form: &RecordForm) -> Result<(), RecordError> {
    if let Some(field) = schema.required_fields().find(|f| form.text(f).is_none()) {
        return Err(RecordError::MissingField { field });
    }

    match &form.image {
        Some(image) if !image.bytes.is_empty() => Ok(()),
        _ => Err(RecordError::MissingImage),
    }
}

/// Creates one record from an upload request.
///
/// Runs strictly in the order validate, upload, allocate id, persist, so a
/// failed upload leaves neither a record nor a consumed sequence value behind.
/// A failed insert after a successful upload leaves the uploaded media
/// orphaned on the media host.
pub async fn create(
    schema: &'static RecordSchema,
    form: RecordForm,
    db: &dyn DocumentStore,
    blobs: &dyn BlobStore,
) -> Result<Record, RecordError> {
    validate(schema, &form)?;

    let mut document = Map::new();
    for field in schema.fields {
        if let Some(value) = form.text(field.name) {
            document.insert(field.name.to_owned(), Value::String(value.to_owned()));
        }
    }

    let image = form.image.ok_or(RecordError::MissingImage)?;
    let uploaded = blobs
        .upload(MediaUpload {
            folder: schema.folder,
            filename: image
                .filename
                .unwrap_or_else(|| format!("{}.bin", schema.kind)),
            content_type: image.content_type,
            bytes: image.bytes,
        })
        .await?;

    let (id, id_value) = match schema.id_strategy {
        IdStrategy::Sequence { counter } => {
            let value = sequence::next_value(db, counter).await?;
            (value.to_string(), Value::from(value))
        }
        IdStrategy::Generated => {
            let key = nanoid!();
            (key.clone(), Value::String(key))
        }
    };

    document.insert(schema.id_field.to_owned(), id_value);
    document.insert(schema.media_field.to_owned(), Value::String(uploaded.url));

    let record = Record {
        kind: schema.kind.to_owned(),
        id,
        document,
        created_at: Utc::now(),
    };

    if let Err(e) = db.insert_record(&record).await {
        warn!(
            "{} {} was uploaded but could not be stored, media is orphaned",
            schema.kind, record.id
        );
        return Err(e.into());
    }

    info!("created {} {}", schema.kind, record.id);
    Ok(record)
}

pub async fn list(schema: &RecordSchema, db: &dyn DocumentStore) -> Result<Vec<Record>, StoreError> {
    db.list_records(schema.kind).await
}

/// Looks up one record. Ids that cannot exist for this kind (e.g. a
/// non-numeric blog id) are simply not found.
pub async fn get(schema: &RecordSchema, id: &str, db: &dyn DocumentStore) -> Result<Option<Record>, StoreError> {
    if let IdStrategy::Sequence { .. } = schema.id_strategy {
        match id.parse::<i64>() {
            Ok(n) if n > 0 && n.to_string() == id => {}
            _ => return Ok(None),
        }
    }

    db.find_record(schema.kind, id).await
}
