use std::collections::HashMap;

use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use log::debug;
use mime::Mime;

use super::{schema::IMAGE_PART, RecordError};

#[derive(Debug, Clone)]
pub struct ImagePart {
    pub filename: Option<String>,
    pub content_type: Option<Mime>,
    pub bytes: Vec<u8>,
}

/// Everything a client sent in one upload request.
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub fields: HashMap<String, String>,
    pub image: Option<ImagePart>,
}

fn malformed(reason: impl ToString) -> RecordError {
    RecordError::MalformedForm {
        reason: reason.to_string(),
    }
}

impl RecordForm {
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn with_image(mut self, filename: &str, content_type: Mime, bytes: Vec<u8>) -> Self {
        self.image = Some(ImagePart {
            filename: Some(filename.to_owned()),
            content_type: Some(content_type),
            bytes,
        });
        self
    }

    /// Value of a text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Drains a multipart payload into memory.
    ///
    /// The `image` part is kept as bytes, every other part is read as UTF-8
    /// text. More than `max_size` bytes in total is rejected. A repeated field
    /// keeps its last value.
    pub async fn read(mut payload: Multipart, max_size: usize) -> Result<Self, RecordError> {
        let mut form = RecordForm::default();
        let mut total = 0usize;

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let content_disposition = field.content_disposition();
            let name = match content_disposition.and_then(|cd| cd.get_name()) {
                Some(name) => name.to_owned(),
                None => return Err(malformed("part without a name")),
            };

            if name == IMAGE_PART {
                let filename = content_disposition.and_then(|cd| cd.get_filename()).map(String::from);
                let content_type = field.content_type().cloned();
                let bytes = read_field(&mut field, &mut total, max_size).await?;

                debug!("received image part `{:?}` ({} bytes)", filename, bytes.len());
                form.image = Some(ImagePart {
                    filename,
                    content_type,
                    bytes,
                });
            } else {
                let bytes = read_field(&mut field, &mut total, max_size).await?;
                let value = String::from_utf8(bytes).map_err(|_| malformed(format!("field `{}` is not utf-8", name)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}

async fn read_field(field: &mut Field, total: &mut usize, max_size: usize) -> Result<Vec<u8>, RecordError> {
    let mut bytes = Vec::new();

    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        *total += chunk.len();
        if *total > max_size {
            return Err(RecordError::PayloadTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
