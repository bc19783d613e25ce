use std::str::FromStr;

use actix_web::web::Data;
use async_trait::async_trait;
use derive_more::{Display, Error};
use lazy_static::lazy_static;
use mime::Mime;
use regex::Regex;

pub mod cloudinary;
pub mod local;
pub mod routes;
pub mod util;

pub use cloudinary::CloudinaryStore;
pub use local::LocalBlobStore;

lazy_static! {
    pub static ref FILENAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

pub type Blobs = Data<dyn BlobStore>;

/// An image received from a client, waiting to be handed to the media host.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Folder on the media host, one per record kind
    pub folder: &'static str,
    pub filename: String,
    pub content_type: Option<Mime>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    /// Stable url the media can be retrieved from
    pub url: String,
}

#[derive(Debug, Display, Error)]
pub enum BlobError {
    #[display(fmt = "media host request failed: {}", _0)]
    Http(reqwest::Error),
    #[display(fmt = "media host rejected upload ({}): {}", status, message)]
    Rejected { status: u16, message: String },
    #[display(fmt = "could not write media: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "invalid media file name")]
    InvalidName,
}

impl From<reqwest::Error> for BlobError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// External service that stores binary assets and hands back a url for them.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, media: MediaUpload) -> Result<UploadedMedia, BlobError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    Cloudinary,
    Local,
}

impl FromStr for BlobBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cloudinary" => Ok(Self::Cloudinary),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown blob backend `{}`, expected cloudinary or local", other)),
        }
    }
}
