use actix_files::NamedFile;
use actix_web::{
    get,
    web::{Data, Path},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{HResult, IntoHandlerErrorResult},
    media::LocalBlobStore,
};

#[derive(Deserialize, IntoParams)]
pub struct FileIdentifierPath {
    #[param(example = "blogs")]
    pub folder: String,
    #[param(example = "s6NIiu2oOh1FEL0Xfjc7n")]
    pub id: String,
    #[param(example = "cover.jpg")]
    pub filename: String,
}

// just a helper struct to describe what a file looks like to openapi
#[derive(ToSchema)]
#[schema(example = "(binary file body)")]
struct OApiFileResponse {}

/// Download media
///
/// Serves an uploaded image bit-for-bit. Only mounted when uploads are kept on
/// the local filesystem instead of an external media host.
#[utoipa::path(
    tag = "media",
    params(FileIdentifierPath),
    responses(
        (status = OK, description = "Requested file", content_type = "application/octet-stream", body = inline(OApiFileResponse)),
        (status = NOT_FOUND, description = "File not found", example = json!({"message": "not_found", "code": 404}))
    )
)]
#[get("/media/{folder}/{id}/{filename}")]
pub async fn getfile(store: Data<LocalBlobStore>, req: Path<FileIdentifierPath>) -> HResult<NamedFile> {
    let path = store
        .path_for(&req.folder, &req.id, &req.filename)
        .or_err(404)?;

    NamedFile::open_async(path).await.or_err(404)
}
