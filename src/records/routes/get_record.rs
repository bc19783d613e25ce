use actix_web::web::Json;

use super::{RecordPath, Schema};
use crate::{
    error::{HResult, HandlerError, IntoHandlerErrorResult},
    records::{service, Record},
    store::DB,
};

/// Get record
///
/// A single record of the given kind by its id.
#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "carousel, blogs, events, songs, albums or features", example = "blogs"),
        ("id" = String, Path, description = "Record id", example = "1")
    ),
    responses(
        (status = OK, description = "The record", content_type = "application/json"),
        (status = NOT_FOUND, description = "No such record", body = HandlerError, example = json!({"message": "not_found", "code": 404}))
    ),
    tag = "records"
)]
pub async fn get_record(db: DB, schema: Schema, path: RecordPath) -> HResult<Json<Record>> {
    let record = service::get(&schema, &path.id, db.get_ref())
        .await?
        .or_err(404)?;

    Ok(Json(record))
}
