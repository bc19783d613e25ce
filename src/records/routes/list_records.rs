use actix_web::web::Json;

use super::Schema;
use crate::{
    error::{HResult, HandlerError},
    records::{service, Record},
    store::DB,
};

/// List records
///
/// Every record of the given kind, oldest first.
#[utoipa::path(
    get,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "carousel, blogs, events, songs, albums or features", example = "songs")
    ),
    responses(
        (status = OK, description = "Record list", content_type = "application/json", example = json!([{
            "id": "V1StGXR8_Z5jdHi6B-myT",
            "title": "Midnight",
            "link": "https://open.spotify.com/track/xyz",
            "image": "https://res.cloudinary.com/demo/image/upload/v1/songs/midnight.jpg",
            "created_at": "2024-04-20T00:00:00Z"
        }])),
        (status = INTERNAL_SERVER_ERROR, description = "Store unavailable", body = HandlerError)
    ),
    tag = "records"
)]
pub async fn list_records(db: DB, schema: Schema) -> HResult<Json<Vec<Record>>> {
    let records = service::list(&schema, db.get_ref()).await?;

    Ok(Json(records))
}
