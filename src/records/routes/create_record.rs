use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse};

use super::Schema;
use crate::{
    error::{macros::err, HResult, HandlerError},
    media::Blobs,
    options,
    records::{service, RecordForm},
    store::DB,
};

fn content_length(request: &HttpRequest) -> Option<usize> {
    request
        .headers()
        .get("content-length")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Create record
///
/// Uploads the `image` part to the media host and stores a new record of the
/// given kind with the remaining form fields. Blogs get the next sequential
/// `blog_id`, every other kind a generated `id`.
///
/// The id is only allocated once the upload has succeeded.
#[utoipa::path(
    post,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "carousel, blogs, events, songs, albums or features", example = "blogs")
    ),
    request_body(content_type = "multipart/form-data", description = "An `image` file part plus the kind's text fields"),
    responses(
        (status = CREATED, description = "Record created", content_type = "application/json", example = json!({
            "blog_id": 1,
            "blog_title": "Tour announcement",
            "blog_description": "We are going on tour!",
            "blog_image": "https://res.cloudinary.com/demo/image/upload/v1/blogs/tour.jpg",
            "created_at": "2024-04-20T00:00:00Z"
        })),
        (status = BAD_REQUEST, description = "Missing image or required field", body = HandlerError, example = json!({"message": "missing_field:blog_title", "code": 400})),
        (status = PAYLOAD_TOO_LARGE, description = "Upload exceeds MAX_UPLOAD_SIZE", body = HandlerError),
        (status = BAD_GATEWAY, description = "Media host rejected the upload", body = HandlerError),
        (status = INTERNAL_SERVER_ERROR, description = "Record could not be stored", body = HandlerError)
    ),
    tag = "records"
)]
pub async fn create_record(
    db: DB,
    blobs: Blobs,
    schema: Schema,
    request: HttpRequest,
    payload: Multipart,
) -> HResult<HttpResponse> {
    let max_size = *options::MAX_UPLOAD_SIZE;

    if content_length(&request).is_some_and(|size| size > max_size) {
        return err!(413, "payload_too_large");
    }

    let form = RecordForm::read(payload, max_size).await?;
    let record = service::create(*schema.get_ref(), form, db.get_ref(), blobs.get_ref()).await?;

    Ok(HttpResponse::Created().json(record))
}
