use utoipa::OpenApi;

use crate::{media::routes::MediaApiDocs, records::routes::RecordsApiDocs};

#[derive(OpenApi)]
#[openapi(info(
    title = "showcase-server",
    description = "Upload images with metadata and read them back as records"
))]
pub struct ApiDocs;

pub fn setup_oapi(include_media: bool) -> utoipa::openapi::OpenApi {
    let mut oapi = ApiDocs::openapi();

    oapi.merge(RecordsApiDocs::openapi());
    if include_media {
        oapi.merge(MediaApiDocs::openapi());
    }

    oapi
}
