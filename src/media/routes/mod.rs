use utoipa::OpenApi;

pub mod getfile;

pub fn configure_app(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(getfile::getfile);
}

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "media")
    ),
    paths(
        getfile::getfile
    )
)]
pub struct MediaApiDocs;
