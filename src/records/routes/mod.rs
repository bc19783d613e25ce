use actix_web::web::{self, Data, Path};
use serde::Deserialize;
use utoipa::OpenApi;

use super::schema::{self, RecordSchema};
use crate::error::HandlerError;

pub mod create_record;
pub mod get_record;
pub mod list_records;

/// Descriptor of the kind a scope serves, attached as scope data
pub type Schema = Data<&'static RecordSchema>;

#[derive(Deserialize)]
pub struct RecordIdParams {
    /// a number for blogs, a generated key for everything else
    pub id: String,
}

pub type RecordPath = Path<RecordIdParams>;

/// Mounts `POST /{route}`, `GET /{route}` and `GET /{route}/{id}` for every
/// record kind.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    for schema in schema::ALL {
        cfg.service(
            web::scope(schema.route)
                .app_data(Data::new(schema))
                .route("", web::post().to(create_record::create_record))
                .route("", web::get().to(list_records::list_records))
                .route("/{id}", web::get().to(get_record::get_record)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "records", description = "Carousel images, blogs, events, songs, albums and features")
    ),
    paths(
        create_record::create_record,
        list_records::list_records,
        get_record::get_record
    ),
    components(schemas(HandlerError))
)]
pub struct RecordsApiDocs;
