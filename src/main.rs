use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    middleware::{Condition, Logger},
    web::{self, Data},
    App, HttpServer,
};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use utoipa_rapidoc::RapiDoc;

use showcase_server::{
    apidocs,
    media::{self, BlobBackend, BlobStore, Blobs, CloudinaryStore, LocalBlobStore},
    options, records,
    store::{DocumentStore, MemoryStore, PgStore, StoreBackend, DB},
};

async fn connect_postgres() -> PgStore {
    let db_url = options::db_conn_string();

    let pool = PgPoolOptions::new()
        .max_connections(*options::DB_POOL_MAX_CONNS)
        .connect(&db_url);

    let pool = match pool.await {
        Ok(pool) => {
            info!("Connected to database successfully!");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let store = PgStore::with_pool(pool);

    if *options::DB_RUN_MIGRATIONS {
        match store.run_migrations().await {
            Ok(()) => info!("Database migrations are up to date"),
            Err(e) => {
                error!("Failed to run database migrations: {}", e);
                std::process::exit(1);
            }
        }
    }

    store
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    options::initialize_all();
    options::print_all();

    // document store
    let db: DB = match *options::STORE_BACKEND {
        StoreBackend::Postgres => {
            Data::from(Arc::new(connect_postgres().await) as Arc<dyn DocumentStore>)
        }
        StoreBackend::Memory => Data::from(Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>),
    };

    // media host
    let local_media = match *options::BLOB_BACKEND {
        BlobBackend::Local => Some(Data::new(LocalBlobStore::new(
            options::MEDIA_PATH.as_str(),
            &options::PUBLIC_URL,
        ))),
        BlobBackend::Cloudinary => None,
    };

    let blobs: Blobs = match &local_media {
        Some(local) => Data::from(local.clone().into_inner() as Arc<dyn BlobStore>),
        None => Data::from(Arc::new(CloudinaryStore::new(
            &options::CLOUDINARY_CLOUD_NAME,
            options::CLOUDINARY_API_KEY.clone(),
            options::CLOUDINARY_API_SECRET.clone(),
        )) as Arc<dyn BlobStore>),
    };

    let oapi = apidocs::setup_oapi(local_media.is_some());

    HttpServer::new(move || {
        let local_media = local_media.clone();

        App::new()
            .wrap(Condition::new(*options::HANDLE_CORS, Cors::permissive()))
            // add logging middleware
            .wrap(Logger::new("%{r}a %r -> %s in %Dms").log_target("http"))
            .app_data(Data::clone(&db))
            .app_data(Data::clone(&blobs))
            // docs are registered before the /api scope so it does not swallow them
            .service(RapiDoc::with_openapi("/api-docs/openapi.json", oapi.clone()).path("/api/docs"))
            .service(web::scope("/api").configure(records::routes::configure_app))
            .configure(move |cfg| {
                if let Some(local) = local_media {
                    cfg.app_data(local);
                    media::routes::configure_app(cfg);
                }
            })
    })
    .workers(*options::NUM_WEB_WORKERS)
    .bind(options::bind_addr())?
    .run()
    .await
}
