use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use lazy_static::lazy_static;
use log::{error, info, warn};

use crate::media::BlobBackend;
use crate::store::StoreBackend;

// get and parse an environment variable
// use default value if not set
fn var<T>(name: &str, default: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Debug,
{
    let given = std::env::var(name).unwrap_or(default.to_owned());
    match given.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(
                "Invalid config option `{}={}`: {:?} ({}'s default is usually {})",
                name, given, e, name, default
            );
            std::process::exit(1);
        }
    }
}

lazy_static! {
    pub static ref NUM_WEB_WORKERS: usize = var("NUM_WEB_WORKERS", "4");

    pub static ref BIND_ADDR: SocketAddr = var("BIND_ADDR", "127.0.0.1:8080");

    pub static ref HANDLE_CORS: bool = var("HANDLE_CORS", "true");

    /// Externally visible base url, used to build links to locally stored media
    pub static ref PUBLIC_URL: String = {
        let url: String = var("PUBLIC_URL", "http://127.0.0.1:8080");
        url.trim_end_matches('/').to_owned()
    };

    pub static ref MAX_UPLOAD_SIZE: usize = var("MAX_UPLOAD_SIZE", "10000000"); // 10 MB

    pub static ref STORE_BACKEND: StoreBackend = var("STORE_BACKEND", "postgres");

    static ref DB_HOST: String = var("DB_HOST", "127.0.0.1");
    static ref DB_PORT: u16 = var("DB_PORT", "5432");
    static ref DB_USER: String = var("DB_USER", "showcase");
    static ref DB_PASSWORD: String = var("DB_PASSWORD", "dev");
    static ref DB_NAME: String = var("DB_NAME", "showcase");
    pub static ref DB_POOL_MAX_CONNS: u32 = var("DB_POOL_MAX_CONNS", "5");
    pub static ref DB_RUN_MIGRATIONS: bool = var("DB_RUN_MIGRATIONS", "true");

    pub static ref BLOB_BACKEND: BlobBackend = var("BLOB_BACKEND", "cloudinary");

    pub static ref CLOUDINARY_CLOUD_NAME: String = var("CLOUDINARY_CLOUD_NAME", "");
    pub static ref CLOUDINARY_API_KEY: String = var("CLOUDINARY_API_KEY", "");
    pub static ref CLOUDINARY_API_SECRET: String = var("CLOUDINARY_API_SECRET", "");

    pub static ref MEDIA_PATH: String = {
        let path: String = var("MEDIA_PATH", "/var/tmp/showcase-media");

        if *BLOB_BACKEND == BlobBackend::Local {
            // create directory
            if let Err(e) = std::fs::create_dir_all(&path) {
                error!("Failed to create directory specified by MEDIA_PATH `{}`: {}", path, e);
                std::process::exit(1);
            }

            let is_read_only = std::fs::metadata(&path)
                .map(|m| m.permissions().readonly())
                .unwrap_or(true);
            if is_read_only {
                warn!("\n\nMEDIA_PATH directory at `{}` is not writable!\nUploads will probably fail!\n\n", path);
            }
        }

        path
    };
}

pub fn db_conn_string() -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        *DB_USER, *DB_PASSWORD, *DB_HOST, *DB_PORT, *DB_NAME
    )
}

pub fn bind_addr() -> (IpAddr, u16) {
    (BIND_ADDR.ip(), BIND_ADDR.port())
}

pub fn initialize_all() {
    lazy_static::initialize(&NUM_WEB_WORKERS);
    lazy_static::initialize(&BIND_ADDR);
    lazy_static::initialize(&HANDLE_CORS);
    lazy_static::initialize(&PUBLIC_URL);
    lazy_static::initialize(&MAX_UPLOAD_SIZE);

    if *MAX_UPLOAD_SIZE == 0 {
        error!("MAX_UPLOAD_SIZE must be greater than zero");
        std::process::exit(1);
    }

    lazy_static::initialize(&STORE_BACKEND);
    lazy_static::initialize(&DB_HOST);
    lazy_static::initialize(&DB_PORT);
    lazy_static::initialize(&DB_USER);
    lazy_static::initialize(&DB_PASSWORD);
    lazy_static::initialize(&DB_NAME);
    lazy_static::initialize(&DB_POOL_MAX_CONNS);
    lazy_static::initialize(&DB_RUN_MIGRATIONS);

    lazy_static::initialize(&BLOB_BACKEND);
    lazy_static::initialize(&CLOUDINARY_CLOUD_NAME);
    lazy_static::initialize(&CLOUDINARY_API_KEY);
    lazy_static::initialize(&CLOUDINARY_API_SECRET);

    if *BLOB_BACKEND == BlobBackend::Cloudinary
        && (CLOUDINARY_CLOUD_NAME.is_empty()
            || CLOUDINARY_API_KEY.is_empty()
            || CLOUDINARY_API_SECRET.is_empty())
    {
        error!("BLOB_BACKEND=cloudinary requires CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET");
        std::process::exit(1);
    }

    lazy_static::initialize(&MEDIA_PATH);
}

pub fn print_all() {
    info!("config: Listening on {}", *BIND_ADDR);
    info!("config: Public url: {}", *PUBLIC_URL);
    info!("config: Max upload size: {} bytes", *MAX_UPLOAD_SIZE);

    match *STORE_BACKEND {
        StoreBackend::Postgres => info!(
            "config: Database: {} at {}:{} ({} max connections)",
            *DB_NAME, *DB_HOST, *DB_PORT, *DB_POOL_MAX_CONNS
        ),
        StoreBackend::Memory => {
            warn!("STORE_BACKEND=memory, records and counters will be lost on restart!")
        }
    }

    match *BLOB_BACKEND {
        BlobBackend::Cloudinary => {
            info!("config: Uploaded media hosted on cloudinary `{}`", *CLOUDINARY_CLOUD_NAME)
        }
        BlobBackend::Local => info!("config: Uploaded media stored in: {}", *MEDIA_PATH),
    }
}
