use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_multipart::Multipart;
use actix_web::{
    error::PayloadError,
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    test,
    web::{Bytes, Data},
    App,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use showcase_server::{
    error::HandlerError,
    media::{BlobError, BlobStore, MediaUpload, UploadedMedia},
    records::{self, schema, RecordError, RecordForm},
    store::{DocumentStore, MemoryStore, StoreError},
};

const BOUNDARY: &str = "----showcase-test-boundary";

/// Media host that always succeeds with the same url.
struct StaticBlobStore {
    url: String,
    calls: AtomicUsize,
}

impl StaticBlobStore {
    fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl BlobStore for StaticBlobStore {
    async fn upload(&self, _media: MediaUpload) -> Result<UploadedMedia, BlobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedMedia {
            url: self.url.clone(),
        })
    }
}

/// Media host that rejects everything.
struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn upload(&self, _media: MediaUpload) -> Result<UploadedMedia, BlobError> {
        Err(BlobError::Rejected {
            status: 500,
            message: "media host is down".into(),
        })
    }
}

/// Memory store whose counters are unavailable.
struct BrokenCounterStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for BrokenCounterStore {
    async fn increment_counter(&self, _name: &str) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable {
            reason: "contention timeout".into(),
        })
    }

    async fn insert_record(&self, record: &records::Record) -> Result<(), StoreError> {
        self.inner.insert_record(record).await
    }

    async fn list_records(&self, kind: &str) -> Result<Vec<records::Record>, StoreError> {
        self.inner.list_records(kind).await
    }

    async fn find_record(&self, kind: &str, id: &str) -> Result<Option<records::Record>, StoreError> {
        self.inner.find_record(kind, id).await
    }
}

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(fields, image))
}

macro_rules! test_app {
    ($db:expr, $blobs:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::from($db as Arc<dyn DocumentStore>))
                .app_data(Data::from($blobs as Arc<dyn BlobStore>))
                .configure(records::routes::configure_app),
        )
        .await
    };
}

#[actix_web::test]
async fn creates_blog_with_first_sequence_value() {
    let store = Arc::new(MemoryStore::new());
    let blobs = StaticBlobStore::new("https://x/y.jpg");
    let app = test_app!(Arc::clone(&store), Arc::clone(&blobs));

    let req = upload_request(
        "/blogs",
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("y.jpg", b"\xff\xd8\xff\xe0jpeg")),
    )
    .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["blog_id"], json!(1));
    assert_eq!(body["blog_title"], json!("T"));
    assert_eq!(body["blog_description"], json!("D"));
    assert_eq!(body["blog_image"], json!("https://x/y.jpg"));
    assert!(body["created_at"].is_string());

    let stored = store.find_record("blog", "1").await.unwrap().unwrap();
    assert_eq!(stored.field("blog_id"), Some(&json!(1)));
    assert_eq!(stored.field("blog_title"), Some(&json!("T")));
    assert_eq!(stored.field("blog_description"), Some(&json!("D")));
    assert_eq!(stored.field("blog_image"), Some(&json!("https://x/y.jpg")));
    assert_eq!(blobs.calls.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn blogs_are_numbered_and_listed_in_order() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(Arc::clone(&store), StaticBlobStore::new("https://x/y.jpg"));

    for title in ["first", "second"] {
        let req = upload_request(
            "/blogs",
            &[("blog_title", title), ("blog_description", "text")],
            Some(("y.jpg", b"jpeg")),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/blogs").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let blogs = body.as_array().unwrap();

    assert_eq!(blogs.len(), 2);
    assert_eq!(blogs[0]["blog_id"], json!(1));
    assert_eq!(blogs[0]["blog_title"], json!("first"));
    assert_eq!(blogs[1]["blog_id"], json!(2));
    assert_eq!(blogs[1]["blog_title"], json!("second"));

    let req = test::TestRequest::get().uri("/blogs/2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["blog_title"], json!("second"));
}

#[actix_web::test]
async fn failed_upload_creates_nothing() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(Arc::clone(&store), Arc::new(FailingBlobStore));

    let req = upload_request(
        "/blogs",
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("y.jpg", b"jpeg")),
    )
    .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"message": "upload_failed", "code": 502}));

    assert_eq!(store.record_count(), 0);
    assert_eq!(store.counter_value("blog_id"), None);
}

#[actix_web::test]
async fn missing_field_is_rejected_before_upload() {
    let store = Arc::new(MemoryStore::new());
    let blobs = StaticBlobStore::new("https://x/y.jpg");
    let app = test_app!(Arc::clone(&store), Arc::clone(&blobs));

    let req = upload_request("/blogs", &[("blog_title", "T")], Some(("y.jpg", b"jpeg"))).to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("missing_field:blog_description"));

    assert_eq!(blobs.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.record_count(), 0);
}

#[actix_web::test]
async fn missing_image_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let blobs = StaticBlobStore::new("https://x/y.jpg");
    let app = test_app!(Arc::clone(&store), Arc::clone(&blobs));

    let req = upload_request("/songs", &[("title", "Midnight"), ("link", "https://l")], None).to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("missing_image"));
    assert_eq!(blobs.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn unknown_blog_is_not_found() {
    let app = test_app!(Arc::new(MemoryStore::new()), StaticBlobStore::new("https://x/y.jpg"));

    for uri in ["/blogs/999", "/blogs/abc", "/blogs/-1", "/blogs/01"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("not_found"));
    }
}

#[actix_web::test]
async fn counter_failure_is_a_server_error() {
    let store = Arc::new(BrokenCounterStore {
        inner: MemoryStore::new(),
    });
    let blobs = StaticBlobStore::new("https://x/y.jpg");
    let app = test_app!(Arc::clone(&store), Arc::clone(&blobs));

    let req = upload_request(
        "/blogs",
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("y.jpg", b"jpeg")),
    )
    .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("persistence_failed"));

    // the upload already happened, only the record is missing
    assert_eq!(blobs.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.inner.record_count(), 0);
}

#[actix_web::test]
async fn other_kinds_get_generated_ids() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app!(Arc::clone(&store), StaticBlobStore::new("https://x/poster.jpg"));

    let req = upload_request(
        "/events",
        &[
            ("title", "Release party"),
            ("date", "2024-05-01"),
            ("unknown", "ignored"),
        ],
        Some(("poster.jpg", b"jpeg")),
    )
    .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_owned();
    assert_eq!(id.len(), 21);
    assert_eq!(created["image"], json!("https://x/poster.jpg"));
    assert!(created.get("unknown").is_none());
    assert!(created.get("description").is_none());

    let req = test::TestRequest::get().uri(&format!("/events/{}", id)).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    // events never touch the blog counter
    assert_eq!(store.counter_value("blog_id"), None);
}

#[actix_web::test]
async fn concurrent_blog_creation_never_reuses_ids() {
    let store = Arc::new(MemoryStore::new());
    let blobs = StaticBlobStore::new("https://x/y.jpg");

    let created = join_all((0..20).map(|i| {
        let form = RecordForm::default()
            .with_field("blog_title", &format!("post {}", i))
            .with_field("blog_description", "D")
            .with_image("y.jpg", mime::IMAGE_JPEG, vec![1, 2, 3]);
        let store = Arc::clone(&store);
        let blobs = Arc::clone(&blobs);
        async move { records::service::create(&schema::BLOG, form, &*store, &*blobs).await }
    }))
    .await;

    let mut ids: Vec<i64> = created
        .into_iter()
        .map(|r| r.unwrap().field("blog_id").and_then(Value::as_i64).unwrap())
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
    assert_eq!(store.record_count(), 20);
}

fn multipart_payload(body: Vec<u8>) -> Multipart {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY)).unwrap(),
    );

    let stream = futures::stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
    Multipart::new(&headers, stream)
}

#[actix_web::test]
async fn oversized_image_is_cut_off_while_streaming() {
    let body = multipart_body(
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("big.jpg", &[0u8; 500])),
    );

    let err = RecordForm::read(multipart_payload(body), 100).await.unwrap_err();
    assert!(matches!(err, RecordError::PayloadTooLarge));

    let err: HandlerError = err.into();
    assert_eq!(err.code, 413);
    assert_eq!(err.message, "payload_too_large");
}

#[actix_web::test]
async fn form_within_limit_is_read_whole() {
    let body = multipart_body(
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("small.jpg", &[7u8; 50])),
    );

    let form = RecordForm::read(multipart_payload(body), 100).await.unwrap();
    assert_eq!(form.text("blog_title"), Some("T"));
    assert_eq!(form.text("blog_description"), Some("D"));

    let image = form.image.unwrap();
    assert_eq!(image.filename.as_deref(), Some("small.jpg"));
    assert_eq!(image.bytes, vec![7u8; 50]);
}

#[actix_web::test]
async fn declared_oversized_request_is_rejected_up_front() {
    let store = Arc::new(MemoryStore::new());
    let blobs = StaticBlobStore::new("https://x/y.jpg");
    let app = test_app!(Arc::clone(&store), Arc::clone(&blobs));

    // larger than the 10 MB default MAX_UPLOAD_SIZE
    let req = upload_request(
        "/blogs",
        &[("blog_title", "T"), ("blog_description", "D")],
        Some(("y.jpg", b"jpeg")),
    )
    .insert_header((header::CONTENT_LENGTH, "20000000"))
    .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"message": "payload_too_large", "code": 413}));

    assert_eq!(blobs.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.record_count(), 0);
    assert_eq!(store.counter_value("blog_id"), None);
}
