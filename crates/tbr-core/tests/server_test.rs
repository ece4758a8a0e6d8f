//! Registry server tests driving the router directly.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bytes::Bytes;
use common::Release;
use futures::stream;
use tbr_core::store::StoredObject;
use tbr_core::{MemoryStore, ObjectStore, StoreError, open_bucket, publish, server};
use tbr_schema::ProviderVersions;
use tower::ServiceExt; // for `oneshot`

async fn get(store: &MemoryStore, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let (status, content_type, body) = request(Arc::new(store.clone()), uri).await;
    (status, content_type, body.expect("Failed to read response body"))
}

async fn request(
    store: Arc<dyn ObjectStore>,
    uri: &str,
) -> (StatusCode, Option<String>, Result<Vec<u8>, axum::Error>) {
    let app = server::router(store);
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map(|b| b.to_vec());

    (status, content_type, body)
}

#[tokio::test]
async fn stored_object_is_returned_verbatim() {
    let store = MemoryStore::new();
    let body = b"PK\x03\x04 binary \x00\xff".to_vec();
    store.insert("v1/providers/acme/foo/1.0.0/download/foo.zip", body.clone(), "application/zip");

    let (status, content_type, received) =
        get(&store, "/v1/providers/acme/foo/1.0.0/download/foo.zip").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/zip"));
    assert_eq!(received, body);
}

#[tokio::test]
async fn missing_object_is_404() {
    let store = MemoryStore::new();

    let (status, _, body) = get(&store, "/v1/providers/acme/foo/versions").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"Not Found");
}

#[tokio::test]
async fn directory_paths_are_404() {
    let store = MemoryStore::new();
    store.insert("v1/providers/acme/foo/versions", "{}", "application/json");

    let (status, _, _) = get(&store, "/v1/providers/acme/foo/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&store, "/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn backend_error_is_500_with_detail() {
    let store = MemoryStore::new();
    store.insert("v1/providers/acme/foo/versions", "{}", "application/json");
    store.fail("v1/providers/acme/foo/versions", "permission denied by bucket policy");

    let (status, _, body) = get(&store, "/v1/providers/acme/foo/versions").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"permission denied by bucket policy");
}

#[tokio::test]
async fn query_string_is_not_part_of_the_key() {
    let store = MemoryStore::new();
    store.insert(".well-known/terraform.json", "{}", "application/json");

    let (status, _, _) = get(&store, "/.well-known/terraform.json?cache=bust").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn serves_a_published_registry() {
    let store = MemoryStore::new();
    let release = Release::new("1.0.0", &[("linux", "amd64")]);
    publish(&store, &release.config()).await.unwrap();

    let (status, content_type, body) = get(&store, "/.well-known/terraform.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let discovery: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(discovery["providers.v1"], "/v1/providers/");

    let (status, _, body) = get(&store, "/v1/providers/acme/foo/versions").await;
    assert_eq!(status, StatusCode::OK);
    let versions: ProviderVersions = serde_json::from_slice(&body).unwrap();
    assert_eq!(versions.versions[0].version, "1.0.0");

    let (status, _, body) = get(&store, "/v1/providers/acme/foo/1.0.0/download/linux/amd64").await;
    assert_eq!(status, StatusCode::OK);
    let package: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(package["os"], "linux");
}

/// Serves one object whose body fails after the first chunk.
#[derive(Debug)]
struct BrokenBody;

#[async_trait]
impl ObjectStore for BrokenBody {
    async fn list(&self, _: &str) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        Err(StoreError::NotFound { key: key.to_string() })
    }
    async fn open(&self, _: &str) -> Result<StoredObject, StoreError> {
        let chunks = vec![
            Ok(Bytes::from_static(b"PK")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "bucket connection reset")),
        ];
        Ok(StoredObject::new("application/zip", stream::iter(chunks)))
    }
    async fn write(&self, key: &str, _: Bytes, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable {
            key: key.to_string(),
            message: "read-only".to_string(),
        })
    }
}

#[tokio::test]
async fn body_stream_error_aborts_the_response() {
    let (status, content_type, body) = request(Arc::new(BrokenBody), "/foo.zip").await;

    // Headers are already sent by the time the bucket fails.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/zip"));
    assert!(body.is_err());
}

#[tokio::test]
async fn file_bucket_serves_published_content_types() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::from_directory_path(dir.path()).unwrap();
    let store = open_bucket(url.as_str()).unwrap();
    let release = Release::new("1.0.0", &[("linux", "amd64")]);
    publish(store.as_ref(), &release.config()).await.unwrap();

    for (uri, expected) in [
        ("/.well-known/terraform.json", "application/json"),
        ("/v1/providers/acme/foo/versions", "application/json"),
        ("/v1/providers/acme/foo/1.0.0/download/linux/amd64", "application/json"),
        (
            "/v1/providers/acme/foo/1.0.0/download/terraform-provider-foo_1.0.0_linux_amd64.zip",
            "application/zip",
        ),
        (
            "/v1/providers/acme/foo/1.0.0/terraform-provider-foo_1.0.0_SHA256SUMS",
            "text/plain",
        ),
    ] {
        let (status, content_type, body) = request(store.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(content_type.as_deref(), Some(expected), "{uri}");
        assert!(body.is_ok(), "{uri}");
    }

    let (status, _, body) = request(store, "/v1/providers/acme/foo/versions").await;
    assert_eq!(status, StatusCode::OK);
    let versions: ProviderVersions = serde_json::from_slice(&body.unwrap()).unwrap();
    assert_eq!(versions.versions.len(), 1);
    assert_eq!(versions.versions[0].platforms.len(), 1);
}
