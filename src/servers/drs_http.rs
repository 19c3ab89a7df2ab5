//! # DRS/HTTP server
//!
//! A read surface (GET file content, GET directory listings as JSON) and an
//! optional write surface (POST a blob, content-addressed by its SHA-256
//! digest) over any [`Ufs`]. The write path reuses the same digest scheme as
//! [`crate::backends::remote::drs`]: the body is streamed to a temporary
//! name while hashing, then `rename`d onto the final content-address path
//! iff that name is absent — so concurrent uploads of the same bytes settle
//! on one blob instead of racing.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::backends::remote::drs::hash_bytes;
use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;

/// Where content-addressed uploads land. Blobs are served back from here
/// under their hash, same as a [`crate::backends::remote::drs::DrsUfs`]
/// manifest resolving a path to a digest.
const BLOB_DIR: &str = "/.blobs";

struct AppState<B> {
    store: Arc<B>,
    writable: bool,
}

/// Builds the `axum` router for one store. Mount with `axum::serve`.
pub struct DrsHttpServer<B> {
    state: Arc<AppState<B>>,
}

impl<B: Ufs + 'static> DrsHttpServer<B> {
    /// Serve `store` read-only: only the GET routes are registered.
    pub fn read_only(store: Arc<B>) -> Self {
        Self {
            state: Arc::new(AppState { store, writable: false }),
        }
    }

    /// Serve `store` with the content-addressed write surface enabled.
    pub fn read_write(store: Arc<B>) -> Self {
        Self {
            state: Arc::new(AppState { store, writable: true }),
        }
    }

    /// The `axum` router for this server.
    pub fn router(self) -> Router {
        let mut router = Router::new()
            .route("/", get(list_or_read::<B>))
            .route("/*path", get(list_or_read::<B>));
        if self.state.writable {
            router = router.route("/blobs", post(put_blob::<B>));
        }
        router.with_state(self.state)
    }
}

fn status_of(err: &FsError) -> StatusCode {
    match err {
        FsError::NotFound { .. } => StatusCode::NOT_FOUND,
        FsError::AlreadyExists { .. } => StatusCode::CONFLICT,
        FsError::NotADirectory { .. } | FsError::IsADirectory { .. } => StatusCode::BAD_REQUEST,
        FsError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        FsError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn list_or_read<B: Ufs>(State(state): State<Arc<AppState<B>>>, path: Option<AxumPath<String>>) -> Response {
    let ufs_path = match &path {
        Some(AxumPath(p)) => UfsPath::new(p),
        None => UfsPath::root(),
    };
    let info = match state.store.info(&ufs_path) {
        Ok(info) => info,
        Err(e) => return (status_of(&e), e.to_string()).into_response(),
    };
    if info.is_dir() {
        match state.store.ls(&ufs_path) {
            Ok(names) => Json(names).into_response(),
            Err(e) => (status_of(&e), e.to_string()).into_response(),
        }
    } else {
        match state.store.cat(&ufs_path) {
            Ok(data) => data.into_response(),
            Err(e) => (status_of(&e), e.to_string()).into_response(),
        }
    }
}

async fn put_blob<B: Ufs>(State(state): State<Arc<AppState<B>>>, body: Bytes) -> Response {
    let data = body.to_vec();
    let hash = hash_bytes(&data);
    let final_path = UfsPath::new(BLOB_DIR).join_name(&hash);

    if state.store.info(&final_path).is_ok() {
        return (StatusCode::OK, hash).into_response();
    }

    let scratch_path = UfsPath::new(BLOB_DIR).join_name(format!(".tmp-{hash}"));
    if state.store.info(&UfsPath::new(BLOB_DIR)).is_err() {
        if let Err(e) = state.store.mkdir(&UfsPath::new(BLOB_DIR)) {
            return (status_of(&e), e.to_string()).into_response();
        }
    }
    if let Err(e) = state.store.put(&scratch_path, &data) {
        return (status_of(&e), e.to_string()).into_response();
    }
    match state.store.rename(&scratch_path, &final_path) {
        Ok(()) => (StatusCode::CREATED, hash).into_response(),
        Err(FsError::AlreadyExists { .. }) => {
            let _ = state.store.unlink(&scratch_path);
            (StatusCode::OK, hash).into_response()
        }
        Err(e) => (status_of(&e), e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn get_serves_file_content() {
        let store = Arc::new(MemoryUfs::new());
        store.put(&UfsPath::new("/a.txt"), b"hello").unwrap();
        let app = DrsHttpServer::read_only(store).router();

        let response = app
            .oneshot(Request::builder().uri("/a.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn get_missing_path_is_not_found() {
        let store = Arc::new(MemoryUfs::new());
        let app = DrsHttpServer::read_only(store).router();
        let response = app
            .oneshot(Request::builder().uri("/missing.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_blob_is_content_addressed_and_idempotent() {
        let store = Arc::new(MemoryUfs::new());
        let expected = hash_bytes(b"payload");
        let app = DrsHttpServer::read_write(store.clone()).router();

        let response = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/blobs").body(Body::from("payload")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(std::str::from_utf8(&body).unwrap(), expected);

        let response = app
            .oneshot(Request::builder().method("POST").uri("/blobs").body(Body::from("payload")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            store.cat(&UfsPath::new(BLOB_DIR).join_name(&expected)).unwrap(),
            b"payload"
        );
    }

    #[tokio::test]
    async fn read_only_server_has_no_write_route() {
        let store = Arc::new(MemoryUfs::new());
        let app = DrsHttpServer::read_only(store).router();
        let response = app
            .oneshot(Request::builder().method("POST").uri("/blobs").body(Body::from("x")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
