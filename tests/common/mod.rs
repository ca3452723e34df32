//! Shared utilities for integration testing: an S3-like store, an origin
//! server and a running proxy, all in-process on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;

use s3_caching_proxy::cache::{CachingHandler, Redirects};
use s3_caching_proxy::config::{ProxyConfig, SpoolConfig, StoreConfig};
use s3_caching_proxy::lifecycle::Shutdown;
use s3_caching_proxy::store::signing::authorization;
use s3_caching_proxy::store::Credentials;
use s3_caching_proxy::{HttpServer, ObjectStoreClient};

pub const BUCKET: &str = "assets";
pub const ACCESS_KEY: &str = "AKIDEXAMPLE";
pub const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";

pub const FIXED_BODY: &str = "\u{89}PNG pretend image bytes";
pub const CHUNKS: [&str; 3] = ["first chunk, ", "second chunk, ", "last chunk"];

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An object as the mock store received it.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub chunked: bool,
}

/// Shared state of the mock store.
#[derive(Default)]
pub struct StoreState {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub calls: Mutex<Vec<(Method, String)>>,
    /// Status returned for uploads; 0 means accept.
    pub put_status: AtomicU16,
}

impl StoreState {
    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> usize {
        self.calls().iter().filter(|(m, _)| *m == Method::PUT).count()
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(path).cloned()
    }
}

/// Path-style S3 double that checks V2 signatures.
pub struct MockStore {
    pub addr: SocketAddr,
    pub state: Arc<StoreState>,
}

impl MockStore {
    pub async fn start() -> Self {
        let state = Arc::new(StoreState::default());
        let router = Router::new()
            .route("/{*path}", any(store_handler))
            .with_state(state.clone());
        let addr = serve(router).await;
        Self { addr, state }
    }

    /// Object path as the store sees it for an origin-relative target.
    pub fn object_path(&self, origin: SocketAddr, path: &str) -> String {
        format!("/{}/{}{}", BUCKET, origin, path)
    }

    pub fn object_url(&self, origin: SocketAddr, path: &str) -> String {
        format!("http://{}{}", self.addr, self.object_path(origin, path))
    }
}

async fn store_handler(State(state): State<Arc<StoreState>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    state
        .calls
        .lock()
        .unwrap()
        .push((parts.method.clone(), path.clone()));

    let expected = authorization(
        &Credentials::new(ACCESS_KEY, SECRET_KEY),
        &parts.method,
        &parts.headers,
        &path,
    );
    let signed = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !parts.headers.contains_key(header::DATE) || signed != Some(expected.as_str()) {
        return (StatusCode::FORBIDDEN, "SignatureDoesNotMatch").into_response();
    }

    match parts.method {
        Method::HEAD => {
            if state.objects.lock().unwrap().contains_key(&path) {
                StatusCode::OK.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        Method::PUT => {
            let status = state.put_status.load(Ordering::SeqCst);
            if status != 0 {
                let status = StatusCode::from_u16(status).unwrap();
                return (status, [("x-amz-request-id", "mock")], "store says no").into_response();
            }

            let content_length = parts
                .headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let chunked = parts.headers.contains_key(header::TRANSFER_ENCODING);
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

            state.objects.lock().unwrap().insert(
                path,
                StoredObject {
                    body,
                    content_length,
                    content_type,
                    chunked,
                },
            );
            StatusCode::OK.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Origin server with fixed-length, chunked and failing resources.
pub struct MockOrigin {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl MockOrigin {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/fixed/{name}", get(fixed))
            .route("/chunked", get(chunked))
            .route("/missing", get(missing))
            .with_state(hits.clone());
        let addr = serve(router).await;
        Self { addr, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn fixed(State(hits): State<Arc<AtomicUsize>>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], FIXED_BODY).into_response()
}

async fn chunked(State(hits): State<Arc<AtomicUsize>>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let stream = futures_util::stream::iter(
        CHUNKS
            .iter()
            .map(|chunk| Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))),
    );
    ([(header::CONTENT_TYPE, "text/plain")], Body::from_stream(stream)).into_response()
}

async fn missing(State(hits): State<Arc<AtomicUsize>>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::NOT_FOUND,
        [("x-origin", "missing")],
        "no such thing",
    )
        .into_response()
}

/// Total length of the chunked resource.
pub fn chunked_len() -> usize {
    CHUNKS.iter().map(|c| c.len()).sum()
}

/// A running proxy.
pub struct Proxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Proxy {
    pub async fn start(store_endpoint: &str, spool_dir: &Path, redirects: Redirects) -> Self {
        let store = StoreConfig {
            bucket: BUCKET.into(),
            endpoint: store_endpoint.into(),
            path_style: true,
            access_key: ACCESS_KEY.into(),
            secret_key: SECRET_KEY.into(),
        };
        let spool = SpoolConfig {
            directory: Some(spool_dir.to_path_buf()),
            prefix: "upload".into(),
        };
        let handler = CachingHandler::from_parts(
            ObjectStoreClient::with_client(&store, no_proxy_client(false)),
            no_proxy_client(true),
            redirects,
            spool,
        );

        let mut config = ProxyConfig::default();
        config.store = store;
        let server = HttpServer::with_handler(config, handler);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });

        Self { addr, shutdown }
    }

    /// Proxy URL for a target on `origin`.
    pub fn url_for(&self, origin: SocketAddr, path: &str) -> String {
        format!("http://{}/http://{}{}", self.addr, origin, path)
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn no_proxy_client(follow_redirects: bool) -> reqwest::Client {
    let policy = if follow_redirects {
        reqwest::redirect::Policy::default()
    } else {
        reqwest::redirect::Policy::none()
    };
    reqwest::Client::builder()
        .no_proxy()
        .redirect(policy)
        .build()
        .unwrap()
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    no_proxy_client(false)
}

/// Files left in a spool directory.
pub fn spool_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
