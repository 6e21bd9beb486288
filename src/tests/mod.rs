
use crate::errors::FetchError;
use crate::metadata::{FetchedResource, ResourceFetcher};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use url::Url;

fn normalize_key(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

/// In-memory fetcher: unknown URLs fail like a refused connection.
/// Every requested URL is recorded.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, FetchedResource>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: &str) -> Self {
        self.with_status(url, 200, body)
    }

    pub fn with_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.resources.insert(
            normalize_key(url),
            FetchedResource {
                status,
                content_type: None,
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.resources.insert(
            normalize_key(url),
            FetchedResource {
                status: 200,
                content_type: None,
                body,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ResourceFetcher for StaticFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.resources
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Transport("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Serves `tests/apps` over HTTP on an ephemeral port, on its own tokio
/// runtime thread so blocking clients can be used from the test thread.
pub struct FixtureServer {
    addr: SocketAddr,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FixtureServer {
    pub fn start() -> Self {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind fixture server");
        listener
            .set_nonblocking(true)
            .expect("failed to set fixture listener non-blocking");
        let addr = listener.local_addr().expect("fixture server has no address");

        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/apps");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build fixture runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)
                    .expect("failed to adopt fixture listener");
                let app = axum::Router::new()
                    .fallback_service(tower_http::services::ServeDir::new(root));
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await
                    .expect("fixture server failed");
            });
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, app: &str) -> String {
        format!("{}/{app}", self.origin())
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
