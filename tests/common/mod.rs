//! Shared fixtures: an in-process origin server and a proxy on ephemeral ports.

#![allow(dead_code)]

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::ext::ReasonPhrase;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use passage::server;
use passage_core::codec::encode;
use passage_core::{ConnectionProvider, NotFoundAssets, ProxyConfig, ProxyProvider};

pub const PREFIX: &str = "/assignment/";

pub const INDEX_HTML: &str = concat!(
    "<html><head><link rel=\"stylesheet\" href=\"/css/site.css\"></head>",
    "<body><a href=\"other.html\">Other</a><img src=\"../img/logo.png\">",
    "<a href=\"#top\">Top</a><p>Body text</p></body></html>",
);

pub const SITE_CSS: &str = "body{background:url(\"../img/bg.png\")} h1{color:red}";

pub const DATA_JSON: &str = r#"{"links":["/a","/b"],"url":"url(/x)"}"#;

/// Chunks sent by `/slow`, one every [`SLOW_CHUNK_INTERVAL`].
pub const SLOW_CHUNKS: usize = 4;
pub const SLOW_CHUNK_INTERVAL: Duration = Duration::from_millis(700);

/// First and only chunk `/hold` sends before stalling forever.
pub const HELD_CHUNK: &str = "first part of a body that never ends";

/// Non-canonical reason phrase sent by `/reason`.
pub const CUSTOM_REASON: &str = "Fine By Me";

type OriginBody = UnsyncBoxBody<Bytes, Infallible>;

/// Proxy configuration for tests.
#[derive(Clone, Debug)]
pub struct TestConfig {
    pub proxy: ProxyConfig,
    pub max_connections: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig {
                timeout: Duration::from_secs(10),
                connect_timeout: Duration::from_secs(5),
                ..ProxyConfig::default()
            },
            max_connections: 100,
        }
    }
}

impl ProxyProvider for TestConfig {
    fn proxy_config(&self) -> &ProxyConfig {
        &self.proxy
    }
}

impl ConnectionProvider for TestConfig {
    fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A running proxy; shut down explicitly or when dropped.
pub struct ProxyHandle {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl ProxyHandle {
    /// URL of a raw path on the proxy.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Proxy URL fetching `target`.
    pub fn proxied(&self, target: &str) -> String {
        self.url(&format!("{PREFIX}{}", encode(target)))
    }

    /// Stops accepting and waits for the accept loop to return.
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task.await.expect("proxy task panicked"),
            None => Ok(()),
        }
    }
}

impl Drop for ProxyHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn start_proxy(config: TestConfig) -> ProxyHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = config.proxy.build_http_client().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let task = tokio::spawn(server::serve(
        listener,
        Arc::new(config),
        Arc::new(NotFoundAssets),
        client,
        async {
            let _ = rx.await;
        },
    ));

    ProxyHandle {
        addr,
        shutdown: Some(tx),
        task: Some(task),
    }
}

/// Client that does not follow redirects, so proxy responses are seen as-is.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Starts the origin server and returns its base URL (`http://127.0.0.1:port`).
pub async fn start_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(origin))
                    .await;
            });
        }
    });

    format!("http://{addr}")
}

/// An address nothing listens on.
pub async fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn respond(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Response<OriginBody> {
    Response::builder()
        .status(status)
        .header("content-type", content_type)
        .body(Full::new(body.into()).boxed_unsync())
        .unwrap()
}

fn octet_stream(body: OriginBody) -> Response<OriginBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/octet-stream")
        .body(body)
        .unwrap()
}

async fn origin(req: Request<Incoming>) -> Result<Response<OriginBody>, Infallible> {
    let response = match req.uri().path() {
        "/page/index.html" => respond(StatusCode::OK, "text/html; charset=utf-8", INDEX_HTML),
        "/css/site.css" => respond(StatusCode::OK, "text/css", SITE_CSS),
        "/data.json" => {
            let mut response = respond(StatusCode::OK, "application/json", DATA_JSON);
            let headers = response.headers_mut();
            headers.insert("set-cookie", "session=secret".parse().unwrap());
            headers.insert("content-security-policy", "default-src 'self'".parse().unwrap());
            headers.insert("x-frame-options", "DENY".parse().unwrap());
            headers.insert("x-origin", "kept".parse().unwrap());
            response
        }
        "/redirect" => Response::builder()
            .status(StatusCode::FOUND)
            .header("location", "/landing/page.html")
            .body(Full::new(Bytes::new()).boxed_unsync())
            .unwrap(),
        "/landing/page.html" => respond(
            StatusCode::OK,
            "text/html",
            "<a href=\"next.html\">next</a>",
        ),
        "/search" => {
            let query = req.uri().query().unwrap_or_default().to_string();
            respond(StatusCode::OK, "text/plain", query)
        }
        "/echo" => {
            let method = req.method().to_string();
            let header = |name: &str| {
                req.headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-")
                    .to_string()
            };
            let summary = format!(
                "cookie={} referer={} x-custom={}",
                header("cookie"),
                header("referer"),
                header("x-custom"),
            );
            let body = req.into_body().collect().await.unwrap().to_bytes();
            respond(
                StatusCode::OK,
                "text/plain",
                format!("{method} {} {summary}", body.len()),
            )
        }
        "/slow" => {
            let chunks = futures::stream::unfold(0, |sent| async move {
                if sent == SLOW_CHUNKS {
                    return None;
                }
                tokio::time::sleep(SLOW_CHUNK_INTERVAL).await;
                let chunk = Bytes::from(vec![b'a' + sent as u8; 10]);
                Some((Ok::<_, Infallible>(Frame::data(chunk)), sent + 1))
            });
            octet_stream(StreamBody::new(chunks).boxed_unsync())
        }
        "/hold" => {
            let chunks = futures::stream::once(async {
                Ok::<_, Infallible>(Frame::data(Bytes::from_static(HELD_CHUNK.as_bytes())))
            })
            .chain(futures::stream::pending());
            octet_stream(StreamBody::new(chunks).boxed_unsync())
        }
        "/reason" => {
            let mut response = respond(StatusCode::OK, "text/plain", "ok");
            response
                .extensions_mut()
                .insert(ReasonPhrase::from_static(CUSTOM_REASON.as_bytes()));
            response
        }
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "origin: no such page"),
    };

    Ok(response)
}
