//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use capacity_probe::probe::{FailureKind, ProbeResult, Prober};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

fn status_line(status: u16) -> String {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        418 => "I'm a teapot",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Status",
    };
    format!("{} {}", status, reason)
}

/// Read until the end of the request head.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

/// Start a programmable backend on an ephemeral port.
///
/// `f` is called once per request and returns the status and body to send.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        let (status, body) = f().await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Backend that always answers with `status`.
pub async fn start_fixed_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, "ok".to_string()) }).await
}

/// Backend that counts requests and answers with `respond(count)`, where
/// `count` starts at 0.
pub async fn start_counting_backend<F>(calls: Arc<AtomicUsize>, respond: F) -> SocketAddr
where
    F: Fn(usize) -> u16 + Send + Sync + 'static,
{
    let respond = Arc::new(respond);
    start_programmable_backend(move || {
        let calls = calls.clone();
        let respond = respond.clone();
        async move {
            let count = calls.fetch_add(1, Ordering::SeqCst);
            (respond(count), "counted".to_string())
        }
    })
    .await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn url_for(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

/// In-process step-function server.
///
/// Every probe takes `latency`. A probe succeeds when the widest fan-out seen
/// while it was in flight is at most `limit`, otherwise it fails with 503.
/// Use with a paused clock so all probes of a batch overlap exactly.
pub struct StepServer {
    limit: usize,
    latency: Duration,
    healthy_calls: usize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StepServer {
    pub fn new(limit: usize, latency: Duration) -> Self {
        Self::degrading(limit, latency, usize::MAX)
    }

    /// Like [`StepServer::new`], but every call after the first
    /// `healthy_calls` fails regardless of fan-out.
    pub fn degrading(limit: usize, latency: Duration, healthy_calls: usize) -> Self {
        Self {
            limit,
            latency,
            healthy_calls,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl Prober for StepServer {
    async fn probe(&self, _target: &Url) -> ProbeResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        let peak = self.peak.load(Ordering::SeqCst);
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.peak.store(0, Ordering::SeqCst);
        }

        if peak <= self.limit && call < self.healthy_calls {
            ProbeResult::Success {
                latency: self.latency,
            }
        } else {
            ProbeResult::Failure(FailureKind::Status(503))
        }
    }
}

/// A probe that never resolves on its own.
pub struct HangingProber;

impl Prober for HangingProber {
    async fn probe(&self, _target: &Url) -> ProbeResult {
        std::future::pending().await
    }
}
