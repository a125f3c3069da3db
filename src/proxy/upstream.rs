//! Upstream transport.
//!
//! # Responsibilities
//! - Send one buffered request to an upstream URL
//! - Enforce connect and total exchange timeouts
//! - Classify failures as unavailable vs. protocol errors
//!
//! # Design Decisions
//! - Single attempt; nothing is retried
//! - Redirects are returned to the caller, never followed
//! - Dropping the returned future aborts the upstream exchange

use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::config::TimeoutConfig;
use crate::error::UpstreamError;

/// A fully buffered request bound for an upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fully buffered upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Something that can carry a request to an upstream and back.
pub trait Upstream: Send + Sync + 'static {
    fn forward(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}

/// HTTP(S) upstream backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let UpstreamRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() || err.is_connect() {
        UpstreamError::Unavailable(err.to_string())
    } else {
        UpstreamError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn timeouts(upstream_secs: u64) -> TimeoutConfig {
        TimeoutConfig {
            connect_secs: 1,
            upstream_secs,
            request_secs: 30,
        }
    }

    fn get(url: &str) -> UpstreamRequest {
        UpstreamRequest {
            method: Method::GET,
            url: Url::parse(url).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Serve one raw reply to the first connection.
    async fn one_shot(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(reply).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/x", addr)
    }

    #[tokio::test]
    async fn buffers_successful_reply() {
        let url = one_shot(b"HTTP/1.1 201 Created\r\nContent-Length: 2\r\nX-Up: 1\r\nConnection: close\r\n\r\nok").await;
        let upstream = HttpUpstream::new(&timeouts(5)).unwrap();

        let response = upstream.forward(get(&url)).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.headers["x-up"], "1");
        assert_eq!(&response.body[..], b"ok");
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = HttpUpstream::new(&timeouts(5)).unwrap();
        let err = upstream
            .forward(get(&format!("http://{}/x", addr)))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)), "{err}");
    }

    #[tokio::test]
    async fn garbage_reply_is_protocol_error() {
        let url = one_shot(b"this is not http\r\n\r\n").await;
        let upstream = HttpUpstream::new(&timeouts(5)).unwrap();

        let err = upstream.forward(get(&url)).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(_)), "{err}");
    }

    #[tokio::test]
    async fn truncated_body_is_protocol_error() {
        let url = one_shot(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort").await;
        let upstream = HttpUpstream::new(&timeouts(5)).unwrap();

        let err = upstream.forward(get(&url)).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(_)), "{err}");
    }

    #[tokio::test]
    async fn silent_upstream_times_out_as_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let upstream = HttpUpstream::new(&timeouts(1)).unwrap();
        let err = upstream
            .forward(get(&format!("http://{}/x", addr)))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)), "{err}");
    }
}
