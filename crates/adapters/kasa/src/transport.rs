//! One request/response exchange with a Kasa device over TCP.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::cipher;
use crate::error::KasaError;

/// Host and port of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse `host` or `host:port`, falling back to `default_port`.
    ///
    /// Bare IPv6 literals are taken as host only.
    #[must_use]
    pub fn parse(address: &str, default_port: u16) -> Self {
        if let Some((host, port)) = address.rsplit_once(':')
            && !host.contains(':')
            && let Ok(port) = port.parse()
        {
            return Self {
                host: host.to_string(),
                port,
            };
        }
        Self {
            host: address.to_string(),
            port: default_port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Send `request` to `endpoint` and return the decoded JSON answer.
///
/// A fresh connection is opened per exchange; the whole exchange is bounded
/// by `timeout`.
pub async fn exchange(
    endpoint: &Endpoint,
    request: &Value,
    timeout: Duration,
    max_frame: u32,
) -> Result<Value, KasaError> {
    tokio::time::timeout(timeout, exchange_inner(endpoint, request, max_frame))
        .await
        .map_err(|_| KasaError::Timeout(timeout))?
}

async fn exchange_inner(
    endpoint: &Endpoint,
    request: &Value,
    max_frame: u32,
) -> Result<Value, KasaError> {
    let payload = serde_json::to_vec(request).map_err(KasaError::Json)?;
    let Some(frame) = cipher::frame(&payload) else {
        return Err(KasaError::FrameTooLarge(u32::MAX));
    };

    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|source| KasaError::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
    stream.write_all(&frame).await.map_err(KasaError::Io)?;

    let len = stream.read_u32().await.map_err(KasaError::Io)?;
    if len > max_frame {
        return Err(KasaError::FrameTooLarge(len));
    }
    let mut body = vec![0; len as usize];
    stream.read_exact(&mut body).await.map_err(KasaError::Io)?;

    let plain = cipher::decrypt(&body);
    tracing::trace!(%endpoint, bytes = plain.len(), "kasa response received");
    serde_json::from_slice(&plain).map_err(KasaError::Json)
}
