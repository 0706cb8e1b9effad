// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands: a thin handshake + request/response
//! wrapper over the loopback wire protocol.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use vrlog_daemon::wire::{self, Frame, WireError};

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for request/response round trips.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("VRLOG_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to vrlogd at {0}: {1}")]
    Connect(std::net::SocketAddr, std::io::Error),
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    #[error("request timed out")]
    Timeout,
    #[error("daemon rejected request: {0}")]
    Rejected(String),
    #[error("unexpected response frame: {0}")]
    UnexpectedResponse(String),
}

/// Connected client: one TCP connection, one handshake.
pub struct DaemonClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl DaemonClient {
    pub async fn connect(addr: std::net::SocketAddr, client_name: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Connect(addr, e))?;
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        client
            .send_frame(Frame::new(
                "hello",
                json!({ "clientName": client_name, "capabilities": [] }),
            ))
            .await?;
        let welcome = client.recv_frame().await?;
        if welcome.kind != "welcome" {
            return Err(ClientError::UnexpectedResponse(welcome.kind));
        }

        Ok(client)
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), ClientError> {
        wire::write_frame(&mut self.writer, &frame).await?;
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Frame, ClientError> {
        tokio::time::timeout(timeout_ipc(), wire::read_frame(&mut self.reader))
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(ClientError::from)
    }

    /// Reads one inbound frame with no timeout, for long-lived `watch`.
    pub async fn recv_frame_unbounded(&mut self) -> Result<Frame, ClientError> {
        Ok(wire::read_frame(&mut self.reader).await?)
    }

    pub async fn get_status(&mut self) -> Result<Value, ClientError> {
        self.send_frame(Frame::bare("get_status")).await?;
        let frame = self.recv_frame().await?;
        if frame.kind != "status" {
            return Err(ClientError::UnexpectedResponse(frame.kind));
        }
        Ok(frame.data.unwrap_or(Value::Null))
    }

    pub async fn get_metrics(&mut self) -> Result<Value, ClientError> {
        self.send_frame(Frame::bare("get_metrics")).await?;
        let frame = self.recv_frame().await?;
        if frame.kind != "metrics" {
            return Err(ClientError::UnexpectedResponse(frame.kind));
        }
        Ok(frame.data.unwrap_or(Value::Null))
    }

    pub async fn add_filter(
        &mut self,
        id: &str,
        dimension: &str,
        operator: &str,
        value: Value,
        case_sensitive: bool,
    ) -> Result<Value, ClientError> {
        self.send_frame(Frame::new(
            "add_filter",
            json!({
                "id": id,
                "type": dimension,
                "condition": {
                    "operator": operator,
                    "value": value,
                    "caseSensitive": case_sensitive,
                }
            }),
        ))
        .await?;
        self.expect_filter_response().await
    }

    pub async fn remove_filter(&mut self, id: &str) -> Result<Value, ClientError> {
        self.send_frame(Frame::new("remove_filter", json!({ "id": id })))
            .await?;
        self.expect_filter_response().await
    }

    async fn expect_filter_response(&mut self) -> Result<Value, ClientError> {
        let frame = self.recv_frame().await?;
        if frame.kind != "filter_response" {
            return Err(ClientError::UnexpectedResponse(frame.kind));
        }
        let data = frame.data.unwrap_or(Value::Null);
        if data.get("success").and_then(Value::as_bool) == Some(false) {
            let message = data
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("filter request rejected")
                .to_string();
            return Err(ClientError::Rejected(message));
        }
        Ok(data)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
