// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the loopback transport (§6): UTF-8 JSON frames, one
//! per line. Every frame carries at least a `type` discriminator; `id`
//! and `timestamp` are the only extra top-level fields a server may add
//! beyond what a message's own catalog entry defines.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Maximum single-frame size before it is treated as malformed.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
    #[error("connection closed")]
    Closed,
}

/// One inbound or outbound protocol frame. `data` carries the
/// message-specific payload as a raw JSON value; each handler decodes
/// the shape it expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Frame {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data: Some(data),
            id: None,
            timestamp: None,
        }
    }

    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            id: None,
            timestamp: None,
        }
    }
}

/// Reads one newline-delimited JSON frame. Returns `WireError::Closed`
/// on a clean EOF at a frame boundary.
pub async fn read_frame<R>(reader: &mut BufReader<R>) -> Result<Frame, WireError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Err(WireError::Closed);
    }
    if line.len() > MAX_FRAME_SIZE {
        return Err(WireError::TooLarge {
            size: line.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Writes one frame terminated by a single `\n`.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), WireError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(frame)?;
    if encoded.len() > MAX_FRAME_SIZE {
        return Err(WireError::TooLarge {
            size: encoded.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

/// Error codes from §6.
pub mod error_code {
    pub const CONNECTION_LIMIT: &str = "connection_limit";
    pub const INVALID_MESSAGE: &str = "invalid_message";
    pub const INVALID_FILTER: &str = "invalid_filter";
    pub const FILTER_NOT_FOUND: &str = "filter_not_found";
    pub const SERVER_ERROR: &str = "server_error";
    pub const HEARTBEAT_TIMEOUT: &str = "heartbeat_timeout";
    pub const SERVER_SHUTDOWN: &str = "server_shutdown";
}

/// `hello` (client → server).
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    #[serde(rename = "clientName")]
    pub client_name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub description: Option<String>,
}

/// `welcome` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct Welcome {
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "serverVersion")]
    pub server_version: String,
    #[serde(rename = "connectedAt")]
    pub connected_at: i64,
    pub capabilities: Vec<String>,
}

/// `error` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct WireErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `disconnect` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct Disconnect {
    pub reason: String,
    pub message: String,
    #[serde(rename = "gracePeriod", skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u64>,
}

/// `add_filter` (client → server).
#[derive(Debug, Clone, Deserialize)]
pub struct AddFilterRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub dimension: vrlog_core::FilterDimension,
    pub condition: AddFilterCondition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFilterCondition {
    pub operator: vrlog_core::FilterOperator,
    pub value: Value,
    #[serde(rename = "caseSensitive", default)]
    pub case_sensitive: bool,
}

/// `remove_filter` (client → server).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveFilterRequest {
    pub id: String,
}

/// `filter_response` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct FilterResponse {
    pub action: String,
    pub success: bool,
    #[serde(rename = "filterId", skip_serializing_if = "Option::is_none")]
    pub filter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireErrorPayload>,
}

/// `log_message` (server → client): the wire rendering of a processed
/// record.
#[derive(Debug, Clone, Serialize)]
pub struct LogMessage {
    pub id: String,
    pub timestamp: i64,
    pub source: String,
    pub level: String,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedPayload>,
    pub metadata: LogMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedPayload {
    pub kind: String,
    pub fields: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogMetadata {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "fileIndex")]
    pub file_index: usize,
}

/// `vrchat_status_change` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    #[serde(rename = "changeType")]
    pub change_type: &'static str,
    pub timestamp: i64,
    pub data: Value,
    #[serde(rename = "currentStatus")]
    pub current_status: StatusPayload,
}

/// `status` (server → client).
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    #[serde(rename = "isRunning")]
    pub is_running: bool,
    #[serde(rename = "processId", skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(rename = "logDirectoryExists")]
    pub log_directory_exists: bool,
    #[serde(rename = "activeLogFiles")]
    pub active_log_files: usize,
    #[serde(rename = "lastLogActivity", skip_serializing_if = "Option::is_none")]
    pub last_log_activity: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryUsage {
    pub rss: u64,
    #[serde(rename = "heapUsed")]
    pub heap_used: u64,
    #[serde(rename = "heapTotal")]
    pub heap_total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub uptime: u64,
    #[serde(rename = "connectedClients")]
    pub connected_clients: usize,
    #[serde(rename = "monitoredFiles")]
    pub monitored_files: usize,
    #[serde(rename = "messagesProcessed")]
    pub messages_processed: u64,
    #[serde(rename = "messagesDistributed")]
    pub messages_distributed: u64,
    #[serde(rename = "lastLogTime", skip_serializing_if = "Option::is_none")]
    pub last_log_time: Option<i64>,
    #[serde(rename = "memoryUsage")]
    pub memory_usage: MemoryUsage,
    #[serde(rename = "vrchatStatus")]
    pub vrchat_status: StatusPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsCurrent {
    #[serde(rename = "messagesPerSecond")]
    pub messages_per_second: f64,
    #[serde(rename = "clientConnections")]
    pub client_connections: usize,
    #[serde(rename = "memoryUsageMB")]
    pub memory_usage_mb: f64,
    #[serde(rename = "cpuUsage")]
    pub cpu_usage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub current: MetricsCurrent,
}
