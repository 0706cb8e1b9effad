// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast Fabric (§4.7): the accept loop, per-connection handshake
//! and receive/send tasks, heartbeat, and fan-out of processed records.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::json;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vrlog_core::{CompiledFilter, FilterClause, FilterOperand, ProcessedRecord};

use crate::registry::{RejectReason, SubscriberRegistry};
use crate::subscriber::{default_queue_capacity, Subscriber};
use crate::supervisor::{StatusCell, StatusChangeEvent, StatusChangeType};
use crate::wire::{
    self, error_code, AddFilterCondition, AddFilterRequest, Disconnect, Frame, LogMessage,
    LogMetadata, MemoryUsage, Metrics, MetricsCurrent, ParsedPayload, RemoveFilterRequest, Status,
    StatusPayload, WireErrorPayload,
};

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Counters surfaced by `get_status`/`get_metrics` (§4.7).
#[derive(Default)]
pub struct FabricCounters {
    pub messages_processed: AtomicU64,
    pub messages_distributed: AtomicU64,
}

pub struct FabricConfig {
    pub bind_addr: SocketAddr,
    pub max_clients: usize,
    pub ping_interval: Duration,
}

pub struct BroadcastFabric {
    pub registry: Arc<SubscriberRegistry>,
    pub counters: Arc<FabricCounters>,
    status_cell: Arc<StatusCell>,
    ping_interval: Duration,
    start_time: Instant,
    next_id: Arc<dyn Fn() -> String + Send + Sync>,
}

impl BroadcastFabric {
    pub fn new(
        config: &FabricConfig,
        status_cell: Arc<StatusCell>,
        next_id: Arc<dyn Fn() -> String + Send + Sync>,
    ) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new(config.max_clients)),
            counters: Arc::new(FabricCounters::default()),
            status_cell,
            ping_interval: config.ping_interval,
            start_time: Instant::now(),
            next_id,
        }
    }

    /// Runs the accept loop until `stop_rx` fires. A non-loopback peer is
    /// rejected at accept time (§6); each accepted connection gets its
    /// own handshake + receive/send task pair.
    pub async fn run_acceptor(
        self: Arc<Self>,
        listener: TcpListener,
        mut stop_rx: tokio::sync::oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    info!("broadcast fabric acceptor stopping");
                    self.disconnect_all(error_code::SERVER_SHUTDOWN, "server shutting down").await;
                    return;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            if !peer.ip().is_loopback() {
                                warn!(%peer, "rejected non-loopback peer");
                                continue;
                            }
                            let fabric = Arc::clone(&self);
                            tokio::spawn(async move { fabric.handle_connection(stream).await });
                        }
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }
    }

    async fn disconnect_all(&self, reason: &str, message: &str) {
        for subscriber in self.registry.snapshot() {
            subscriber.try_enqueue(Frame::new(
                "disconnect",
                serde_json::to_value(Disconnect {
                    reason: reason.to_string(),
                    message: message.to_string(),
                    grace_period: Some(1000),
                })
                .unwrap_or(json!({})),
            ));
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let hello_frame = match wire::read_frame(&mut reader).await {
            Ok(frame) if frame.kind == "hello" => frame,
            Ok(_) => {
                send_error(&mut write_half, error_code::INVALID_MESSAGE, "expected hello").await;
                return;
            }
            Err(_) => return,
        };
        let hello: wire::Hello = match hello_frame
            .data
            .and_then(|d| serde_json::from_value(d).ok())
        {
            Some(h) => h,
            None => {
                send_error(&mut write_half, error_code::INVALID_MESSAGE, "malformed hello").await;
                return;
            }
        };

        let id = (self.next_id)();
        let (outbound_tx, mut outbound_rx) = mpsc::channel(default_queue_capacity());
        let subscriber = Arc::new(Subscriber::new(id.clone(), hello.client_name, outbound_tx));

        if let Err(RejectReason::ConnectionLimit) = self.registry.add(Arc::clone(&subscriber)) {
            send_error(
                &mut write_half,
                error_code::CONNECTION_LIMIT,
                "connection limit reached",
            )
            .await;
            return;
        }

        let welcome = wire::Welcome {
            client_id: id.clone(),
            server_version: SERVER_VERSION.to_string(),
            connected_at: now_millis(),
            capabilities: vec!["log_message".to_string(), "filters".to_string()],
        };
        if wire::write_frame(&mut write_half, &Frame::new("welcome", json!(welcome)))
            .await
            .is_err()
        {
            self.registry.remove(&id);
            return;
        }
        info!(subscriber_id = %id, "subscriber connected");

        let sender_task = {
            let subscriber = Arc::clone(&subscriber);
            tokio::spawn(async move {
                while let Some(frame) = outbound_rx.recv().await {
                    if wire::write_frame(&mut write_half, &frame).await.is_err() {
                        break;
                    }
                }
                let _ = subscriber; // keep alive for the duration of the send loop
            })
        };

        self.receive_loop(&mut reader, &subscriber).await;

        sender_task.abort();
        self.registry.remove(&id);
        info!(subscriber_id = %id, "subscriber disconnected");
    }

    async fn receive_loop(
        &self,
        reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
        subscriber: &Arc<Subscriber>,
    ) {
        loop {
            let frame = match tokio::time::timeout(self.ping_interval * 2, wire::read_frame(reader)).await {
                Ok(Ok(frame)) => frame,
                Ok(Err(_)) => return,
                Err(_) => {
                    subscriber.try_enqueue(Frame::new(
                        "disconnect",
                        json!(Disconnect {
                            reason: error_code::HEARTBEAT_TIMEOUT.to_string(),
                            message: "no inbound frame within two ping intervals".to_string(),
                            grace_period: None,
                        }),
                    ));
                    return;
                }
            };
            subscriber.touch();
            self.handle_inbound(subscriber, frame).await;
        }
    }

    async fn handle_inbound(&self, subscriber: &Arc<Subscriber>, frame: Frame) {
        match frame.kind.as_str() {
            "ping" => {
                subscriber.try_enqueue(Frame::new("pong", json!({"timestamp": now_millis()})));
            }
            "pong" => {}
            "get_status" => {
                subscriber.try_enqueue(self.status_frame());
            }
            "get_metrics" => {
                subscriber.try_enqueue(self.metrics_frame());
            }
            "add_filter" => self.handle_add_filter(subscriber, frame).await,
            "remove_filter" => self.handle_remove_filter(subscriber, frame).await,
            other => {
                warn!(kind = other, "unrecognized inbound frame type");
                subscriber.try_enqueue(Frame::new(
                    "error",
                    json!(WireErrorPayload {
                        code: error_code::INVALID_MESSAGE.to_string(),
                        message: format!("unknown message type '{other}'"),
                        details: None,
                    }),
                ));
            }
        }
    }

    async fn handle_add_filter(&self, subscriber: &Arc<Subscriber>, frame: Frame) {
        let request: AddFilterRequest = match frame.data.and_then(|d| serde_json::from_value(d).ok()) {
            Some(r) => r,
            None => {
                subscriber.try_enqueue(filter_error_frame("add_filter", None, "malformed add_filter"));
                return;
            }
        };
        let AddFilterCondition {
            operator,
            value,
            case_sensitive,
        } = request.condition;
        let operand = match value_to_operand(&value) {
            Some(o) => o,
            None => {
                subscriber.try_enqueue(filter_error_frame(
                    "add_filter",
                    Some(request.id),
                    "operand must be a string or list of strings",
                ));
                return;
            }
        };
        let clause = FilterClause {
            id: request.id.clone(),
            dimension: request.dimension,
            operator,
            operand,
            case_sensitive,
        };
        match CompiledFilter::compile(&clause) {
            Ok(compiled) => {
                subscriber.filters.lock().add(compiled);
                subscriber.try_enqueue(Frame::new(
                    "filter_response",
                    json!(wire::FilterResponse {
                        action: "add_filter".to_string(),
                        success: true,
                        filter_id: Some(request.id),
                        error: None,
                    }),
                ));
            }
            Err(e) => {
                subscriber.try_enqueue(filter_error_frame("add_filter", Some(request.id), &e.to_string()));
            }
        }
    }

    async fn handle_remove_filter(&self, subscriber: &Arc<Subscriber>, frame: Frame) {
        let request: RemoveFilterRequest = match frame.data.and_then(|d| serde_json::from_value(d).ok()) {
            Some(r) => r,
            None => {
                subscriber.try_enqueue(filter_error_frame("remove_filter", None, "malformed remove_filter"));
                return;
            }
        };
        let removed = subscriber.filters.lock().remove(&request.id);
        if removed {
            subscriber.try_enqueue(Frame::new(
                "filter_response",
                json!(wire::FilterResponse {
                    action: "remove_filter".to_string(),
                    success: true,
                    filter_id: Some(request.id),
                    error: None,
                }),
            ));
        } else {
            subscriber.try_enqueue(filter_error_frame_code(
                "remove_filter",
                Some(request.id),
                error_code::FILTER_NOT_FOUND,
                "no filter with that id",
            ));
        }
    }

    fn status_frame(&self) -> Frame {
        let source = self.status_cell.snapshot();
        let payload = Status {
            uptime: self.start_time.elapsed().as_secs(),
            connected_clients: self.registry.len(),
            monitored_files: source.active_file_count,
            messages_processed: self.counters.messages_processed.load(Ordering::Relaxed),
            messages_distributed: self.counters.messages_distributed.load(Ordering::Relaxed),
            last_log_time: source.last_line_observed_at.map(system_time_to_millis),
            memory_usage: MemoryUsage {
                rss: 0,
                heap_used: 0,
                heap_total: 0,
            },
            vrchat_status: StatusPayload {
                is_running: source.running,
                process_id: source.process_id,
                log_directory_exists: source.log_directory_present,
                active_log_files: source.active_file_count,
                last_log_activity: source.last_line_observed_at.map(system_time_to_millis),
            },
        };
        Frame::new("status", json!(payload))
    }

    fn metrics_frame(&self) -> Frame {
        let elapsed = self.start_time.elapsed().as_secs_f64().max(1.0);
        let processed = self.counters.messages_processed.load(Ordering::Relaxed) as f64;
        Frame::new(
            "metrics",
            json!(Metrics {
                current: MetricsCurrent {
                    messages_per_second: processed / elapsed,
                    client_connections: self.registry.len(),
                    memory_usage_mb: 0.0,
                    cpu_usage: 0.0,
                },
            }),
        )
    }

    /// Fan-out (§4.7): for every subscriber whose filter set accepts
    /// `record`, enqueue it; never blocks on a slow subscriber.
    pub fn publish(&self, record: &ProcessedRecord) {
        self.counters.messages_processed.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::new("log_message", json!(log_message_payload(record)));
        self.registry.each_matching(record, |subscriber| {
            subscriber.try_enqueue(frame.clone());
            self.counters.messages_distributed.fetch_add(1, Ordering::Relaxed);
        });
    }

    pub fn publish_status_change(&self, event: &StatusChangeEvent) {
        let change_type = match event.change_type {
            StatusChangeType::Process => "process",
            StatusChangeType::LogDirectory => "log_directory",
            StatusChangeType::LogMonitoring => "log_monitoring",
        };
        let payload = wire::StatusChange {
            change_type,
            timestamp: now_millis(),
            data: json!({}),
            current_status: StatusPayload {
                is_running: event.status.running,
                process_id: event.status.process_id,
                log_directory_exists: event.status.log_directory_present,
                active_log_files: event.status.active_file_count,
                last_log_activity: event.status.last_line_observed_at.map(system_time_to_millis),
            },
        };
        let frame = Frame::new("vrchat_status_change", json!(payload));
        for subscriber in self.registry.snapshot() {
            subscriber.try_enqueue(frame.clone());
        }
    }

    /// Heartbeat (§4.7): pings every ACTIVE subscriber, clearing its
    /// alive bit; closes anyone still not-alive from the previous round.
    pub async fn run_heartbeat(self: Arc<Self>, mut stop_rx: tokio::sync::oneshot::Receiver<()>) {
        let mut tick = tokio::time::interval(self.ping_interval);
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => return,
                _ = tick.tick() => {
                    for subscriber in self.registry.snapshot() {
                        let was_alive = subscriber
                            .alive
                            .swap(false, Ordering::Relaxed);
                        if !was_alive {
                            debug!(subscriber_id = %subscriber.id, "closing on heartbeat timeout");
                            self.registry.remove(&subscriber.id);
                            subscriber.try_enqueue(Frame::new(
                                "disconnect",
                                json!(Disconnect {
                                    reason: error_code::HEARTBEAT_TIMEOUT.to_string(),
                                    message: "no pong received".to_string(),
                                    grace_period: None,
                                }),
                            ));
                            continue;
                        }
                        subscriber.try_enqueue(Frame::new("ping", json!({"timestamp": now_millis()})));
                    }
                }
            }
        }
    }
}

fn log_message_payload(record: &ProcessedRecord) -> LogMessage {
    LogMessage {
        id: record.id.clone(),
        timestamp: system_time_to_millis(record.timestamp_observed),
        source: record.source_tag.as_str().to_string(),
        level: record.level.as_str().to_string(),
        raw: record.raw.clone(),
        parsed: record.parsed.as_ref().map(|p| ParsedPayload {
            kind: p.kind.as_str().to_string(),
            fields: p.fields.clone(),
        }),
        metadata: LogMetadata {
            file_path: record.origin.file_path.display().to_string(),
            file_index: record.origin.file_index_in_selection,
        },
    }
}

fn value_to_operand(value: &serde_json::Value) -> Option<FilterOperand> {
    if let Some(s) = value.as_str() {
        return Some(FilterOperand::Single(s.to_string()));
    }
    if let Some(arr) = value.as_array() {
        let strings: Option<Vec<String>> = arr.iter().map(|v| v.as_str().map(String::from)).collect();
        return strings.map(FilterOperand::Many);
    }
    None
}

fn filter_error_frame(action: &str, filter_id: Option<String>, message: &str) -> Frame {
    filter_error_frame_code(action, filter_id, error_code::INVALID_FILTER, message)
}

fn filter_error_frame_code(action: &str, filter_id: Option<String>, code: &str, message: &str) -> Frame {
    Frame::new(
        "filter_response",
        json!(wire::FilterResponse {
            action: action.to_string(),
            success: false,
            filter_id,
            error: Some(WireErrorPayload {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            }),
        }),
    )
}

async fn send_error(writer: &mut tokio::net::tcp::OwnedWriteHalf, code: &str, message: &str) {
    let frame = Frame::new(
        "error",
        json!(WireErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }),
    );
    let _ = wire::write_frame(writer, &frame).await;
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn system_time_to_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "fabric_tests.rs"]
mod tests;
