// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use vrlog_core::{parser::parse, RawLine};

use super::*;
use crate::supervisor::StatusCell;

fn sequential_id() -> Arc<dyn Fn() -> String + Send + Sync> {
    let counter = Arc::new(AtomicU64::new(0));
    Arc::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        format!("sub-{n}")
    })
}

async fn spawn_fabric(max_clients: usize) -> (Arc<BroadcastFabric>, std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().unwrap();
    let config = FabricConfig {
        bind_addr: addr,
        max_clients,
        ping_interval: Duration::from_secs(30),
    };
    let fabric = Arc::new(BroadcastFabric::new(&config, Arc::new(StatusCell::new()), sequential_id()));
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(Arc::clone(&fabric).run_acceptor(listener, stop_rx));
    (fabric, addr, stop_tx)
}

async fn handshake(addr: std::net::SocketAddr, name: &str) -> (BufReader<tokio::net::tcp::OwnedReadHalf>, tokio::net::tcp::OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let hello = format!("{{\"type\":\"hello\",\"data\":{{\"clientName\":\"{name}\"}}}}\n");
    write_half.write_all(hello.as_bytes()).await.unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.contains("\"welcome\""), "expected welcome, got {line}");

    (reader, write_half)
}

#[tokio::test]
async fn handshake_then_receives_published_record() {
    let (fabric, addr, _stop) = spawn_fabric(4).await;
    let (mut reader, _write) = handshake(addr, "tester").await;

    let raw = RawLine::new(
        "2025.6.30 15:30:15 Debug - [Behaviour] Joining wrld_abc123~private(usr_def456)~region(jp)",
        std::path::PathBuf::from("output_log_2025-06-30_15-30-10.txt"),
    );
    let record = parse(&raw, "rec-1".to_string(), 0).expect("parses");
    fabric.publish(&record);

    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line))
        .await
        .expect("timed out")
        .unwrap();
    assert!(line.contains("log_message"));
    assert!(line.contains("world_change"));
}

#[tokio::test]
async fn third_connection_rejected_at_cap() {
    let (_fabric, addr, _stop) = spawn_fabric(2).await;
    let (_r1, _w1) = handshake(addr, "a").await;
    let (_r2, _w2) = handshake(addr, "b").await;

    let stream = TcpStream::connect(addr).await.expect("connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    write_half
        .write_all(b"{\"type\":\"hello\",\"data\":{\"clientName\":\"c\"}}\n")
        .await
        .unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.contains("connection_limit"), "expected rejection, got {line}");
}

#[tokio::test]
async fn filter_by_level_in_list_receives_only_matching_records() {
    let (fabric, addr, _stop) = spawn_fabric(4).await;
    let (mut reader, mut write) = handshake(addr, "filterer").await;

    let add_filter = json!({
        "type": "add_filter",
        "data": {
            "id": "f1",
            "type": "level",
            "condition": {"operator": "in", "value": ["error", "warning"]}
        }
    });
    write
        .write_all(format!("{}\n", add_filter).as_bytes())
        .await
        .unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.contains("filter_response"));
    assert!(line.contains("\"success\":true"));

    let levels = ["Log", "Warning", "Error", "Log"];
    for (i, level) in levels.iter().enumerate() {
        let text = format!("2025.6.30 15:3{i}:00 {level} - something happened");
        let raw = RawLine::new(text, std::path::PathBuf::from("output_log_2025-06-30_15-30-10.txt"));
        let record = parse(&raw, format!("rec-{i}"), 0).expect("parses");
        fabric.publish(&record);
    }

    let mut received = Vec::new();
    for _ in 0..2 {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line))
            .await
            .expect("timed out")
            .unwrap();
        received.push(line);
    }
    assert!(received[0].contains("\"level\":\"warning\""));
    assert!(received[1].contains("\"level\":\"error\""));
}
