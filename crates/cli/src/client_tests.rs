// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::*;

/// Spawns a minimal fake daemon that replies `welcome` to any `hello`,
/// then `status` to any `get_status`, then closes.
async fn spawn_fake_daemon() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"hello\""));

        let welcome = json!({
            "type": "welcome",
            "data": {"clientId": "c1", "serverVersion": "0.1.0", "connectedAt": 0, "capabilities": []}
        });
        write_half
            .write_all(format!("{welcome}\n").as_bytes())
            .await
            .unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("get_status"));

        let status = json!({"type": "status", "data": {"uptime": 5, "connectedClients": 1}});
        write_half
            .write_all(format!("{status}\n").as_bytes())
            .await
            .unwrap();
    });

    addr
}

#[tokio::test]
async fn connect_performs_hello_welcome_handshake_then_gets_status() {
    let addr = spawn_fake_daemon().await;
    let mut client = DaemonClient::connect(addr, "test-client")
        .await
        .expect("handshake should succeed");

    let status = client.get_status().await.expect("status request should succeed");
    assert_eq!(status["uptime"], 5);
    assert_eq!(status["connectedClients"], 1);
}

#[tokio::test]
async fn connect_to_nothing_fails() {
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 1));
    let result = DaemonClient::connect(addr, "test-client").await;
    assert!(result.is_err());
}
