// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vrlog - admin client for the vrlog relay daemon

mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(name = "vrlog", version, about = "Admin client for the vrlog relay daemon")]
struct Cli {
    /// Daemon port to connect to
    #[arg(long, global = true, default_value_t = default_port())]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

fn default_port() -> u16 {
    std::env::var("VRLOG_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7913)
}

#[derive(Subcommand)]
enum Commands {
    /// Print daemon status (uptime, connected clients, VRChat process state)
    Status,
    /// Print daemon throughput metrics
    Metrics,
    /// Stream log messages as they are published, until interrupted
    Watch,
    /// Manage subscription filters for this connection
    #[command(subcommand)]
    Filter(FilterCommands),
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Add a filter clause
    Add {
        /// Filter id, used later to remove it
        id: String,
        /// Dimension to filter on
        #[arg(value_enum)]
        dimension: Dimension,
        /// Comparison operator
        #[arg(value_enum)]
        operator: Operator,
        /// Value(s) to compare against. Repeat for an `in` list.
        value: Vec<String>,
        /// Match case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Remove a filter clause by id
    Remove {
        /// Filter id to remove
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Dimension {
    Level,
    Source,
    Content,
    Regex,
}

impl Dimension {
    fn as_wire(self) -> &'static str {
        match self {
            Dimension::Level => "level",
            Dimension::Source => "source",
            Dimension::Content => "content",
            Dimension::Regex => "regex",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Operator {
    Equals,
    Contains,
    Regex,
    In,
}

impl Operator {
    fn as_wire(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::Regex => "regex",
            Operator::In => "in",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], cli.port));

    match cli.command {
        Commands::Status => {
            let mut client = DaemonClient::connect(addr, "vrlog-cli")
                .await
                .context("connecting to vrlogd")?;
            let status = client.get_status().await?;
            print_json(&status);
        }
        Commands::Metrics => {
            let mut client = DaemonClient::connect(addr, "vrlog-cli")
                .await
                .context("connecting to vrlogd")?;
            let metrics = client.get_metrics().await?;
            print_json(&metrics);
        }
        Commands::Watch => {
            let mut client = DaemonClient::connect(addr, "vrlog-cli")
                .await
                .context("connecting to vrlogd")?;
            loop {
                let frame = client.recv_frame_unbounded().await?;
                if frame.kind == "log_message" {
                    if let Some(data) = &frame.data {
                        print_json(data);
                    }
                }
            }
        }
        Commands::Filter(FilterCommands::Add {
            id,
            dimension,
            operator,
            value,
            case_sensitive,
        }) => {
            let mut client = DaemonClient::connect(addr, "vrlog-cli")
                .await
                .context("connecting to vrlogd")?;
            let value = match value.len() {
                0 => anyhow::bail!("filter add requires at least one value"),
                1 => Value::String(value.into_iter().next().expect("checked len == 1")),
                _ => Value::Array(value.into_iter().map(Value::String).collect()),
            };
            let response = client
                .add_filter(&id, dimension.as_wire(), operator.as_wire(), value, case_sensitive)
                .await?;
            print_json(&response);
        }
        Commands::Filter(FilterCommands::Remove { id }) => {
            let mut client = DaemonClient::connect(addr, "vrlog-cli")
                .await
                .context("connecting to vrlogd")?;
            let response = client.remove_filter(&id).await?;
            print_json(&response);
        }
    }

    Ok(())
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}
