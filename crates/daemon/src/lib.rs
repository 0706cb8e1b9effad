// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vrlog daemon library: the Source Supervisor, Subscriber Registry,
//! Broadcast Fabric, and wire protocol shared between the daemon binary
//! and its tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod fabric;
pub mod lifecycle;
pub mod registry;
pub mod subscriber;
pub mod supervisor;
pub mod wire;

pub use fabric::{BroadcastFabric, FabricConfig, FabricCounters, SERVER_VERSION};
pub use lifecycle::{startup, Config, DaemonState, LifecycleError, StartupResult};
pub use registry::{RejectReason, SubscriberRegistry};
pub use subscriber::Subscriber;
pub use supervisor::{
    SourceSupervisor, StatusCell, StatusChangeEvent, StatusChangeType, SupervisorConfig,
    SupervisorState,
};
