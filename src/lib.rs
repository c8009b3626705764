//! Signal node health sidecar.
//!
//! Sits next to a conferencing-signal node, continuously determines whether
//! the node is fit to receive traffic, and reports that fitness to a load
//! balancer over two channels: an HTTP status API and the haproxy text
//! agent-check protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                 SIGNAL SIDECAR                 │
//!                      │                                                │
//!   focus /health  ◀───┼─ probe ─┐                                      │
//!   focus /stats   ◀───┼─ probe ─┤  ┌───────────┐    ┌───────────────┐  │
//!   xmpp /http-bind ◀──┼─ probe ─┼─▶│ collector │───▶│   snapshot    │  │
//!   status file    ◀───┼─ probe ─┘  │  (timer)  │    │ + hysteresis  │  │
//!                      │            └───────────┘    └───────┬───────┘  │
//!   xmpp /room-census ◀┼─ census timer ─▶ census state       │          │
//!                      │                                     ▼          │
//!   LB HTTP check  ────┼─▶ http server ──▶ ┌─────────────────────────┐  │
//!   LB agent check ────┼─▶ tcp listener ─▶ │ flap-mitigation overlay │  │
//!                      │                   │  → weight → agent line  │  │
//!                      │                   └─────────────────────────┘  │
//!                      └────────────────────────────────────────────────┘
//! ```
//!
//! Raw probe results are decoupled from what the load balancer sees: every
//! inbound request re-evaluates the overlay against the current wall clock,
//! so hysteresis windows close in real time between polls.

// Core subsystems
pub mod collector;
pub mod config;
pub mod overlay;
pub mod probe;

// Transports
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use collector::state::SidecarState;
pub use config::SidecarConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
