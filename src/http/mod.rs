//! HTTP status API.
//!
//! # Endpoints
//! - `GET /health` — liveness of the sidecar itself, always 200
//! - `GET /about/health`, `GET /signal/health` — `OK`/`NOT_OK` summary
//! - `GET /signal/report` — full report JSON, 200/503 by reported health
//! - `GET /signal/census` — census JSON (only when census polling is on)

pub mod handlers;
pub mod server;

pub use server::HttpServer;
