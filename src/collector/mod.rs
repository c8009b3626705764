//! Polling subsystem.
//!
//! # Data Flow
//! ```text
//! health.rs (fixed timer):
//!     fan out probes → HealthSnapshot
//!     → state.rs (atomic publish + hysteresis update)
//!
//! census.rs (fixed timer):
//!     poll room census → CensusState
//!     → state.rs (atomic publish, stale-but-available on failure)
//!
//! Readers (HTTP/TCP handlers):
//!     state.rs → overlay::evaluate (per request, against the wall clock)
//! ```
//!
//! # Design Decisions
//! - One in-flight cycle per loop; no locks needed for writers
//! - Hysteresis is updated only by the health loop, right after a cycle

pub mod census;
pub mod health;
pub mod state;

pub use census::CensusCollector;
pub use health::HealthCollector;
