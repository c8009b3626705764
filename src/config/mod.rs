//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, invariant auto-correction)
//!     → SidecarConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the sidecar runs with no config file at all
//! - The drain-grace/dampening ordering invariant is corrected, not fatal

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::SidecarConfig;
pub use schema::{HealthConfig, UpstreamConfig, WeightConfig};
