//! Raw TCP transport for the agent-check protocol.

pub mod agent_listener;

pub use agent_listener::AgentListener;
