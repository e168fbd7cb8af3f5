//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_store;
pub mod council_config;
pub mod model_gateway;
pub mod progress;
pub mod search_provider;
