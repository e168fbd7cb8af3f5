//! Conversations persisted between turns.

pub mod entities;
