//! Output formatting for council turns

pub mod console;
pub mod transcript;
