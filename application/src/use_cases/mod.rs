//! Use cases (application services)

pub mod dispatch;
pub mod run_turn;
pub mod stream;
pub mod title;
