//! Student Roster - authentication and role-based access for a student roster
//!
//! This library provides credential checking, cookie sessions, role
//! authorization and the student record operations behind them, plus the
//! warp routes that expose them over HTTP.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod roster;
pub mod security;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
