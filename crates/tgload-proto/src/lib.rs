//! Shared types for tgload: TDLib wire objects, configuration and paths.

pub mod config;
pub mod platform;
pub mod protocol;
