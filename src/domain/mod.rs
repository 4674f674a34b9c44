//! Core domain types and logic.

pub mod error;
pub mod timeframe;
pub mod schema;
pub mod record;
pub mod layer;
pub mod registry;
pub mod resolver;
pub mod shared;
pub mod symbols;
pub mod builtin;
pub mod preset_loader;
