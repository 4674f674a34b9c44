//! Concrete implementations of port traits.

pub mod file_config_adapter;
