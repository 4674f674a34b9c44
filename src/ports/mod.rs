//! Port traits the domain reads its inputs through.

pub mod config_port;
