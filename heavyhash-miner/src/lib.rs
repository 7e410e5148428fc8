//! HeavyHash proof-of-work mining client.
//!
//! Talks to a node over a newline-delimited JSON connection, requests block
//! templates, searches nonces on the CPU, and submits solved blocks.

pub mod config;
pub mod daemon;
pub mod error;
pub mod header;
pub mod miner;
pub mod pow;
pub mod protocol;
pub mod submission;
pub mod tracing;
pub mod transport;
pub mod types;
pub mod u256;
