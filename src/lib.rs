// src/lib.rs
//! Client-side plumbing for ledger dApps: resolve the connected account,
//! read on-ledger state through the gateway, build and audit transaction
//! manifests, hand them to the wallet and report the outcome.

pub mod blockchain;
pub mod cli;
pub mod core;
pub mod manifest;
// Monitoring module
pub mod monitoring;
pub mod service;
