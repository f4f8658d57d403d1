#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Minimal JSON client for the cluster API server.
//!
//! Token reviews, subject access reviews and secret reads all go through a
//! [`ClusterClient`] configured from [`ClusterConfig`].

pub mod client;
pub mod config;
pub mod error;

pub use client::ClusterClient;
pub use config::ClusterConfig;
pub use error::ClusterError;
