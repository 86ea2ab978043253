//! Shared test utilities for the kwiz-sync workspace.
//!
//! This crate provides standardised fixtures so that crate test suites do
//! not each build their own sample data. It is a dev-dependency only and
//! never published.
//!
//! # Modules
//!
//! - [`fixtures`]: sample questions, achievements and full snapshots
//! - [`faulty`]: [`FaultyStore`], a store that fails on demand
//! - [`sandbox`]: [`SyncSandbox`], file-backed stores in a temp directory

pub mod faulty;
pub mod fixtures;
pub mod sandbox;

pub use faulty::FaultyStore;
pub use sandbox::SyncSandbox;
