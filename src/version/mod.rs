//! Release registry for every distribution channel
//!
//! This module tracks the releases each channel publishes, persists them per
//! channel, and keeps the stores current through the refresh strategies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Fetcher   │────▶│  Pipeline   │────▶│ Repository  │
//! │  (remote)   │     │  (merge)    │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Registries  │     │Materializer │
//! │(hub,snap..) │     │ (archives)  │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`model`]: Version records, one variant per channel
//! - [`number`]: Dotted-numeric ordering
//! - [`repository`]: JSON-backed per-channel store
//! - [`pipeline`]: Incremental, replace-one and revamp strategies
//! - [`fetcher`]: Fetcher trait for remote listings
//! - [`registries`]: Concrete fetchers (Docker Hub, Snapcraft, GitHub, Chocolatey)
//! - [`materializer`]: On-disk artifacts behind a record
//! - [`extractor`]: Gemfile archives pulled from release images
//! - [`error`]: Error types for storage, fetch and refresh
//! - [`types`]: The `Channel` enum

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod materializer;
pub mod model;
pub mod number;
pub mod pipeline;
pub mod registries;
pub mod repository;
pub mod timestamp;
pub mod types;
