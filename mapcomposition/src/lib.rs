//! MapComposition - on-the-fly project composition for geospatial servers.
//!
//! Builds or updates a project file from a list of data source URIs: one
//! layer per source, default styling, name-keyed reconciliation against the
//! existing layer collection, WFS/WCS exposure bookkeeping, legend images on
//! disk. The HTTP front-end dispatches OGC-style `SERVICE=` requests to the
//! registered services; the CLI crate wraps the same pipeline for one-shot
//! use.

pub mod compose;
pub mod config;
pub mod engine;
pub mod layer;
pub mod legend;
pub mod logging;
pub mod project;
pub mod server;
pub mod service;
pub mod source;

/// Crate version, for banners and service metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
