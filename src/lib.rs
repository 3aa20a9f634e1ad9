//! Longitudinal collection library for a public video platform's metadata
//! API: discovery, trending capture, full-history video enumeration, daily
//! and weekly panel snapshots, and the health/validation/digest tooling that
//! watches over all of it.

pub mod checkpoint;
pub mod config;
pub mod csv_writer;
pub mod digest;
pub mod discovery;
pub mod duration;
pub mod errors;
pub mod extras;
pub mod health;
pub mod inventory;
pub mod logging;
pub mod model;
pub mod panel;
pub mod pass_generator;
pub mod provider;
pub mod sweep;
pub mod taxonomy;
pub mod trending;
