//! # countdown-store
//!
//! Local storage for countdowns and the snapshot pipeline that keeps
//! companion processes fed.
//!
//! The crate exposes a synchronous `Database` handle (the primary store),
//! the shared-container bridge, the snapshot projector and the companion
//! read adapter.

pub mod bridge;
pub mod companion;
pub mod config;
pub mod countdowns;
pub mod database;
pub mod migrations;
pub mod projection;
pub mod repository;

mod error;

pub use bridge::SharedContainer;
pub use companion::{CompanionEntity, CompanionReader};
pub use config::StorageConfig;
pub use database::Database;
pub use error::{Result, StoreError};
pub use projection::{ProjectionEntry, ProjectionService};
pub use repository::{import_shared, CountdownRepository};
