//! PAG Tracker - alignment, maturity and phase analytics for public projects
//!
//! Tracks government projects against the national action plan (PAG)
//! objectives and serves derived scores over a JSON HTTP API.
//!
//! ## Architecture
//!
//! - **db**: SQLite repositories for objectives, projects, links, phases,
//!   assessments and alerts
//! - **analytics**: pure scoring functions (alignment, maturity, phase
//!   progress, dashboard indicators), recomputed on every read
//! - **services**: validation, existence checks and audit events
//! - **http**: hyper server and router
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/pag-tracker/
//! ├── tracker.db     # SQLite database (WAL mode)
//! └── config.toml    # Configuration
//! ```

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod views;

// Re-exports
pub use config::Config;
pub use db::Database;
pub use error::TrackerError;
pub use http::HttpServer;
pub use services::Services;
