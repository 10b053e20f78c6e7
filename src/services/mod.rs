//! Service layer for pag-tracker
//!
//! Services sit between the HTTP router and the repositories. Each one
//! wraps database operations with:
//! - Input validation (rejected before anything is written)
//! - Existence checks on referenced rows
//! - Event emission for the audit trail
//!
//! ## Architecture
//!
//! ```text
//! HTTP router (thin)
//!     ↓
//! Service Layer (validation, events)
//!     ↓
//! Repository Layer (db/*.rs) + analytics (pure scoring)
//!     ↓
//! SQLite Database
//! ```

pub mod response;
pub mod events;
pub mod project_service;
pub mod objective_service;
pub mod alignment_service;
pub mod maturity_service;
pub mod phase_service;
pub mod alert_service;
pub mod indicator_service;

pub use response::*;
pub use events::{spawn_logging_listener, DomainEvent, EventBus, EventListener};
pub use project_service::ProjectService;
pub use objective_service::ObjectiveService;
pub use alignment_service::AlignmentService;
pub use maturity_service::MaturityService;
pub use phase_service::{PhaseService, TrackedPhase};
pub use alert_service::AlertService;
pub use indicator_service::{IndicatorService, IndicatorSettings, IndicatorSummary};

use crate::config::Config;
use crate::db::Database;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds all services sharing one database handle and one event bus.
pub struct Services {
    pub db: Arc<Database>,
    pub projects: Arc<ProjectService>,
    pub objectives: Arc<ObjectiveService>,
    pub alignment: Arc<AlignmentService>,
    pub maturity: Arc<MaturityService>,
    pub phases: Arc<PhaseService>,
    pub alerts: Arc<AlertService>,
    pub indicators: Arc<IndicatorService>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all services with default indicator settings
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_settings(db, IndicatorSettings::default())
    }

    pub fn from_config(db: Arc<Database>, config: &Config) -> Self {
        Self::with_settings(db, IndicatorSettings::from(config))
    }

    pub fn with_settings(db: Arc<Database>, settings: IndicatorSettings) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            projects: Arc::new(ProjectService::new(db.clone(), events.clone())),
            objectives: Arc::new(ObjectiveService::new(db.clone(), events.clone())),
            alignment: Arc::new(AlignmentService::new(db.clone(), events.clone())),
            maturity: Arc::new(MaturityService::new(db.clone(), events.clone())),
            phases: Arc::new(PhaseService::new(db.clone(), events.clone())),
            alerts: Arc::new(AlertService::new(db.clone(), events.clone())),
            indicators: Arc::new(IndicatorService::new(db.clone(), settings)),
            db,
            events,
        }
    }
}
