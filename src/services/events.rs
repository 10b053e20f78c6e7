//! Domain event bus
//!
//! Every write performed by a service is broadcast here. The logging
//! listener turns the stream into the audit trail of who changed what.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::models::{AlertType, Severity};

/// Events emitted by services after a successful write
#[derive(Debug, Clone)]
pub enum DomainEvent {
    // Projects
    ProjectCreated {
        id: String,
        title: String,
    },
    ProjectUpdated {
        id: String,
        fields: Vec<String>,
    },
    ProjectDeleted {
        id: String,
    },

    // Objectives and links
    ObjectiveCreated {
        id: String,
        code: String,
    },
    ObjectiveLinked {
        project_id: String,
        objective_id: String,
        weight: u8,
    },
    ObjectiveUnlinked {
        project_id: String,
        objective_id: String,
    },

    AssessmentSaved {
        project_id: String,
        score: u32,
    },

    // Phases
    PhaseCreated {
        id: String,
        project_id: String,
    },
    PhaseUpdated {
        id: String,
        project_id: String,
    },
    PhaseDeleted {
        id: String,
    },

    // Alerts
    PlanningAlertCreated {
        id: String,
        project_id: String,
        alert_type: AlertType,
        severity: Severity,
    },
    AlertCreated {
        id: String,
        project_id: String,
        severity: Severity,
    },
}

pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &DomainEvent);
}

/// Broadcast bus shared by all services
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: DomainEvent) {
        trace!(event = ?event, "Emitting domain event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes each event to the log as an audit record
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &DomainEvent) {
        match event {
            DomainEvent::ProjectCreated { id, title } => {
                info!(id = %id, title = %title, "Project created");
            }
            DomainEvent::ProjectUpdated { id, fields } => {
                info!(id = %id, fields = ?fields, "Project updated");
            }
            DomainEvent::ProjectDeleted { id } => {
                info!(id = %id, "Project deleted");
            }
            DomainEvent::ObjectiveLinked {
                project_id,
                objective_id,
                weight,
            } => {
                debug!(
                    project = %project_id,
                    objective = %objective_id,
                    weight = weight,
                    "Objective linked"
                );
            }
            DomainEvent::AssessmentSaved { project_id, score } => {
                debug!(project = %project_id, score = score, "Maturity assessment saved");
            }
            DomainEvent::PlanningAlertCreated {
                id,
                project_id,
                alert_type,
                severity,
            } => {
                info!(
                    id = %id,
                    project = %project_id,
                    alert_type = %alert_type,
                    severity = %severity,
                    "Planning alert logged"
                );
            }
            _ => {
                trace!(event = ?event, "Domain event");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
