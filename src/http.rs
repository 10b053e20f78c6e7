//! HTTP API for the project tracker
//!
//! ## Objectives
//! - `GET /objectives?sector=` - Catalog ordered by code
//! - `POST /objectives` - Add an objective
//! - `GET /objectives/{id}`
//!
//! ## Projects
//! - `GET /projects?sector=&province=&status=&limit=&offset=`
//! - `POST /projects`
//! - `GET|PATCH|DELETE /projects/{id}`
//!
//! ## Alignment
//! - `GET /projects/{id}/alignment`
//! - `PUT /projects/{id}/objectives/{objective_id}` - Body `{"weight": 1..5}`
//! - `DELETE /projects/{id}/objectives/{objective_id}`
//!
//! ## Maturity
//! - `GET|PUT /projects/{id}/maturity`
//!
//! ## Phases
//! - `GET|POST /projects/{id}/phases`
//! - `GET|PATCH|DELETE /phases/{id}`
//!
//! ## Alerts and indicators
//! - `GET|POST /projects/{id}/planning-alerts`
//! - `GET /alerts?project_id=`, `POST /alerts`
//! - `GET /indicators`
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X PUT -H "Content-Type: application/json" \
//!      -d '{"weight": 4}' \
//!      http://localhost:8095/projects/p1/objectives/o1
//!
//! curl http://localhost:8095/projects/p1/alignment
//! ```

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::analytics::maturity::MaturityAssessmentInput;
use crate::db::{
    CreateAlertInput, CreateObjectiveInput, CreatePhaseInput, CreatePlanningAlertInput,
    CreateProjectInput, ProjectQuery, UpdatePhaseInput, UpdateProjectInput,
};
use crate::error::TrackerError;
use crate::services::alignment_service::parse_weight;
use crate::services::{
    bad_request, from_created, from_deleted, from_result, internal_error,
    method_not_allowed, not_found, Services,
};
use crate::views::{
    AlertView, AlignmentView, HealthView, IndicatorSummaryView, LinkView, MaturityView,
    ObjectiveView, PhaseView, PlanningAlertView, ProjectView,
};

type HttpResponse = Response<Full<Bytes>>;

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(services: Arc<Services>, bind_addr: SocketAddr) -> Self {
        Self {
            services,
            bind_addr,
        }
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), TrackerError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Read the body, then route on a blocking thread since every handler
    /// goes through the SQLite connection
    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, hyper::Error> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);

        debug!(method = %method, path = %path, "Incoming request");

        let body = match req.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => return Ok(bad_request(&format!("Failed to read body: {}", e))),
        };

        let services = self.services.clone();
        let routed = tokio::task::spawn_blocking(move || {
            route(&services, &method, &path, query.as_deref(), &body)
        })
        .await;

        match routed {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(error = %e, "Request handler failed");
                Ok(internal_error("Request handler failed"))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SectorQuery {
    sector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AlertQuery {
    project_id: Option<String>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TrackerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(TrackerError::InvalidInput("Request body is required".into()));
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T, TrackerError> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| TrackerError::InvalidInput(format!("Invalid query string: {}", e)))
}

fn views<T, V: From<T>>(rows: Vec<T>) -> Vec<V> {
    rows.into_iter().map(V::from).collect()
}

/// Dispatch one request to its service. Synchronous so it can be exercised
/// directly in tests.
pub fn route(
    services: &Services,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> HttpResponse {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (method.clone(), segments.as_slice()) {
        (Method::GET, ["health"]) => from_result(services.db.stats().map(HealthView::from)),

        // Objectives
        (Method::GET, ["objectives"]) => from_result(
            parse_query::<SectorQuery>(query)
                .and_then(|q| services.objectives.list(q.sector.as_deref()))
                .map(views::<_, ObjectiveView>),
        ),
        (Method::POST, ["objectives"]) => from_created(
            parse_body::<CreateObjectiveInput>(body)
                .and_then(|input| services.objectives.create(input))
                .map(ObjectiveView::from),
        ),
        (_, ["objectives"]) => method_not_allowed(),
        (Method::GET, ["objectives", id]) => {
            from_result(services.objectives.get(id).map(ObjectiveView::from))
        }
        (_, ["objectives", _]) => method_not_allowed(),

        // Projects
        (Method::GET, ["projects"]) => from_result(
            parse_query::<ProjectQuery>(query)
                .and_then(|q| services.projects.list(&q))
                .map(views::<_, ProjectView>),
        ),
        (Method::POST, ["projects"]) => from_created(
            parse_body::<CreateProjectInput>(body)
                .and_then(|input| services.projects.create(input))
                .map(ProjectView::from),
        ),
        (_, ["projects"]) => method_not_allowed(),

        (Method::GET, ["projects", id]) => {
            from_result(services.projects.get(id).map(ProjectView::from))
        }
        (Method::PATCH, ["projects", id]) => from_result(
            parse_body::<UpdateProjectInput>(body)
                .and_then(|input| services.projects.update(id, input))
                .map(ProjectView::from),
        ),
        (Method::DELETE, ["projects", id]) => from_deleted(
            services.projects.delete(id),
            &format!("Project not found: {}", id),
        ),
        (_, ["projects", _]) => method_not_allowed(),

        // Alignment
        (Method::GET, ["projects", id, "alignment"]) => {
            from_result(services.alignment.get_alignment(id).map(AlignmentView::from))
        }
        (_, ["projects", _, "alignment"]) => method_not_allowed(),

        (Method::PUT, ["projects", id, "objectives", objective_id]) => from_result(
            parse_body::<serde_json::Value>(body)
                .and_then(|value| parse_weight(value.get("weight")))
                .and_then(|weight| services.alignment.link(id, objective_id, weight))
                .map(LinkView::from),
        ),
        (Method::DELETE, ["projects", id, "objectives", objective_id]) => from_deleted(
            services.alignment.unlink(id, objective_id),
            &format!("Link not found: {} -> {}", id, objective_id),
        ),
        (_, ["projects", _, "objectives", _]) => method_not_allowed(),

        // Maturity
        (Method::GET, ["projects", id, "maturity"]) => {
            from_result(services.maturity.get(id).map(MaturityView::from))
        }
        (Method::PUT, ["projects", id, "maturity"]) => from_result(
            parse_body::<MaturityAssessmentInput>(body)
                .and_then(|input| services.maturity.save(id, input))
                .map(MaturityView::from),
        ),
        (_, ["projects", _, "maturity"]) => method_not_allowed(),

        // Phases
        (Method::GET, ["projects", id, "phases"]) => {
            from_result(services.phases.list(id).map(views::<_, PhaseView>))
        }
        (Method::POST, ["projects", id, "phases"]) => from_created(
            parse_body::<CreatePhaseInput>(body)
                .and_then(|input| services.phases.create(id, input))
                .map(PhaseView::from),
        ),
        (_, ["projects", _, "phases"]) => method_not_allowed(),

        (Method::GET, ["phases", id]) => from_result(services.phases.get(id).map(PhaseView::from)),
        (Method::PATCH, ["phases", id]) => from_result(
            parse_body::<UpdatePhaseInput>(body)
                .and_then(|input| services.phases.update(id, input))
                .map(PhaseView::from),
        ),
        (Method::DELETE, ["phases", id]) => {
            from_deleted(services.phases.delete(id), &format!("Phase not found: {}", id))
        }
        (_, ["phases", _]) => method_not_allowed(),

        // Alerts
        (Method::GET, ["projects", id, "planning-alerts"]) => from_result(
            services
                .alerts
                .list_planning(id)
                .map(views::<_, PlanningAlertView>),
        ),
        (Method::POST, ["projects", id, "planning-alerts"]) => from_created(
            parse_body::<CreatePlanningAlertInput>(body)
                .and_then(|input| services.alerts.create_planning(id, input))
                .map(PlanningAlertView::from),
        ),
        (_, ["projects", _, "planning-alerts"]) => method_not_allowed(),

        (Method::GET, ["alerts"]) => from_result(
            parse_query::<AlertQuery>(query)
                .and_then(|q| services.alerts.list(q.project_id.as_deref()))
                .map(views::<_, AlertView>),
        ),
        (Method::POST, ["alerts"]) => from_created(
            parse_body::<CreateAlertInput>(body)
                .and_then(|input| services.alerts.create(input))
                .map(AlertView::from),
        ),
        (_, ["alerts"]) => method_not_allowed(),

        (Method::GET, ["indicators"]) => {
            from_result(services.indicators.summary().map(IndicatorSummaryView::from))
        }
        (_, ["indicators"]) => method_not_allowed(),

        _ => not_found(&format!("No route for {} {}", method, path)),
    };

    debug!(method = %method, path = %path, status = %response.status(), "Request handled");
    response
}
