//! Request handler
//!
//! Turns a gateway event into a pipeline run and the run into an
//! [`ApiResponse`]. When a store is attached, every run that reached the
//! network is persisted; storage failures are logged and reported as
//! `saved: false` but never change the status code.

mod request;
mod response;

pub use request::{RequestError, ScrapeEvent, ScrapeRequest};
pub use response::{ApiResponse, USAGE};

use crate::config::Config;
use crate::fetch::{HttpTransport, Transport};
use crate::pipeline::{FailureReport, Pipeline, PipelineError, ScrapeReport};
use crate::storage::{
    generate_project_id, open_store, PersistedRecord, RecordStatus, ScrapeStore,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

type SharedStore = Mutex<Box<dyn ScrapeStore + Send>>;

#[derive(Debug, Serialize)]
struct SuccessBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    saved: bool,
    data: &'a ScrapeReport,
}

#[derive(Debug, Serialize)]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
    usage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    saved: bool,
    details: &'a FailureReport,
}

/// Serves scrape requests through a [`Pipeline`] and an optional store
pub struct Handler<T = HttpTransport> {
    pipeline: Pipeline<T>,
    store: Option<SharedStore>,
}

impl Handler<HttpTransport> {
    /// Builds a networked handler, opening the store when persistence is enabled
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let handler = Self::new(Pipeline::from_config(config)?);
        if !config.storage.enabled {
            return Ok(handler);
        }

        tracing::info!("Persisting results to {}", config.storage.database_path);
        let store = open_store(Path::new(&config.storage.database_path))?;
        Ok(handler.with_store(store))
    }
}

impl<T: Transport> Handler<T> {
    pub fn new(pipeline: Pipeline<T>) -> Self {
        Self {
            pipeline,
            store: None,
        }
    }

    /// Attaches a store; `user_id` becomes a required parameter
    pub fn with_store(mut self, store: impl ScrapeStore + Send + 'static) -> Self {
        self.store = Some(Mutex::new(Box::new(store)));
        self
    }

    pub fn persistence_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Handles a raw gateway event
    pub async fn handle(&self, event: &ScrapeEvent) -> ApiResponse {
        if event.is_preflight() {
            return ApiResponse::preflight();
        }

        match ScrapeRequest::from_event(event) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!("Rejected request: {}", e);
                ApiResponse::bad_request(e.to_string())
            }
        }
    }

    /// Handles an already parsed request
    ///
    /// # Returns
    ///
    /// * 200 with the scrape report on success
    /// * 400 when the URL is invalid or a required identifier is missing
    /// * 500 when every fetch attempt failed
    pub async fn handle_request(&self, request: ScrapeRequest) -> ApiResponse {
        let user_id = match (&self.store, request.user_id) {
            (Some(_), None) => {
                return ApiResponse::bad_request("Missing user_id parameter");
            }
            (_, user_id) => user_id,
        };
        let project_id = match (&self.store, request.project_id) {
            (Some(_), None) => Some(generate_project_id(
                &mut rand::thread_rng(),
                Utc::now().timestamp(),
            )),
            (_, project_id) => project_id,
        };

        let retries = request
            .retries
            .unwrap_or_else(|| self.pipeline.default_retries());

        let result = self.pipeline.run(&request.url, retries).await;

        let saved = match (&user_id, &project_id) {
            (Some(user_id), Some(project_id)) => self.persist_outcome(user_id, project_id, &result),
            _ => false,
        };

        match result {
            Ok(report) => ApiResponse::ok(&SuccessBody {
                success: true,
                project_id: project_id.as_deref(),
                saved,
                data: &report,
            }),
            Err(PipelineError::Validation(e)) => ApiResponse::bad_request(e.to_string()),
            Err(PipelineError::Fetch(failure)) => ApiResponse::json(
                500,
                &FailureBody {
                    success: false,
                    error: &failure.message,
                    usage: USAGE,
                    project_id: project_id.as_deref(),
                    saved,
                    details: &failure,
                },
            ),
        }
    }

    fn lock_store(&self) -> Option<MutexGuard<'_, Box<dyn ScrapeStore + Send>>> {
        self.store
            .as_ref()
            .map(|store| store.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Writes the outcome of a run; returns whether it was saved
    fn persist_outcome(
        &self,
        user_id: &str,
        project_id: &str,
        result: &Result<ScrapeReport, PipelineError>,
    ) -> bool {
        let record = match result {
            Ok(report) => {
                let payload = match serde_json::to_value(report) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("Failed to serialize report for storage: {}", e);
                        return false;
                    }
                };
                PersistedRecord {
                    user_id: user_id.to_string(),
                    project_id: project_id.to_string(),
                    url: report.metadata.url.clone(),
                    timestamp: report.metadata.timestamp,
                    payload,
                    status: RecordStatus::Success,
                    error_message: None,
                }
            }
            Err(PipelineError::Fetch(failure)) => PersistedRecord {
                user_id: user_id.to_string(),
                project_id: project_id.to_string(),
                url: failure.url.clone(),
                timestamp: Utc::now().timestamp(),
                payload: json!({}),
                status: RecordStatus::Failed,
                error_message: Some(failure.message.clone()),
            },
            // Nothing was fetched
            Err(PipelineError::Validation(_)) => return false,
        };

        let Some(mut store) = self.lock_store() else {
            return false;
        };

        match store.put_record(&record) {
            Ok(()) => {
                tracing::info!(
                    "Saved {} result for {}/{}",
                    record.status.to_db_string(),
                    user_id,
                    project_id
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to save result for {}/{}: {}", user_id, project_id, e);
                false
            }
        }
    }
}
