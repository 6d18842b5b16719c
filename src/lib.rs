pub mod config;
pub mod delivery;
pub mod dto;
pub mod editor;
pub mod error;
pub mod models;
pub mod results;
pub mod services;
pub mod stats;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::delivery::DeliverySession;
use crate::dto::exam_dto::GenerateExamRequest;
use crate::editor::ExamEditor;
use crate::error::Result;
use crate::models::exam::Exam;
use crate::services::events::{EventSink, LogSink};
use crate::services::gateway::{ExamApiService, ExamGateway};

/// Wires the configuration, the shared HTTP client, and the event sink into
/// the entry points of the exam workflow.
#[derive(Clone)]
pub struct ExamApp {
    pub config: Config,
    gateway: Arc<dyn ExamGateway>,
    sink: Arc<dyn EventSink>,
}

impl ExamApp {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        let base_url = Url::parse(&config.api_base_url)?;
        let gateway = Arc::new(ExamApiService::new(base_url, http_client));

        Ok(Self {
            config,
            gateway,
            sink: Arc::new(LogSink),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Replaces the default log sink, e.g. with the embedding UI's toast
    /// bridge.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn gateway(&self) -> Arc<dyn ExamGateway> {
        self.gateway.clone()
    }

    /// Editor over a fresh, never-saved draft.
    pub fn blank_editor(&self) -> ExamEditor {
        ExamEditor::blank(self.gateway.clone(), self.sink.clone())
    }

    /// Editor over an already-loaded exam.
    pub fn edit(&self, exam: Exam) -> ExamEditor {
        ExamEditor::from_existing(exam, self.gateway.clone(), self.sink.clone())
    }

    /// Fetches an exam and opens an editor on it.
    pub async fn open_editor(&self, exam_id: Uuid) -> Result<ExamEditor> {
        let exam = self.gateway.fetch_exam(exam_id).await?;
        Ok(self.edit(exam))
    }

    /// Starts a timed delivery session over a published exam. The caller
    /// decides when to attach a `SessionTimer`.
    pub fn start_delivery(&self, exam: Exam) -> Result<Arc<Mutex<DeliverySession>>> {
        let session = DeliverySession::new(
            exam,
            self.config.seconds_per_question,
            self.gateway.clone(),
            self.sink.clone(),
        )?;
        Ok(Arc::new(Mutex::new(session)))
    }

    /// Requests a generated exam from the backend.
    pub async fn generate_exam(&self, request: GenerateExamRequest) -> Result<Exam> {
        self.gateway.generate_exam(request).await
    }
}
