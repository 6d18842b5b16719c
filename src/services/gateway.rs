use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::dto::exam_dto::{GenerateExamRequest, SaveExamRequest, SubmitAnswersRequest};
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::result::ExamResult;

#[cfg(test)]
use mockall::automock;

/// The remote EduTrack API, as seen by the exam workflow. Persistence and
/// scoring live entirely behind these calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExamGateway: Send + Sync {
    async fn fetch_exam(&self, exam_id: Uuid) -> Result<Exam>;
    async fn create_exam(&self, payload: SaveExamRequest) -> Result<Exam>;
    async fn update_exam(&self, exam_id: Uuid, payload: SaveExamRequest) -> Result<Exam>;
    async fn submit_answers(
        &self,
        exam_id: Uuid,
        payload: SubmitAnswersRequest,
    ) -> Result<ExamResult>;
    async fn generate_exam(&self, payload: GenerateExamRequest) -> Result<Exam>;
}

#[derive(Clone)]
pub struct ExamApiService {
    client: Client,
    base_url: Url,
}

impl ExamApiService {
    pub fn new(mut base_url: Url, client: Client) -> Self {
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExamGateway for ExamApiService {
    async fn fetch_exam(&self, exam_id: Uuid) -> Result<Exam> {
        let response = self
            .client
            .get(self.endpoint(&format!("exams/{}", exam_id))?)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn create_exam(&self, payload: SaveExamRequest) -> Result<Exam> {
        info!(
            "Creating exam '{}' with {} questions",
            payload.title,
            payload.questions.len()
        );
        let response = self
            .client
            .post(self.endpoint("exams")?)
            .json(&payload)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn update_exam(&self, exam_id: Uuid, payload: SaveExamRequest) -> Result<Exam> {
        info!(
            "Updating exam {} with {} questions",
            exam_id,
            payload.questions.len()
        );
        let response = self
            .client
            .patch(self.endpoint(&format!("exams/{}", exam_id))?)
            .json(&payload)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn submit_answers(
        &self,
        exam_id: Uuid,
        payload: SubmitAnswersRequest,
    ) -> Result<ExamResult> {
        info!(
            "Submitting {} answers for exam {}",
            payload.answers.len(),
            exam_id
        );
        let response = self
            .client
            .post(self.endpoint(&format!("exams/{}/submit", exam_id))?)
            .json(&payload)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn generate_exam(&self, payload: GenerateExamRequest) -> Result<Exam> {
        info!("Requesting generated exam for subject '{}'", payload.subject);
        let response = self
            .client
            .post(self.endpoint("exams/generate")?)
            .json(&payload)
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_join_keeps_full_path() {
        let service = ExamApiService::new(
            Url::parse("http://localhost:8000/api").unwrap(),
            Client::new(),
        );
        let url = service.endpoint("exams/generate").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/exams/generate");
    }
}
