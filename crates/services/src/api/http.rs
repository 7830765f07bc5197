use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;
use tutor_core::model::{ImageRef, Step, Submission};
use url::Url;

use super::wire::{
    AnswerRequest, HealthResponse, ProblemEnvelope, TextProblemRequest, ValidationEnvelope,
    error_detail,
};
use super::{Grading, ProblemBreakdown, TutorApi};
use crate::config::TutorConfig;
use crate::error::ApiError;

const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";
const PROBLEM_IMAGE_FIELD: &str = "file";
const ANSWER_IMAGE_FIELD: &str = "answer_image";

/// `reqwest`-backed client for the tutor service.
#[derive(Clone, Debug)]
pub struct HttpTutorClient {
    client: Client,
    base_url: Url,
}

impl HttpTutorClient {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn from_config(config: &TutorConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Check that the service root answers, returning its banner message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the status is not 2xx.
    pub async fn ping(&self) -> Result<Option<String>, ApiError> {
        let url = self.endpoint("");
        debug!(%url, "pinging tutor service");
        let response = self.client.get(url).send().await?;
        let health: HealthResponse = decode(response).await?;
        Ok(health.message)
    }
}

#[async_trait]
impl TutorApi for HttpTutorClient {
    async fn submit_problem(&self, input: &Submission) -> Result<ProblemBreakdown, ApiError> {
        let response = match input.image_ref() {
            Some(image) => {
                let url = self.endpoint("process-image-problem");
                debug!(%url, "submitting image problem");
                let mut form = Form::new().part(PROBLEM_IMAGE_FIELD, image_part(image).await?);
                if let Some(text) = input.answer_text() {
                    form = form.text("problem", text.to_owned());
                }
                self.client.post(url).multipart(form).send().await?
            }
            None => {
                let url = self.endpoint("process-text-problem");
                debug!(%url, "submitting text problem");
                let problem = input.answer_text().unwrap_or_default();
                self.client
                    .post(url)
                    .json(&TextProblemRequest { problem })
                    .send()
                    .await?
            }
        };

        let envelope: ProblemEnvelope = decode(response).await?;
        envelope.into_breakdown(input.answer_text())
    }

    async fn grade_answer(&self, step: &Step, answer: &Submission) -> Result<Grading, ApiError> {
        let url = self.endpoint("validate-answer");
        let request = self.client.post(url.as_str());
        let response = match answer.image_ref() {
            Some(image) => {
                debug!(%url, "submitting image answer");
                let step_data = serde_json::to_string(step)
                    .map_err(|err| ApiError::Malformed(err.to_string()))?;
                let mut form = Form::new().text("step_data", step_data);
                if let Some(text) = answer.answer_text() {
                    form = form.text("answer", text.to_owned());
                }
                form = form.part(ANSWER_IMAGE_FIELD, image_part(image).await?);
                request.multipart(form).send().await?
            }
            None => {
                debug!(%url, "submitting text answer");
                request
                    .json(&AnswerRequest {
                        step_data: step,
                        answer: answer.answer_text(),
                    })
                    .send()
                    .await?
            }
        };

        let envelope: ValidationEnvelope = decode(response).await?;
        envelope.into_grading()
    }
}

/// Content type for an uploaded image, inferred from its extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map_or_else(|| DEFAULT_IMAGE_TYPE.to_string(), |mime| mime.essence_str().to_owned())
}

async fn image_part(image: &ImageRef) -> Result<Part, ApiError> {
    let file_name = image.file_name();
    let bytes = match image {
        ImageRef::File(path) => tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::Image {
                path: path.clone(),
                source,
            })?,
        ImageRef::Inline { bytes, .. } => bytes.clone(),
    };
    let content_type = content_type_for(&file_name);
    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(&content_type)?)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::HttpStatus {
            status,
            detail: error_detail(&body),
        });
    }
    serde_json::from_slice(&body).map_err(|err| ApiError::Malformed(err.to_string()))
}
