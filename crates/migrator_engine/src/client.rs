use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use migrator_logging::{job_debug, job_info};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Serialize;

use crate::{FailureKind, JobId, SubmitError, SubmitMetadata, SubmitOutput};

/// Route and port the conversion service listens on by default.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/process-github";

#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Whole-request timeout. Conversions can run for minutes, so none by default.
    pub request_timeout: Option<Duration>,
    pub max_bytes: Option<u64>,
    pub user_agent: String,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_bytes: None,
            user_agent: format!("repo-migrator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Serialize)]
struct MigrationRequestBody<'a> {
    #[serde(rename = "githubUrl")]
    github_url: &'a str,
}

/// Remote conversion service boundary.
#[async_trait::async_trait]
pub trait MigrationClient: Send + Sync {
    /// Issue exactly one request for `repository_url` and return the packaged result.
    async fn submit(&self, job_id: JobId, repository_url: &str)
        -> Result<SubmitOutput, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestMigrationClient {
    settings: SubmitSettings,
}

impl ReqwestMigrationClient {
    pub fn new(settings: SubmitSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, SubmitError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .user_agent(self.settings.user_agent.clone());
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| SubmitError::new(FailureKind::Network, err.to_string()))
    }

    fn check_size(&self, actual: u64) -> Result<(), SubmitError> {
        match self.settings.max_bytes {
            Some(max_bytes) if actual > max_bytes => Err(SubmitError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(actual),
                },
                "response too large",
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl MigrationClient for ReqwestMigrationClient {
    async fn submit(
        &self,
        job_id: JobId,
        repository_url: &str,
    ) -> Result<SubmitOutput, SubmitError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| SubmitError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
        let body = serde_json::to_vec(&MigrationRequestBody {
            github_url: repository_url,
        })
        .map_err(|err| SubmitError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let client = self.build_client()?;

        job_info!("Job {} POST {} ({} byte body)", job_id, endpoint, body.len());
        let response = client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            self.check_size(content_len)?;
        }

        let content_type = header_string(&response, CONTENT_TYPE);
        let server_filename =
            header_string(&response, CONTENT_DISPOSITION).and_then(|v| disposition_filename(&v));

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            self.check_size(bytes.len() as u64 + chunk.len() as u64)?;
            bytes.extend_from_slice(&chunk);
        }
        job_debug!("Job {} received {} bytes", job_id, bytes.len());

        let metadata = SubmitMetadata {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            content_type,
            server_filename,
            byte_len: bytes.len() as u64,
        };

        Ok(SubmitOutput {
            bytes: Bytes::from(bytes),
            metadata,
        })
    }
}

fn header_string(
    response: &reqwest::Response,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Extract `filename=` from a `Content-Disposition` value.
fn disposition_filename(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn map_reqwest_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        return SubmitError::new(FailureKind::Timeout, err.to_string());
    }
    SubmitError::new(FailureKind::Network, err.to_string())
}
