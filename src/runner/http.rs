//! HTTP job runner adapter
//!
//! Talks to a REST execution service:
//! - `POST {base}/jobs/{name}/runs` with `{"parameters": {...}}` returns
//!   `{"run_id": "..."}`; HTTP 429 means the concurrent-run limit is hit.
//! - `GET {base}/jobs/{name}/runs/{id}` returns `{"state": "RUNNING"}`.

use super::JobRunner;
use crate::error::{Error, Result};
use crate::types::RunState;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP job runner
#[derive(Debug, Clone)]
pub struct HttpJobRunnerConfig {
    /// Base URL of the execution service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl HttpJobRunnerConfig {
    /// Create a config with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Job runner over a REST execution service
#[derive(Debug)]
pub struct HttpJobRunner {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct StartRequest<'a> {
    parameters: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct StartResponse {
    run_id: String,
}

#[derive(Deserialize)]
struct PollResponse {
    state: String,
}

impl HttpJobRunner {
    /// Create a runner from its configuration.
    ///
    /// The base URL is validated here so a malformed endpoint fails at
    /// wiring time instead of on the first start call.
    pub fn new(config: HttpJobRunnerConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("cdc-orchestrator/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn runs_url(&self, job_name: &str) -> String {
        format!("{}/jobs/{job_name}/runs", self.base_url)
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn start(&self, job_name: &str, parameters: &HashMap<String, String>) -> Result<String> {
        let url = self.runs_url(job_name);
        debug!("starting job run: POST {url}");

        let response = self
            .client
            .post(&url)
            .json(&StartRequest { parameters })
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::concurrency_limit(job_name)),
            status if status.is_success() => {
                let body: StartResponse = response.json().await?;
                Ok(body.run_id)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::job_start(
                    job_name,
                    format!("HTTP {}: {body}", status.as_u16()),
                ))
            }
        }
    }

    async fn poll(&self, job_name: &str, run_id: &str) -> Result<RunState> {
        let url = format!("{}/{run_id}", self.runs_url(job_name));
        debug!("polling job run: GET {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::job_poll(
                job_name,
                run_id,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        let body: PollResponse = response.json().await?;
        RunState::parse(&body.state).ok_or_else(|| Error::UnknownRunState {
            run_id: run_id.to_string(),
            state: body.state,
        })
    }
}
