//! # Backend HTTP Client
//!
//! Wrapper around the incubator REST API. Every response is validated
//! into core types before it leaves this module.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/teams/{team}/roadmap`, `/roadmap` | admin locks/unlocks |
//! | GET | `/teams/{team}/progress` | completed + current station |
//! | GET | `/teams/{team}/concept` | idea artifact existence |
//! | GET | `/questionnaire-structure` | questionnaire schema |
//! | GET/PUT | `{scope}/questionnaire` | saved answers + pointer |
//! | POST | `{scope}/questionnaire/autosave` | single-answer write |
//! | POST | `{scope}/questionnaire/submit` | final submission |
//!
//! `{scope}` is `/teams/{team}` or `/me`.

mod wire;

pub use wire::{
    AutosaveRequest, CompletionReport, ProgressResponse, RoadmapResponse, StructureResponse,
    lenient_overrides,
};

use crate::error::ClientError;
use crate::gating::CompletionSource;
use crate::progress::{ProgressScope, RemoteProgress};
use crate::sync::OverrideSource;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use stationflow_core::{OverrideSnapshot, ProgressSnapshot, QuestionnaireSchema, Submission, TeamId};
use std::time::Duration;

/// HTTP client for the incubator backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiClient {
    /// Create a client pointing at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Map non-success statuses to errors.
    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(resp.url().path().to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(ClientError::ServerError(status.as_u16(), body))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        let resp = self.check(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// Like [`Self::get_json`], with 404 mapped to `None`.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ClientError> {
        match self.get_json(path).await {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        let resp = self.send(self.request(method, path).json(body)).await?;
        self.check(resp).await.map(|_| ())
    }

    // =========================================================================
    // ENDPOINTS
    // =========================================================================

    /// GET roadmap → admin override maps.
    pub async fn roadmap(&self, team: Option<TeamId>) -> Result<OverrideSnapshot, ClientError> {
        let path = match team {
            Some(team) => format!("/teams/{team}/roadmap"),
            None => "/roadmap".to_string(),
        };
        let raw: RoadmapResponse = self.get_json(&path).await?;
        Ok(raw.into_snapshot())
    }

    /// GET progress → completed stations and the current one.
    pub async fn completion(&self, team: TeamId) -> Result<CompletionReport, ClientError> {
        let raw: ProgressResponse = self.get_json(&format!("/teams/{team}/progress")).await?;
        CompletionReport::try_from(raw)
    }

    /// Whether the team has a concept (idea) artifact. 404 means no.
    pub async fn concept_exists(&self, team: TeamId) -> Result<bool, ClientError> {
        let found: Option<serde_json::Value> =
            self.get_optional(&format!("/teams/{team}/concept")).await?;
        Ok(found.is_some_and(|v| !v.is_null()))
    }

    /// GET questionnaire-structure → validated schema.
    pub async fn questionnaire_schema(&self) -> Result<QuestionnaireSchema, ClientError> {
        let raw: StructureResponse = self.get_json("/questionnaire-structure").await?;
        QuestionnaireSchema::try_from(raw)
    }

    /// Saved answers and pointer, if any.
    pub async fn load_answers(
        &self,
        scope: &ProgressScope,
    ) -> Result<Option<ProgressSnapshot>, ClientError> {
        self.get_optional(&format!("{}/questionnaire", scope.path_prefix()))
            .await
    }

    /// Full save of answers and pointer.
    pub async fn save_answers(
        &self,
        scope: &ProgressScope,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), ClientError> {
        let path = format!("{}/questionnaire", scope.path_prefix());
        self.send_json(Method::PUT, &path, snapshot).await
    }

    /// Single-answer write.
    pub async fn autosave(
        &self,
        scope: &ProgressScope,
        body: &AutosaveRequest,
    ) -> Result<(), ClientError> {
        let path = format!("{}/questionnaire/autosave", scope.path_prefix());
        self.send_json(Method::POST, &path, body).await
    }

    /// Final submission of the grouped answers.
    pub async fn submit(
        &self,
        scope: &ProgressScope,
        submission: &Submission,
    ) -> Result<(), ClientError> {
        let path = format!("{}/questionnaire/submit", scope.path_prefix());
        self.send_json(Method::POST, &path, submission).await
    }
}

// =============================================================================
// PORT IMPLEMENTATIONS
// =============================================================================

impl OverrideSource for ApiClient {
    async fn fetch_overrides(&self, team: Option<TeamId>) -> Result<OverrideSnapshot, ClientError> {
        self.roadmap(team).await
    }
}

impl CompletionSource for ApiClient {
    /// Without a team nothing is completed and the idea station is current.
    async fn fetch_completion(
        &self,
        team: Option<TeamId>,
    ) -> Result<CompletionReport, ClientError> {
        match team {
            Some(team) => self.completion(team).await,
            None => Ok(CompletionReport::default()),
        }
    }

    async fn idea_artifact_exists(&self, team: Option<TeamId>) -> Result<bool, ClientError> {
        match team {
            Some(team) => self.concept_exists(team).await,
            None => Ok(false),
        }
    }
}

impl RemoteProgress for ApiClient {
    async fn load(&self, scope: &ProgressScope) -> Result<Option<ProgressSnapshot>, ClientError> {
        self.load_answers(scope).await
    }

    async fn save(
        &self,
        scope: &ProgressScope,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), ClientError> {
        self.save_answers(scope, snapshot).await
    }

    async fn autosave(
        &self,
        scope: &ProgressScope,
        body: &AutosaveRequest,
    ) -> Result<(), ClientError> {
        ApiClient::autosave(self, scope, body).await
    }

    async fn submit(
        &self,
        scope: &ProgressScope,
        submission: &Submission,
    ) -> Result<(), ClientError> {
        ApiClient::submit(self, scope, submission).await
    }
}
