//! JSON-over-HTTP backend

use crate::{Backend, ClientConfig, FetchError, FetchResult};
use ag_core::contract::{
    paths, AnalyzeImageRequest, AnalyzeImageResponse, ApiMessage, PersistAnalysisRequest,
    SignInRequest, SignUpRequest,
};
use ag_core::{
    DiseaseReport, NewDiseaseReport, NewUserFeedback, PlantAnalysis, UserFeedback, UserProfile,
};
use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Backend reached over HTTP
///
/// The client keeps a cookie store, so the session cookie set by sign-in is
/// sent with every later request.
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> FetchResult<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> FetchResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> FetchResult<Response> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&text)
                .map(|m| m.message)
                .unwrap_or(text);
            warn!("{} {} failed with {}", method, path, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> FetchResult<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        decode(response).await
    }
}

fn transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> FetchResult<T> {
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in(&self, request: &SignInRequest) -> FetchResult<UserProfile> {
        self.post(paths::SIGN_IN, request).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> FetchResult<UserProfile> {
        self.post(paths::SIGN_UP, request).await
    }

    async fn sign_out(&self) -> FetchResult<()> {
        self.send::<()>(Method::POST, paths::SIGN_OUT, None).await?;
        Ok(())
    }

    async fn current_user(&self) -> FetchResult<UserProfile> {
        self.get(paths::CURRENT_USER).await
    }

    async fn analyze_image(&self, request: &AnalyzeImageRequest) -> FetchResult<AnalyzeImageResponse> {
        self.post(paths::ANALYZE_IMAGE, request).await
    }

    async fn persist_analysis(&self, request: &PersistAnalysisRequest) -> FetchResult<PlantAnalysis> {
        self.post(paths::PLANT_ANALYSIS, request).await
    }

    async fn list_analyses(&self, user_id: i64) -> FetchResult<Vec<PlantAnalysis>> {
        self.get(&paths::user_analyses(user_id)).await
    }

    async fn list_disease_reports(&self) -> FetchResult<Vec<DiseaseReport>> {
        self.get(paths::DISEASE_REPORTS).await
    }

    async fn create_disease_report(&self, report: &NewDiseaseReport) -> FetchResult<DiseaseReport> {
        self.post(paths::DISEASE_REPORTS, report).await
    }

    async fn submit_feedback(&self, feedback: &NewUserFeedback) -> FetchResult<UserFeedback> {
        self.post(paths::FEEDBACK, feedback).await
    }
}
