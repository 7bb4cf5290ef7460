//! REST client for the AWS IoT device shadow API.
//!
//! `GET  {endpoint}/things/{thing}/shadow` fetches the document,
//! `POST {endpoint}/things/{thing}/shadow` submits a desired delta.

use super::sigv4::{self, Credentials};
use super::{DesiredPatch, ShadowClient, StateDocument, UpdateAck};
use crate::config::ShadowConfig;
use crate::error::{SkillError, SkillResult};
use async_trait::async_trait;
use reqwest::Method;

/// HTTP shadow client. Cheap to share behind an `Arc`; holds no per-thing state.
pub struct HttpShadowClient {
    endpoint: String,
    region: String,
    credentials: Option<Credentials>,
    http: reqwest::Client,
}

impl HttpShadowClient {
    /// Create a client from the `[shadow]` config section.
    pub fn new(config: &ShadowConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            anyhow::bail!(
                "shadow.endpoint is not configured. Set it in config.toml or via PULSEBAND_SHADOW_ENDPOINT."
            );
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()?;

        if config.credentials.is_none() {
            tracing::warn!("No AWS credentials configured; shadow requests will be sent unsigned");
        }

        Ok(Self {
            endpoint,
            region: config.resolved_region(),
            credentials: config.credentials.clone(),
            http,
        })
    }

    /// Build the shadow URL for a thing. The name is forwarded verbatim, percent-encoded.
    fn shadow_url(&self, thing: &str) -> String {
        format!("{}/things/{}/shadow", self.endpoint, urlencoding::encode(thing))
    }

    /// Send one request and return the body of a 2xx response.
    async fn dispatch(&self, method: Method, thing: &str, payload: Option<String>) -> anyhow::Result<String> {
        let url = reqwest::Url::parse(&self.shadow_url(thing))?;
        let body = payload.unwrap_or_default();

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(ref credentials) = self.credentials {
            let signed = sigv4::sign(
                method.as_str(),
                &url,
                body.as_bytes(),
                credentials,
                &self.region,
                chrono::Utc::now(),
            );
            for (key, value) in signed.into_headers() {
                request = request.header(key, value);
            }
        }
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            anyhow::bail!("shadow service returned {status}: {text}");
        }
        Ok(text)
    }
}

#[async_trait]
impl ShadowClient for HttpShadowClient {
    async fn fetch_state(&self, thing: &str) -> SkillResult<StateDocument> {
        let fetched = self
            .dispatch(Method::GET, thing, None)
            .await
            .and_then(|text| {
                serde_json::from_str::<StateDocument>(&text).map_err(anyhow::Error::from)
            });

        fetched.map_err(|e| {
            tracing::warn!(thing, "Failed to get thing shadow: {e:#}");
            SkillError::RemoteFetch {
                thing: thing.to_string(),
                detail: format!("{e:#}"),
            }
        })
    }

    async fn request_state_change(
        &self,
        thing: &str,
        patch: &DesiredPatch,
    ) -> SkillResult<UpdateAck> {
        let payload = patch.to_payload().to_string();

        match self.dispatch(Method::POST, thing, Some(payload)).await {
            Ok(text) => {
                // The service echoes the accepted delta with the new version.
                let version = serde_json::from_str::<serde_json::Value>(&text)
                    .ok()
                    .and_then(|v| v.get("version").and_then(serde_json::Value::as_u64));
                tracing::info!(thing, ?version, "Shadow update request accepted");
                Ok(UpdateAck { version })
            }
            Err(e) => {
                tracing::warn!(thing, "Failed to update thing shadow: {e:#}");
                Err(SkillError::RemoteUpdate {
                    thing: thing.to_string(),
                    detail: format!("{e:#}"),
                })
            }
        }
    }
}
