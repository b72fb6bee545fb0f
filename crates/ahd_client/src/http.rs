use std::time::Duration;

use ahd_core::auth::{CODE_AUTH_FORBIDDEN, CODE_AUTH_UNAUTHORIZED};
use ahd_core::error::AppError;
use ahd_core::ingest::health_event::{RawAffectedEntity, RawHealthEvent};
use ahd_core::source::{AppPublicSettings, EventDetail, EventQuery, EventSource, User};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `EventSource` backed by a JSON health-events API.
///
/// Endpoints are relative to `base_url`; list endpoints answer with bare JSON arrays.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsRequest<'a> {
    event_arns: &'a [String],
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ForbiddenBody {
    #[serde(default)]
    extra_data: Option<ForbiddenExtra>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ForbiddenExtra {
    #[serde(default)]
    reason: Option<String>,
}

fn invalid_base_url(base_url: &str, why: &str) -> AppError {
    AppError::new("SOURCE_BASE_URL_INVALID", format!("API base URL {why}"))
        .with_details(format!("base_url={base_url}"))
}

impl HttpEventSource {
    /// Create a client for `base_url` (`http://` or `https://`, no query, fragment or userinfo).
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let raw = base_url.trim();
        let parsed =
            Url::parse(raw).map_err(|e| invalid_base_url(raw, &format!("is malformed: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid_base_url(raw, "must start with http:// or https://"));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid_base_url(raw, "is missing a host"));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid_base_url(raw, "must not embed credentials"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid_base_url(raw, "must not carry a query or fragment"));
        }
        if parsed.port() == Some(0) {
            return Err(invalid_base_url(raw, "has an invalid port"));
        }

        let base_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Send `Authorization: Bearer <token>` on every call. Blank tokens are ignored.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{path}", self.base_url);
        let req = ureq::request(method, &url).timeout(self.timeout);
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: ureq::Request,
        body: Option<serde_json::Value>,
    ) -> Result<T, AppError> {
        debug!(endpoint, "calling health events API");
        let resp = match body {
            Some(json) => req.send_json(json),
            None => req.call(),
        };

        match resp {
            Ok(r) => r.into_json().map_err(|e| {
                AppError::new("SOURCE_DECODE_FAILED", "Failed to decode API response")
                    .with_details(format!("endpoint={endpoint}; err={e}"))
            }),
            Err(ureq::Error::Status(401, _)) => Err(AppError::new(
                CODE_AUTH_UNAUTHORIZED,
                "Authentication required",
            )
            .with_details(format!("endpoint={endpoint}; status=401"))),
            Err(ureq::Error::Status(403, r)) => {
                let body: ForbiddenBody = r.into_json().unwrap_or_default();
                let message = body.message.unwrap_or_else(|| "Forbidden".to_string());
                let mut details = format!("endpoint={endpoint}; status=403");
                if let Some(reason) = body.extra_data.and_then(|x| x.reason) {
                    details.push_str(&format!("; reason={reason}"));
                }
                Err(AppError::new(CODE_AUTH_FORBIDDEN, message).with_details(details))
            }
            Err(ureq::Error::Status(status, _)) => {
                warn!(endpoint, status, "health events API returned an error status");
                Err(
                    AppError::new("SOURCE_HTTP_STATUS", "Health events API request failed")
                        .with_details(format!("endpoint={endpoint}; status={status}"))
                        .with_retryable(status == 429 || status >= 500),
                )
            }
            Err(e) => Err(AppError::new(
                "SOURCE_UNREACHABLE",
                "Failed to reach health events API",
            )
            .with_details(format!("endpoint={endpoint}; err={e}"))
            .with_retryable(true)),
        }
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| {
        AppError::new("SOURCE_ENCODE_FAILED", "Failed to encode API request")
            .with_details(e.to_string())
    })
}

impl EventSource for HttpEventSource {
    fn get_events(&self, query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError> {
        let mut req = self
            .request("GET", "/events")
            .query("maxResults", &query.effective_limit().to_string());
        for status in &query.event_status_codes {
            req = req.query("eventStatusCodes", status);
        }
        for service in &query.services {
            req = req.query("services", service);
        }
        for region in &query.regions {
            req = req.query("regions", region);
        }
        let events: Vec<RawHealthEvent> = self.send("events", req, None)?;
        debug!(returned = events.len(), "fetched events");
        Ok(events)
    }

    fn get_event_details(&self, arns: &[String]) -> Result<Vec<EventDetail>, AppError> {
        if arns.is_empty() {
            return Ok(Vec::new());
        }
        let body = encode_json(&DetailsRequest { event_arns: arns })?;
        self.send(
            "events/details",
            self.request("POST", "/events/details"),
            Some(body),
        )
    }

    fn get_affected_entities(&self, arn: &str) -> Result<Vec<RawAffectedEntity>, AppError> {
        let req = self
            .request("GET", "/events/affected-entities")
            .query("eventArn", arn);
        self.send("events/affected-entities", req, None)
    }

    fn me(&self) -> Result<User, AppError> {
        self.send("auth/me", self.request("GET", "/auth/me"), None)
    }

    fn public_settings(&self) -> Result<AppPublicSettings, AppError> {
        self.send(
            "app/public-settings",
            self.request("GET", "/app/public-settings"),
            None,
        )
    }
}
