use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracker_core::{Ad, AuthTokens, KeywordAd, StoredSession, SystemStats, UpdateBatch, User};
use tracker_logging::tracker_debug;
use url::Url;

use crate::{ApiError, FailureKind};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The tracker service's HTTP surface.
#[async_trait::async_trait]
pub trait TrackerApi: Send + Sync {
    /// Replaces the bearer attached to authenticated requests.
    fn set_bearer(&self, token: Option<String>);

    async fn keywords(&self) -> Result<Vec<String>, ApiError>;
    async fn add_keyword(&self, keyword: &str) -> Result<(), ApiError>;
    async fn delete_keyword(&self, keyword: &str) -> Result<(), ApiError>;
    async fn recent_ads(&self) -> Result<Vec<KeywordAd>, ApiError>;
    async fn keyword_ads(&self, keyword: &str) -> Result<Vec<Ad>, ApiError>;
    async fn stats(&self) -> Result<SystemStats, ApiError>;
    async fn manual_check(&self) -> Result<(), ApiError>;
    /// Pending change batch. The server hands each batch out once.
    async fn notifications(&self) -> Result<UpdateBatch, ApiError>;
    async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<StoredSession, ApiError>;
    async fn logout(&self, access_token: &str) -> Result<(), ApiError>;
    async fn me(&self) -> Result<User, ApiError>;
}

#[derive(Debug)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base_url: Url,
    bearer: RwLock<Option<String>>,
}

#[derive(Serialize)]
struct KeywordRequest<'a> {
    keyword: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Deserialize)]
struct KeywordsResponse {
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RecentAdsResponse {
    #[serde(default)]
    ads: Vec<KeywordAd>,
}

#[derive(Deserialize)]
struct KeywordAdsResponse {
    #[serde(default)]
    ads: AdsPayload,
}

/// An unknown keyword makes the service answer with every keyword's ads,
/// grouped by keyword. That shape carries nothing for the requested keyword.
#[derive(Deserialize)]
#[serde(untagged)]
enum AdsPayload {
    List(Vec<Ad>),
    Grouped(BTreeMap<String, serde_json::Value>),
}

impl Default for AdsPayload {
    fn default() -> Self {
        AdsPayload::List(Vec::new())
    }
}

#[derive(Deserialize)]
struct ManualCheckResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct MeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl RawResponse {
    fn ensure_authorized(self) -> Result<Self, ApiError> {
        if self.status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::new(
                FailureKind::Unauthorized,
                "session is no longer valid",
            ));
        }
        Ok(self)
    }

    /// Decodes a body that is only meaningful on a success status.
    fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let response = self.ensure_authorized()?;
        if !response.status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(response.status.as_u16()),
                response.status.to_string(),
            ));
        }
        decode(&response.body)
    }

    /// Decodes a body that explains itself even on an error status.
    fn envelope<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match decode(&self.body) {
            Ok(value) => Ok(value),
            Err(_) if !self.status.is_success() => Err(ApiError::new(
                FailureKind::HttpStatus(self.status.as_u16()),
                self.status.to_string(),
            )),
            Err(err) => Err(err),
        }
    }
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let mut base = settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            bearer: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn bearer(&self) -> Option<String> {
        match self.bearer.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        bearer: Option<String>,
    ) -> Result<RawResponse, ApiError> {
        tracker_debug!("{} {}", method, url);
        let mut builder = self.client.request(method, url);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }

    async fn get(&self, url: Url) -> Result<RawResponse, ApiError> {
        self.request(Method::GET, url, None, self.bearer()).await
    }

    async fn mutate(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<(), ApiError> {
        let response: MutationResponse = self
            .request(method, url, body, self.bearer())
            .await?
            .ensure_authorized()?
            .envelope()?;
        if response.success {
            Ok(())
        } else {
            Err(rejected(response.error, "Request was rejected"))
        }
    }
}

#[async_trait::async_trait]
impl TrackerApi for ReqwestApi {
    fn set_bearer(&self, token: Option<String>) {
        match self.bearer.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn keywords(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("api/keywords")?;
        let response: KeywordsResponse = self.get(url).await?.json()?;
        Ok(response.keywords)
    }

    async fn add_keyword(&self, keyword: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/keywords")?;
        let body = encode(&KeywordRequest { keyword })?;
        self.mutate(Method::POST, url, Some(body)).await
    }

    async fn delete_keyword(&self, keyword: &str) -> Result<(), ApiError> {
        let mut url = self.endpoint("api/keywords")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .push(keyword);
        self.mutate(Method::DELETE, url, None).await
    }

    async fn recent_ads(&self) -> Result<Vec<KeywordAd>, ApiError> {
        let url = self.endpoint("api/recent-ads")?;
        let response: RecentAdsResponse = self.get(url).await?.json()?;
        Ok(response.ads)
    }

    async fn keyword_ads(&self, keyword: &str) -> Result<Vec<Ad>, ApiError> {
        let mut url = self.endpoint("api/ads")?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        let response: KeywordAdsResponse = self.get(url).await?.json()?;
        Ok(match response.ads {
            AdsPayload::List(ads) => ads,
            AdsPayload::Grouped(_) => Vec::new(),
        })
    }

    async fn stats(&self) -> Result<SystemStats, ApiError> {
        let url = self.endpoint("api/stats")?;
        self.get(url).await?.json()
    }

    async fn manual_check(&self) -> Result<(), ApiError> {
        let url = self.endpoint("api/manual-check")?;
        let response: ManualCheckResponse =
            self.get(url).await?.ensure_authorized()?.envelope()?;
        if response.status == "success" {
            Ok(())
        } else {
            Err(rejected(response.message, "Manual check failed"))
        }
    }

    async fn notifications(&self) -> Result<UpdateBatch, ApiError> {
        let url = self.endpoint("api/notifications")?;
        self.get(url).await?.json()
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<StoredSession, ApiError> {
        let url = self.endpoint("api/auth/login")?;
        let body = encode(&LoginRequest {
            username,
            password,
            remember_me,
        })?;
        // Bad credentials come back as a 401 with an explanation, not an expiry.
        let response: LoginResponse = self
            .request(Method::POST, url, Some(body), None)
            .await?
            .envelope()?;
        if !response.success {
            return Err(rejected(response.error, "Login failed"));
        }
        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::new(FailureKind::Decode, "login response has no access token"))?;

        Ok(StoredSession {
            tokens: AuthTokens {
                access_token,
                refresh_token: response.refresh_token,
            },
            user: response.user.unwrap_or_default(),
        })
    }

    async fn logout(&self, access_token: &str) -> Result<(), ApiError> {
        let url = self.endpoint("api/auth/logout")?;
        let response = self
            .request(Method::POST, url, None, Some(access_token.to_string()))
            .await?;
        if response.status.is_success() {
            Ok(())
        } else {
            Err(ApiError::new(
                FailureKind::HttpStatus(response.status.as_u16()),
                response.status.to_string(),
            ))
        }
    }

    async fn me(&self) -> Result<User, ApiError> {
        let url = self.endpoint("api/auth/me")?;
        let response: MeResponse = self.get(url).await?.ensure_authorized()?.envelope()?;
        match (response.success, response.user) {
            (true, Some(user)) => Ok(user),
            (true, None) => Err(ApiError::new(FailureKind::Decode, "profile response has no user")),
            (false, _) => Err(rejected(response.error, "Session could not be verified")),
        }
    }
}

fn rejected(message: Option<String>, fallback: &str) -> ApiError {
    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ApiError::new(FailureKind::Rejected, message)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
