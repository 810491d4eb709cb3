use crate::config::toml_config::CredentialsConfig;
use crate::utils::error::{ReceivablesError, Result};
use crate::utils::validation::validate_required_field;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    bearer_token: Option<String>,
    token: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Option<String> {
        self.bearer_token
            .filter(|t| !t.is_empty())
            .or(self.token.filter(|t| !t.is_empty()))
    }
}

#[derive(Clone)]
struct LoginHeaders {
    token: String,
    appkey: String,
    username: String,
    password: String,
}

/// Sankhya 的 bearer token 快取：登入一次，之後一直沿用，直到 401/403 才清掉
#[derive(Clone)]
pub struct TokenCache {
    client: Client,
    login_url: String,
    headers: LoginHeaders,
    cached: Arc<Mutex<Option<String>>>,
}

impl TokenCache {
    pub fn new(client: Client, login_url: String, credentials: &CredentialsConfig) -> Result<Self> {
        let headers = LoginHeaders {
            token: validate_required_field("sankhya.credentials.token", &credentials.token)?
                .clone(),
            appkey: validate_required_field("sankhya.credentials.appkey", &credentials.appkey)?
                .clone(),
            username: validate_required_field(
                "sankhya.credentials.username",
                &credentials.username,
            )?
            .clone(),
            password: validate_required_field(
                "sankhya.credentials.password",
                &credentials.password,
            )?
            .clone(),
        };

        Ok(Self {
            client,
            login_url,
            headers,
            cached: Arc::new(Mutex::new(None)),
        })
    }

    /// 取得 token；快取有值時不發請求
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        match self.login().await {
            Ok(token) => {
                *cached = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                tracing::error!("❌ Sankhya login failed: {}", e);
                *cached = None;
                Err(e)
            }
        }
    }

    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            tracing::warn!("🔑 Cached Sankhya token invalidated");
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    async fn login(&self) -> Result<String> {
        tracing::debug!("Logging in to Sankhya at {}", self.login_url);

        let response = self
            .client
            .post(&self.login_url)
            .header("token", &self.headers.token)
            .header("appkey", &self.headers.appkey)
            .header("username", &self.headers.username)
            .header("password", &self.headers.password)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReceivablesError::AuthenticationFailed {
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response.json().await?;
        let token = body.into_token().ok_or(ReceivablesError::TokenMissing)?;

        tracing::info!("🔑 Authenticated against Sankhya");
        Ok(token)
    }
}
