use crate::config::toml_config::{AppConfig, EndpointsConfig};
use crate::core::auth::TokenCache;
use crate::domain::model::{Partner, PartnerQuery, PartnersPage, ReceitasPage, TitulosQuery};
use crate::domain::ports::{PartnerDirectory, ReceivablesSource};
use crate::utils::error::{ReceivablesError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Sankhya API 客戶端，所有請求都帶同一個快取的 bearer token
#[derive(Clone)]
pub struct SankhyaClient {
    client: Client,
    base_url: String,
    endpoints: EndpointsConfig,
    auth: TokenCache,
}

impl SankhyaClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.sankhya.timeout_seconds))
            .build()?;

        let base_url = config.base_url().to_string();
        let endpoints = config.sankhya.endpoints.clone();
        let login_url = format!("{}{}", base_url, endpoints.login);
        let auth = TokenCache::new(client.clone(), login_url, &config.sankhya.credentials)?;

        Ok(Self {
            client,
            base_url,
            endpoints,
            auth,
        })
    }

    pub fn auth(&self) -> &TokenCache {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized_get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        endpoint: &str,
    ) -> Result<Response> {
        let token = self.auth.token().await?;

        tracing::debug!("🔍 GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("{} answered {}", endpoint, status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.auth.invalidate().await;
            return Err(ReceivablesError::SessionExpired);
        }

        if !status.is_success() {
            return Err(ReceivablesError::UpstreamStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ReceivablesSource for SankhyaClient {
    async fn fetch_receitas(&self, query: &TitulosQuery) -> Result<ReceitasPage> {
        let url = self.url(&self.endpoints.receitas);
        let response = self
            .authorized_get(&url, &query.to_query_pairs(), "receitas")
            .await?;

        let page: ReceitasPage = response.json().await?;
        tracing::debug!(
            "Fetched {} receitas (page {}, total {})",
            page.financeiros.len(),
            page.pagination.page,
            page.pagination.total
        );
        Ok(page)
    }

    async fn download_boleto(&self, codigo_financeiro: &str) -> Result<Vec<u8>> {
        let path = self
            .endpoints
            .boleto
            .replace("{codigoFinanceiro}", codigo_financeiro);
        let url = self.url(&path);

        let response = self.authorized_get(&url, &[], "boleto").await?;
        let bytes = response.bytes().await?;

        tracing::debug!("Downloaded boleto {} ({} bytes)", codigo_financeiro, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PartnerDirectory for SankhyaClient {
    async fn search_partners(&self, query: &PartnerQuery) -> Result<Vec<Partner>> {
        let url = self.url(&self.endpoints.parceiros);
        let response = self
            .authorized_get(&url, &query.to_query_pairs(), "parceiros")
            .await?;

        let page: PartnersPage = response.json().await?;
        Ok(page.parceiros)
    }
}
