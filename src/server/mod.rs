//! JSON 代理服務：`/api/sankhya/*` 路由

pub mod routes;

use crate::config::AppConfig;
use crate::core::client::SankhyaClient;
use crate::core::service::ReceivablesService;
use crate::domain::model::TitulosQuery;
use crate::utils::error::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub service: ReceivablesService<SankhyaClient, SankhyaClient>,
    pub defaults: TitulosQuery,
    pub partner_page_size: u32,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = SankhyaClient::new(config)?;
        Ok(Self {
            service: ReceivablesService::new(client.clone(), client),
            defaults: TitulosQuery {
                codigo_empresa: config.defaults.codigo_empresa.clone(),
                ..TitulosQuery::default()
            },
            partner_page_size: config.defaults.partner_page_size,
        })
    }
}

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/sankhya", routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: &AppConfig, bind: &str) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("🚀 Proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
