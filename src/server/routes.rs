use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::core::service::boleto_filename;
use crate::domain::model::{PartnerQuery, PartnersPage, TitulosParams};
use crate::server::AppState;
use crate::utils::error::{ReceivablesError, Result};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titulos-receber", get(titulos_receber))
        .route("/parceiros", get(parceiros))
        .route("/boleto/{nro}", get(boleto))
}

fn error_response(error: &str, err: &ReceivablesError) -> Response {
    let status = match err {
        ReceivablesError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!("❌ {}: {}", error, err);
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "details": err.user_friendly_message(),
        })),
    )
        .into_response()
}

/// GET /api/sankhya/titulos-receber: títulos enriquecidos + paginação do Sankhya.
async fn titulos_receber(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TitulosParams>,
) -> Response {
    const ERROR: &str = "Erro ao buscar títulos a receber";

    let query = match params.into_query_with(state.defaults.clone()) {
        Ok(query) => query,
        Err(e) => return error_response(ERROR, &e),
    };

    match state.service.list_titulos(&query).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(ERROR, &e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartnersParams {
    search_code: Option<String>,
    search_name: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

/// 分頁參數：沒帶用預設值，非數字回 400，最小為 1
fn page_param(field: &str, raw: Option<&str>, default: u32) -> Result<u32> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse::<u32>()
            .map(|n| n.max(1))
            .map_err(|_| ReceivablesError::ValidationError {
                message: format!("{} inválido: '{}'", field, value),
            }),
        None => Ok(default.max(1)),
    }
}

/// GET /api/sankhya/parceiros: busca por código (`searchCode`) ou nome (`searchName`).
async fn parceiros(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PartnersParams>,
) -> Response {
    const ERROR: &str = "Erro ao buscar parceiros";

    let paging = page_param("page", params.page.as_deref(), 1).and_then(|page| {
        page_param("pageSize", params.page_size.as_deref(), state.partner_page_size)
            .map(|page_size| (page, page_size))
    });
    let (page, page_size) = match paging {
        Ok(paging) => paging,
        Err(e) => return error_response(ERROR, &e),
    };

    let result = match params.search_code.filter(|c| !c.trim().is_empty()) {
        Some(code) => {
            state
                .service
                .lookup_partners(&PartnerQuery {
                    search_code: Some(code),
                    search_name: None,
                    page,
                    page_size,
                })
                .await
        }
        None => {
            state
                .service
                .search_partners(params.search_name.as_deref(), page, page_size)
                .await
        }
    };

    match result {
        Ok(parceiros) => Json(PartnersPage { parceiros }).into_response(),
        Err(e) => error_response(ERROR, &e),
    }
}

/// GET /api/sankhya/boleto/{nro}: PDF do boleto como anexo.
async fn boleto(State(state): State<Arc<AppState>>, Path(nro): Path<String>) -> Response {
    match state.service.boleto_bytes(&nro).await {
        Ok(pdf) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", boleto_filename(&nro)),
                ),
            ],
            pdf,
        )
            .into_response(),
        Err(e) => error_response("Erro ao baixar boleto", &e),
    }
}
