use httpmock::prelude::*;
use sankhya_receivables::config::toml_config::CredentialsConfig;
use sankhya_receivables::core::service::sort_by_nro_desc;
use sankhya_receivables::domain::model::{TipoFinanceiro, TipoTitulo, TituloStatus, TitulosQuery};
use sankhya_receivables::render;
use sankhya_receivables::{AppConfig, LocalStorage, ReceivablesError, ReceivablesService, SankhyaClient};
use tempfile::TempDir;

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.sankhya.base_url = server.base_url();
    config.sankhya.credentials = CredentialsConfig {
        token: Some("integration-token".to_string()),
        appkey: Some("integration-appkey".to_string()),
        username: Some("financeiro@empresa.com.br".to_string()),
        password: Some("s3nha".to_string()),
    };
    config
}

fn receitas_body() -> serde_json::Value {
    serde_json::json!({
        "financeiros": [
            {
                "codigoFinanceiro": 2001,
                "codigoParceiro": 15,
                "valorParcela": 980.4,
                "dataVencimento": "2000-01-10 00:00:00",
                "dataNegociacao": "1999-12-10 00:00:00",
                "provisao": "N",
                "boleto": {
                    "nossoNumero": "55501",
                    "linhaDigitavel": "34191.79001 01043.510047 91020.150008 1 84560026000",
                    "codigoBarras": "34191845600260000001790010104351004910201500"
                },
                "codigoContaBancaria": 2,
                "observacao": "NF 3310"
            },
            {
                "codigoFinanceiro": 2003,
                "codigoParceiro": 15,
                "valorParcela": 120,
                "dataVencimento": "2999-01-10 00:00:00",
                "dataNegociacao": "2024-01-10 00:00:00",
                "provisao": 1,
                "boleto": {"nossoNumero": null}
            },
            {
                "codigoFinanceiro": 2002,
                "codigoParceiro": 16,
                "valorParcela": 75.9,
                "dataVencimento": "2999-02-10 00:00:00",
                "dataNegociacao": "2024-01-11 00:00:00",
                "boleto": {"nossoNumero": "55502"}
            }
        ],
        "pagination": {"page": "1", "offset": "0", "total": "3", "hasMore": "false"}
    })
}

#[tokio::test]
async fn test_titulos_end_to_end_with_partner_enrichment() {
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/login")
            .header("appkey", "integration-appkey");
        then.status(200)
            .json_body(serde_json::json!({"bearerToken": "tok-e2e"}));
    });

    let receitas_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/financeiros/receitas")
            .header("authorization", "Bearer tok-e2e")
            .query_param("codigoParceiro", "15")
            .query_param("tipoFinanceiro", "3");
        then.status(200).json_body(receitas_body());
    });

    let partner_15 = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/parceiros")
            .query_param("searchCode", "15");
        then.status(200).json_body(serde_json::json!({
            "parceiros": [{"CODPARC": 15, "NOMEPARC": "Distribuidora Paraná", "CGC_CPF": "11.222.333/0001-44"}]
        }));
    });

    let partner_16 = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/parceiros")
            .query_param("searchCode", "16");
        then.status(500);
    });

    let client = SankhyaClient::new(&config_for(&server)).unwrap();
    let service = ReceivablesService::new(client.clone(), client);
    let query = TitulosQuery {
        codigo_parceiro: Some("15".to_string()),
        ..TitulosQuery::default()
    };

    let mut response = service.list_titulos(&query).await.unwrap();
    sort_by_nro_desc(&mut response.titulos);

    login_mock.assert_hits(1);
    receitas_mock.assert_hits(1);
    partner_15.assert_hits(1);
    partner_16.assert_hits(1);

    let nros: Vec<&str> = response.titulos.iter().map(|t| t.nro_titulo.as_str()).collect();
    assert_eq!(nros, vec!["2003", "2002", "2001"]);

    let vencido = &response.titulos[2];
    assert_eq!(vencido.parceiro, "Distribuidora Paraná");
    assert_eq!(vencido.status, TituloStatus::Vencido);
    assert_eq!(vencido.tipo_titulo, TipoTitulo::Boleto);
    assert_eq!(vencido.conta_bancaria.as_deref(), Some("Conta 2"));

    let provisao = &response.titulos[0];
    assert_eq!(provisao.tipo_financeiro, TipoFinanceiro::Provisao);
    assert_eq!(provisao.tipo_titulo, TipoTitulo::Duplicata);
    assert_eq!(provisao.status, TituloStatus::Aberto);

    // lookup falhou: cai no nome genérico
    assert_eq!(response.titulos[1].parceiro, "Parceiro 16");

    let table = render::render_table(&response.titulos, &response.pagination, 1);
    assert!(table.contains("R$ 980,40"));
    assert!(table.contains("10/01/2000"));
    assert!(table.contains("Total de registros: 3"));

    // segunda busca reaproveita o token
    service.list_titulos(&query).await.unwrap();
    login_mock.assert_hits(1);
}

#[tokio::test]
async fn test_expired_session_is_reported_and_relogin_happens() {
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200)
            .json_body(serde_json::json!({"token": "short-lived"}));
    });

    let receitas_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/financeiros/receitas");
        then.status(403);
    });

    let client = SankhyaClient::new(&config_for(&server)).unwrap();
    let service = ReceivablesService::new(client.clone(), client.clone());

    let err = service
        .list_titulos(&TitulosQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReceivablesError::SessionExpired));
    assert_eq!(err.user_friendly_message(), "Sessão expirada");
    assert!(!client.auth().is_cached().await);

    let _ = service.list_titulos(&TitulosQuery::default()).await;

    login_mock.assert_hits(2);
    receitas_mock.assert_hits(2);
}

#[tokio::test]
async fn test_boleto_download_to_local_directory() {
    let server = MockServer::start();
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("boletos");

    server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200)
            .json_body(serde_json::json!({"bearerToken": "tok-boleto"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/financeiros/receitas");
        then.status(200).json_body(receitas_body());
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/parceiros");
        then.status(200).json_body(serde_json::json!({"parceiros": []}));
    });
    let boleto_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/financeiros/receitas/2002/boleto")
            .header("authorization", "Bearer tok-boleto");
        then.status(200)
            .header("Content-Type", "application/pdf")
            .body(b"%PDF-1.7 boleto 2002".to_vec());
    });

    let client = SankhyaClient::new(&config_for(&server)).unwrap();
    let service = ReceivablesService::new(client.clone(), client);
    let storage = LocalStorage::new(output_dir.to_string_lossy().to_string());

    let titulo = service
        .find_titulo(&TitulosQuery::default(), "2002")
        .await
        .unwrap();
    let path = service.download_boleto(&titulo, &storage).await.unwrap();

    boleto_mock.assert();
    assert!(path.ends_with("boleto_2002.pdf"));
    let saved = std::fs::read(output_dir.join("boleto_2002.pdf")).unwrap();
    assert_eq!(saved, b"%PDF-1.7 boleto 2002");

    // duplicata não tem boleto
    let duplicata = service
        .find_titulo(&TitulosQuery::default(), "2003")
        .await
        .unwrap();
    let err = service
        .download_boleto(&duplicata, &storage)
        .await
        .unwrap_err();
    assert!(matches!(err, ReceivablesError::NotABoleto { .. }));
    boleto_mock.assert_hits(1);
}

#[tokio::test]
async fn test_null_partner_code_keeps_generic_name() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/login");
        then.status(200)
            .json_body(serde_json::json!({"bearerToken": "tok-null"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/financeiros/receitas");
        then.status(200).json_body(serde_json::json!({
            "financeiros": [{
                "codigoFinanceiro": 3001,
                "codigoParceiro": null,
                "valorParcela": 44.0,
                "dataVencimento": "2999-01-01 00:00:00",
                "dataNegociacao": "2024-01-01 00:00:00",
                "boleto": null
            }]
        }));
    });
    let parceiros_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/parceiros");
        then.status(200).json_body(serde_json::json!({
            "parceiros": [{"CODPARC": "999", "NOMEPARC": "Outro Cliente"}]
        }));
    });

    let client = SankhyaClient::new(&config_for(&server)).unwrap();
    let service = ReceivablesService::new(client.clone(), client);

    let response = service
        .list_titulos(&TitulosQuery::default())
        .await
        .unwrap();

    parceiros_mock.assert_hits(0);
    let titulo = &response.titulos[0];
    assert_eq!(titulo.cod_parceiro, "");
    assert_ne!(titulo.parceiro, "Outro Cliente");
    assert_eq!(titulo.tipo_titulo, TipoTitulo::Duplicata);
}
