use crate::core::classify;
use crate::core::enrich::{partner_name, resolve_partner_names};
use crate::domain::model::{
    Financeiro, Partner, PartnerQuery, StatusFiltro, TipoFinanceiro, TipoTitulo, Titulo,
    TituloStatus, TitulosQuery, TitulosResponse,
};
use crate::domain::ports::{PartnerDirectory, ReceivablesSource, Storage};
use crate::utils::error::{ReceivablesError, Result};
use crate::utils::validation::validate_numeric_code;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

/// 名稱搜尋少於兩個字元時不帶條件
const MIN_SEARCH_LEN: usize = 2;

pub struct ReceivablesService<R: ReceivablesSource, D: PartnerDirectory> {
    source: R,
    directory: D,
    today: Option<NaiveDate>,
}

impl<R: ReceivablesSource, D: PartnerDirectory> ReceivablesService<R, D> {
    pub fn new(source: R, directory: D) -> Self {
        Self {
            source,
            directory,
            today: None,
        }
    }

    /// 固定「今天」，狀態判斷才可重現
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub async fn list_titulos(&self, query: &TitulosQuery) -> Result<TitulosResponse> {
        if let Some(codigo) = &query.codigo_parceiro {
            validate_numeric_code("codigoParceiro", codigo)?;
        }

        tracing::info!(
            "🔍 Fetching títulos a receber (página {}, parceiro {})",
            query.pagina,
            query.codigo_parceiro.as_deref().unwrap_or("-")
        );
        let page = self.source.fetch_receitas(query).await?;

        let codigos: Vec<String> = page
            .financeiros
            .iter()
            .map(|f| f.codigo_parceiro.clone())
            .collect();
        let names = resolve_partner_names(&self.directory, &codigos).await;

        let today = self.today();
        let titulos = page
            .financeiros
            .iter()
            .map(|item| to_titulo(item, &names, query.status_financeiro, today))
            .collect::<Vec<_>>();

        tracing::info!("✅ {} título(s) encontrado(s)", titulos.len());
        Ok(TitulosResponse {
            titulos,
            pagination: page.pagination,
        })
    }

    pub async fn find_titulo(&self, query: &TitulosQuery, nro: &str) -> Result<Titulo> {
        let response = self.list_titulos(query).await?;
        response
            .titulos
            .into_iter()
            .find(|t| t.nro_titulo == nro)
            .ok_or_else(|| ReceivablesError::TituloNotFound {
                nro: nro.to_string(),
            })
    }

    /// 只有未 Baixado 的 Boleto 能下載；檔名 `boleto_{nro}.pdf`
    pub async fn download_boleto<S: Storage>(&self, titulo: &Titulo, storage: &S) -> Result<String> {
        if titulo.tipo_titulo != TipoTitulo::Boleto {
            return Err(ReceivablesError::NotABoleto {
                nro: titulo.nro_titulo.clone(),
            });
        }
        if titulo.status == TituloStatus::Baixado {
            return Err(ReceivablesError::AlreadySettled {
                nro: titulo.nro_titulo.clone(),
            });
        }

        tracing::info!("📄 Preparing boleto download for título {}", titulo.nro_titulo);
        let pdf = self.boleto_bytes(&titulo.nro_titulo).await?;
        let path = storage
            .write_file(&boleto_filename(&titulo.nro_titulo), &pdf)
            .await?;

        tracing::info!("✅ Boleto saved to {}", path);
        Ok(path)
    }

    pub async fn boleto_bytes(&self, nro: &str) -> Result<Vec<u8>> {
        validate_numeric_code("nroTitulo", nro)?;
        self.source.download_boleto(nro).await
    }

    pub async fn search_partners(
        &self,
        term: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Partner>> {
        let search_name = term
            .map(str::trim)
            .filter(|t| t.chars().count() >= MIN_SEARCH_LEN)
            .map(str::to_string);

        let query = PartnerQuery {
            search_code: None,
            search_name,
            page: page.max(1),
            page_size: page_size.max(1),
        };

        self.directory.search_partners(&query).await
    }

    pub async fn lookup_partners(&self, query: &PartnerQuery) -> Result<Vec<Partner>> {
        self.directory.search_partners(query).await
    }
}

pub fn boleto_filename(nro: &str) -> String {
    format!("boleto_{}.pdf", nro)
}

fn to_titulo(
    item: &Financeiro,
    names: &HashMap<String, String>,
    filter: StatusFiltro,
    today: NaiveDate,
) -> Titulo {
    let tipo_financeiro = classify::tipo_financeiro(&item.provisao);
    if tipo_financeiro == TipoFinanceiro::Provisao {
        tracing::debug!(
            "📋 Título {}: provisão detectada (provisao={})",
            item.codigo_financeiro,
            item.provisao
        );
    }

    Titulo {
        nro_titulo: item.codigo_financeiro.clone(),
        parceiro: partner_name(names, &item.codigo_parceiro),
        cod_parceiro: item.codigo_parceiro.clone(),
        valor: item.valor_parcela,
        data_vencimento: classify::date_part(&item.data_vencimento).to_string(),
        data_negociacao: classify::date_part(&item.data_negociacao).to_string(),
        status: classify::status_for(filter, &item.data_vencimento, today),
        tipo_financeiro,
        tipo_titulo: classify::tipo_titulo(&item.boleto),
        conta_bancaria: classify::conta_bancaria(item.codigo_conta_bancaria),
        historico: item.observacao.clone(),
        numero_parcela: item.numero_parcela,
        origem_financeiro: item.origem_financeiro.clone(),
        codigo_empresa: item.codigo_empresa,
        codigo_natureza: item.codigo_natureza,
        boleto: item.boleto.clone(),
    }
}

/// 依título 編號數字由大到小；非數字排最後
pub fn sort_by_nro_desc(titulos: &mut [Titulo]) {
    titulos.sort_by(|a, b| {
        match (a.nro_titulo.parse::<u64>(), b.nro_titulo.parse::<u64>()) {
            (Ok(x), Ok(y)) => y.cmp(&x),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => b.nro_titulo.cmp(&a.nro_titulo),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Boleto, Pagination, ReceitasPage};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockSource {
        page: serde_json::Value,
        downloads: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ReceivablesSource for MockSource {
        async fn fetch_receitas(&self, _query: &TitulosQuery) -> Result<ReceitasPage> {
            Ok(serde_json::from_value(self.page.clone())?)
        }

        async fn download_boleto(&self, codigo_financeiro: &str) -> Result<Vec<u8>> {
            self.downloads
                .lock()
                .await
                .push(codigo_financeiro.to_string());
            Ok(b"%PDF-1.4".to_vec())
        }
    }

    struct MockDirectory {
        queries: Arc<Mutex<Vec<PartnerQuery>>>,
    }

    #[async_trait]
    impl PartnerDirectory for MockDirectory {
        async fn search_partners(&self, query: &PartnerQuery) -> Result<Vec<Partner>> {
            self.queries.lock().await.push(query.clone());
            if query.search_code.as_deref() == Some("7") {
                return Ok(vec![Partner {
                    codparc: "7".to_string(),
                    nomeparc: Some("Loja Sete".to_string()),
                    razaosocial: None,
                    cgc_cpf: Some("00.000.000/0001-00".to_string()),
                }]);
            }
            Ok(vec![])
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(format!("mem://{}", path))
        }
    }

    fn sample_page() -> serde_json::Value {
        serde_json::json!({
            "financeiros": [
                {
                    "codigoFinanceiro": 101,
                    "codigoParceiro": 7,
                    "valorParcela": 1500.5,
                    "dataVencimento": "2024-05-01 00:00:00",
                    "dataNegociacao": "2024-04-01 00:00:00",
                    "provisao": "N",
                    "boleto": {"nossoNumero": "998877", "linhaDigitavel": "2379..."},
                    "codigoContaBancaria": 4,
                    "observacao": "Venda balcão",
                    "numeroParcela": 1,
                    "origemFinanceiro": "E",
                    "codigoEmpresa": 1,
                    "codigoNatureza": 10101
                },
                {
                    "codigoFinanceiro": 102,
                    "codigoParceiro": 8,
                    "valorParcela": 20,
                    "dataVencimento": "2024-07-01 00:00:00",
                    "dataNegociacao": "2024-04-02 00:00:00",
                    "provisao": true,
                    "boleto": {"nossoNumero": null},
                    "codigoContaBancaria": null
                },
                {
                    "codigoFinanceiro": 103,
                    "codigoParceiro": 7,
                    "valorParcela": 5,
                    "dataVencimento": "2024-06-01 00:00:00",
                    "dataNegociacao": "2024-04-03 00:00:00",
                    "boleto": {}
                }
            ],
            "pagination": {"page": "1", "offset": "0", "total": "3", "hasMore": "false"}
        })
    }

    fn service() -> (
        ReceivablesService<MockSource, MockDirectory>,
        Arc<Mutex<Vec<PartnerQuery>>>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let downloads = Arc::new(Mutex::new(Vec::new()));
        let service = ReceivablesService::new(
            MockSource {
                page: sample_page(),
                downloads: downloads.clone(),
            },
            MockDirectory {
                queries: queries.clone(),
            },
        )
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        (service, queries, downloads)
    }

    #[tokio::test]
    async fn test_list_titulos_maps_and_enriches() {
        let (service, queries, _) = service();

        let response = service.list_titulos(&TitulosQuery::default()).await.unwrap();

        assert_eq!(response.titulos.len(), 3);
        assert_eq!(response.pagination.total, "3");

        let first = &response.titulos[0];
        assert_eq!(first.nro_titulo, "101");
        assert_eq!(first.parceiro, "Loja Sete");
        assert_eq!(first.data_vencimento, "2024-05-01");
        assert_eq!(first.data_negociacao, "2024-04-01");
        assert_eq!(first.status, TituloStatus::Vencido);
        assert_eq!(first.tipo_financeiro, TipoFinanceiro::Real);
        assert_eq!(first.tipo_titulo, TipoTitulo::Boleto);
        assert_eq!(first.conta_bancaria.as_deref(), Some("Conta 4"));
        assert_eq!(first.historico.as_deref(), Some("Venda balcão"));

        let second = &response.titulos[1];
        assert_eq!(second.parceiro, "Parceiro 8");
        assert_eq!(second.status, TituloStatus::Aberto);
        assert_eq!(second.tipo_financeiro, TipoFinanceiro::Provisao);
        assert_eq!(second.tipo_titulo, TipoTitulo::Duplicata);
        assert_eq!(second.conta_bancaria, None);

        // 今天到期
        assert_eq!(response.titulos[2].status, TituloStatus::Aberto);

        // 7 只查一次
        let queries = queries.lock().await;
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].page_size, 1);
    }

    #[tokio::test]
    async fn test_baixado_filter_marks_every_titulo() {
        let (service, _, _) = service();
        let query = TitulosQuery {
            status_financeiro: StatusFiltro::Baixado,
            ..TitulosQuery::default()
        };

        let response = service.list_titulos(&query).await.unwrap();

        assert!(response
            .titulos
            .iter()
            .all(|t| t.status == TituloStatus::Baixado));
    }

    #[tokio::test]
    async fn test_non_numeric_partner_code_rejected() {
        let (service, _, _) = service();
        let query = TitulosQuery {
            codigo_parceiro: Some("abc".to_string()),
            ..TitulosQuery::default()
        };

        let err = service.list_titulos(&query).await.unwrap_err();
        assert!(matches!(err, ReceivablesError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_find_titulo() {
        let (service, _, _) = service();

        let titulo = service
            .find_titulo(&TitulosQuery::default(), "103")
            .await
            .unwrap();
        assert_eq!(titulo.valor, 5.0);

        let err = service
            .find_titulo(&TitulosQuery::default(), "999")
            .await
            .unwrap_err();
        assert!(matches!(err, ReceivablesError::TituloNotFound { .. }));
    }

    fn boleto_titulo(status: TituloStatus, tipo: TipoTitulo) -> Titulo {
        Titulo {
            nro_titulo: "101".to_string(),
            parceiro: "Loja Sete".to_string(),
            cod_parceiro: "7".to_string(),
            valor: 10.0,
            data_vencimento: "2024-07-01".to_string(),
            data_negociacao: "2024-04-01".to_string(),
            status,
            tipo_financeiro: TipoFinanceiro::Real,
            tipo_titulo: tipo,
            conta_bancaria: None,
            historico: None,
            numero_parcela: None,
            origem_financeiro: None,
            codigo_empresa: None,
            codigo_natureza: None,
            boleto: Boleto::default(),
        }
    }

    #[tokio::test]
    async fn test_download_boleto_writes_pdf() {
        let (service, _, downloads) = service();
        let storage = MemoryStorage::default();

        let path = service
            .download_boleto(&boleto_titulo(TituloStatus::Vencido, TipoTitulo::Boleto), &storage)
            .await
            .unwrap();

        assert_eq!(path, "mem://boleto_101.pdf");
        assert_eq!(*downloads.lock().await, vec!["101".to_string()]);
        assert!(storage.files.lock().await.contains_key("boleto_101.pdf"));
    }

    #[tokio::test]
    async fn test_download_boleto_preconditions() {
        let (service, _, downloads) = service();
        let storage = MemoryStorage::default();

        let err = service
            .download_boleto(&boleto_titulo(TituloStatus::Aberto, TipoTitulo::Duplicata), &storage)
            .await
            .unwrap_err();
        assert!(matches!(err, ReceivablesError::NotABoleto { .. }));

        let err = service
            .download_boleto(&boleto_titulo(TituloStatus::Baixado, TipoTitulo::Boleto), &storage)
            .await
            .unwrap_err();
        assert!(matches!(err, ReceivablesError::AlreadySettled { .. }));

        assert!(downloads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_partners_ignores_short_terms() {
        let (service, queries, _) = service();

        service.search_partners(Some("a"), 1, 50).await.unwrap();
        service.search_partners(Some(" sol "), 0, 50).await.unwrap();

        let queries = queries.lock().await;
        assert_eq!(queries[0].search_name, None);
        assert_eq!(queries[1].search_name.as_deref(), Some("sol"));
        assert_eq!(queries[1].page, 1);
    }

    #[test]
    fn test_sort_by_nro_desc() {
        let mut titulos = vec![
            boleto_titulo(TituloStatus::Aberto, TipoTitulo::Boleto),
            boleto_titulo(TituloStatus::Aberto, TipoTitulo::Boleto),
            boleto_titulo(TituloStatus::Aberto, TipoTitulo::Boleto),
            boleto_titulo(TituloStatus::Aberto, TipoTitulo::Boleto),
        ];
        titulos[0].nro_titulo = "9".to_string();
        titulos[1].nro_titulo = "x1".to_string();
        titulos[2].nro_titulo = "100".to_string();
        titulos[3].nro_titulo = "20".to_string();

        sort_by_nro_desc(&mut titulos);

        let order: Vec<&str> = titulos.iter().map(|t| t.nro_titulo.as_str()).collect();
        assert_eq!(order, vec!["100", "20", "9", "x1"]);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_service_futures_are_send() {
        let (service, _, _) = service();
        let query = TitulosQuery::default();
        let storage = MemoryStorage::default();
        let titulo = boleto_titulo(TituloStatus::Aberto, TipoTitulo::Boleto);

        // 代理路由要求 handler 的 future 是 Send
        assert_send(service.list_titulos(&query));
        assert_send(service.find_titulo(&query, "101"));
        assert_send(service.download_boleto(&titulo, &storage));
        assert_send(service.search_partners(Some("sol"), 1, 50));
    }

    #[tokio::test]
    async fn test_null_partner_code_is_not_enriched() {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let service = ReceivablesService::new(
            MockSource {
                page: serde_json::json!({
                    "financeiros": [{
                        "codigoFinanceiro": 501,
                        "codigoParceiro": null,
                        "valorParcela": 12.5,
                        "dataVencimento": "2024-07-01 00:00:00",
                        "dataNegociacao": "2024-04-01 00:00:00"
                    }]
                }),
                downloads: Arc::new(Mutex::new(Vec::new())),
            },
            MockDirectory {
                queries: queries.clone(),
            },
        );

        let response = service.list_titulos(&TitulosQuery::default()).await.unwrap();

        assert!(queries.lock().await.is_empty());
        assert_eq!(response.titulos[0].cod_parceiro, "");
        assert_eq!(response.titulos[0].parceiro, "Parceiro ");
    }

    #[test]
    fn test_pagination_default_for_empty_page() {
        let page: ReceitasPage = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(page.pagination, Pagination::default());
    }
}
