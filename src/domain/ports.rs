use crate::domain::model::{Partner, PartnerQuery, ReceitasPage, TitulosQuery};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait ReceivablesSource: Send + Sync {
    async fn fetch_receitas(&self, query: &TitulosQuery) -> Result<ReceitasPage>;
    async fn download_boleto(&self, codigo_financeiro: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    async fn search_partners(&self, query: &PartnerQuery) -> Result<Vec<Partner>>;
}
