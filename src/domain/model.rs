use crate::utils::error::{ReceivablesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sankhya 回傳的欄位型別不固定（代碼有時是數字、有時是字串），統一轉成字串
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_string(Value::deserialize(deserializer)?))
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("invalid number '{}': {}", s, e))),
            Value::Null => Ok(0.0),
            other => Err(serde::de::Error::custom(format!(
                "expected a number, got {}",
                other
            ))),
        }
    }

    /// `null` 和欄位不存在一樣，取預設值
    pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn opt_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boleto {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub codigo_barras: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub nosso_numero: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub linha_digitavel: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub numero_remessa: Option<String>,
}

/// `/v1/financeiros/receitas` 的單筆資料
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financeiro {
    #[serde(deserialize_with = "de::string")]
    pub codigo_financeiro: String,
    #[serde(deserialize_with = "de::string")]
    pub codigo_parceiro: String,
    #[serde(default, deserialize_with = "de::number")]
    pub valor_parcela: f64,
    #[serde(default, deserialize_with = "de::string")]
    pub data_vencimento: String,
    #[serde(default, deserialize_with = "de::string")]
    pub data_negociacao: String,
    #[serde(default)]
    pub provisao: serde_json::Value,
    #[serde(default, deserialize_with = "de::null_default")]
    pub boleto: Boleto,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub codigo_conta_bancaria: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub observacao: Option<String>,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub numero_parcela: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub origem_financeiro: Option<String>,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub codigo_empresa: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub codigo_natureza: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "de::string")]
    pub page: String,
    #[serde(default, deserialize_with = "de::string")]
    pub offset: String,
    #[serde(default, deserialize_with = "de::string")]
    pub total: String,
    #[serde(default, deserialize_with = "de::string")]
    pub has_more: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: "1".to_string(),
            offset: "0".to_string(),
            total: "0".to_string(),
            has_more: "false".to_string(),
        }
    }
}

impl Pagination {
    pub fn total_count(&self) -> u64 {
        self.total.trim().parse().unwrap_or(0)
    }

    pub fn has_more(&self) -> bool {
        self.has_more.trim().eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceitasPage {
    #[serde(default)]
    pub financeiros: Vec<Financeiro>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(rename = "CODPARC", deserialize_with = "de::string")]
    pub codparc: String,
    #[serde(rename = "NOMEPARC", default, deserialize_with = "de::opt_string")]
    pub nomeparc: Option<String>,
    #[serde(rename = "RAZAOSOCIAL", default, deserialize_with = "de::opt_string")]
    pub razaosocial: Option<String>,
    #[serde(rename = "CGC_CPF", default, deserialize_with = "de::opt_string")]
    pub cgc_cpf: Option<String>,
}

impl Partner {
    /// NOMEPARC 優先，其次 RAZAOSOCIAL，空字串視為沒有
    pub fn display_name(&self) -> Option<&str> {
        [self.nomeparc.as_deref(), self.razaosocial.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartnersPage {
    #[serde(default)]
    pub parceiros: Vec<Partner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TituloStatus {
    Aberto,
    Vencido,
    Baixado,
}

impl fmt::Display for TituloStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Aberto => "Aberto",
            Self::Vencido => "Vencido",
            Self::Baixado => "Baixado",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoFinanceiro {
    Real,
    #[serde(rename = "Provisão")]
    Provisao,
}

impl fmt::Display for TipoFinanceiro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => f.write_str("Real"),
            Self::Provisao => f.write_str("Provisão"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoTitulo {
    Boleto,
    Duplicata,
}

impl fmt::Display for TipoTitulo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boleto => f.write_str("Boleto"),
            Self::Duplicata => f.write_str("Duplicata"),
        }
    }
}

/// `statusFinanceiro` 查詢參數：1 = Aberto, 2 = Baixado, 3 = Todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFiltro {
    Aberto,
    Baixado,
    #[default]
    Todos,
}

impl StatusFiltro {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Aberto => "1",
            Self::Baixado => "2",
            Self::Todos => "3",
        }
    }
}

impl FromStr for StatusFiltro {
    type Err = ReceivablesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "aberto" => Ok(Self::Aberto),
            "2" | "baixado" => Ok(Self::Baixado),
            "3" | "todos" => Ok(Self::Todos),
            other => Err(ReceivablesError::ValidationError {
                message: format!("statusFinanceiro inválido: '{}'", other),
            }),
        }
    }
}

/// `tipoFinanceiro` 查詢參數（畫面上的「Tipo de Movimento」）：1 = Real, 2 = Provisão, 3 = Todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TipoMovimento {
    Real,
    Provisao,
    #[default]
    Todos,
}

impl TipoMovimento {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Real => "1",
            Self::Provisao => "2",
            Self::Todos => "3",
        }
    }
}

impl FromStr for TipoMovimento {
    type Err = ReceivablesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "real" => Ok(Self::Real),
            "2" | "provisao" | "provisão" => Ok(Self::Provisao),
            "3" | "todos" => Ok(Self::Todos),
            other => Err(ReceivablesError::ValidationError {
                message: format!("tipoFinanceiro inválido: '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitulosQuery {
    pub pagina: u32,
    pub codigo_empresa: String,
    pub codigo_parceiro: Option<String>,
    pub status_financeiro: StatusFiltro,
    pub tipo_financeiro: TipoMovimento,
    pub data_negociacao_inicio: Option<String>,
    pub data_negociacao_final: Option<String>,
}

impl Default for TitulosQuery {
    fn default() -> Self {
        Self {
            pagina: 1,
            codigo_empresa: "1".to_string(),
            codigo_parceiro: None,
            status_financeiro: StatusFiltro::Todos,
            tipo_financeiro: TipoMovimento::Todos,
            data_negociacao_inicio: None,
            data_negociacao_final: None,
        }
    }
}

impl TitulosQuery {
    /// 上游查詢參數：固定四個，其餘只有非空時才附加
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pagina", self.pagina.to_string()),
            ("codigoEmpresa", self.codigo_empresa.clone()),
            ("statusFinanceiro", self.status_financeiro.code().to_string()),
            ("tipoFinanceiro", self.tipo_financeiro.code().to_string()),
        ];

        let optional = [
            ("codigoParceiro", &self.codigo_parceiro),
            ("dataNegociacaoInicio", &self.data_negociacao_inicio),
            ("dataNegociacaoFinal", &self.data_negociacao_final),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }

        pairs
    }
}

/// 代理路由收到的原始查詢參數，全部可省略
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitulosParams {
    pub pagina: Option<String>,
    pub codigo_empresa: Option<String>,
    pub codigo_parceiro: Option<String>,
    pub status_financeiro: Option<String>,
    pub tipo_financeiro: Option<String>,
    pub data_negociacao_inicio: Option<String>,
    pub data_negociacao_final: Option<String>,
}

impl TitulosParams {
    pub fn into_query(self) -> Result<TitulosQuery> {
        self.into_query_with(TitulosQuery::default())
    }

    /// 沒帶的參數取 `defaults` 的值
    pub fn into_query_with(self, defaults: TitulosQuery) -> Result<TitulosQuery> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let pagina = match non_empty(self.pagina) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| ReceivablesError::ValidationError {
                    message: format!("pagina inválida: '{}'", raw),
                })?,
            None => defaults.pagina,
        };

        Ok(TitulosQuery {
            pagina,
            codigo_empresa: non_empty(self.codigo_empresa).unwrap_or(defaults.codigo_empresa),
            codigo_parceiro: non_empty(self.codigo_parceiro).or(defaults.codigo_parceiro),
            status_financeiro: non_empty(self.status_financeiro)
                .map(|s| s.parse::<StatusFiltro>())
                .transpose()?
                .unwrap_or(defaults.status_financeiro),
            tipo_financeiro: non_empty(self.tipo_financeiro)
                .map(|s| s.parse::<TipoMovimento>())
                .transpose()?
                .unwrap_or(defaults.tipo_financeiro),
            data_negociacao_inicio: non_empty(self.data_negociacao_inicio)
                .or(defaults.data_negociacao_inicio),
            data_negociacao_final: non_empty(self.data_negociacao_final)
                .or(defaults.data_negociacao_final),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerQuery {
    pub search_code: Option<String>,
    pub search_name: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PartnerQuery {
    fn default() -> Self {
        Self {
            search_code: None,
            search_name: None,
            page: 1,
            page_size: 50,
        }
    }
}

impl PartnerQuery {
    pub fn by_code(code: &str) -> Self {
        Self {
            search_code: Some(code.to_string()),
            page_size: 1,
            ..Self::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(code) = self.search_code.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("searchCode", code.to_string()));
        }
        if let Some(name) = self.search_name.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("searchName", name.to_string()));
        }
        pairs
    }
}

/// 畫面用的應收帳款資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Titulo {
    pub nro_titulo: String,
    pub parceiro: String,
    pub cod_parceiro: String,
    pub valor: f64,
    pub data_vencimento: String,
    pub data_negociacao: String,
    pub status: TituloStatus,
    pub tipo_financeiro: TipoFinanceiro,
    pub tipo_titulo: TipoTitulo,
    pub conta_bancaria: Option<String>,
    pub historico: Option<String>,
    pub numero_parcela: Option<i64>,
    pub origem_financeiro: Option<String>,
    pub codigo_empresa: Option<i64>,
    pub codigo_natureza: Option<i64>,
    pub boleto: Boleto,
}

impl Titulo {
    pub fn can_download_boleto(&self) -> bool {
        self.tipo_titulo == TipoTitulo::Boleto && self.status != TituloStatus::Baixado
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitulosResponse {
    pub titulos: Vec<Titulo>,
    pub pagination: Pagination,
}
