use crate::domain::model::{Boleto, StatusFiltro, TipoFinanceiro, TipoTitulo, TituloStatus};
use chrono::NaiveDate;
use serde_json::Value;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// 取日期部分："2024-01-05 00:00:00" -> "2024-01-05"
pub fn date_part(raw: &str) -> &str {
    let raw = raw.trim();
    raw.split([' ', 'T']).next().unwrap_or(raw)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = date_part(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

/// 查 Baixado 時一律是 Baixado；其他情況看到期日是否早於今天（只比日期）
pub fn status_for(filter: StatusFiltro, data_vencimento: &str, today: NaiveDate) -> TituloStatus {
    if filter == StatusFiltro::Baixado {
        return TituloStatus::Baixado;
    }

    match parse_date(data_vencimento) {
        Some(vencimento) if vencimento < today => TituloStatus::Vencido,
        _ => TituloStatus::Aberto,
    }
}

/// provisao 可能是 true / "S" / 1 / "1"
pub fn tipo_financeiro(provisao: &Value) -> TipoFinanceiro {
    let is_provisao = match provisao {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => s == "S" || s == "1",
        _ => false,
    };

    if is_provisao {
        TipoFinanceiro::Provisao
    } else {
        TipoFinanceiro::Real
    }
}

pub fn tipo_titulo(boleto: &Boleto) -> TipoTitulo {
    match boleto.nosso_numero.as_deref() {
        Some(nosso_numero) if !nosso_numero.is_empty() => TipoTitulo::Boleto,
        _ => TipoTitulo::Duplicata,
    }
}

pub fn conta_bancaria(codigo: Option<i64>) -> Option<String> {
    codigo
        .filter(|c| *c != 0)
        .map(|c| format!("Conta {}", c))
}
