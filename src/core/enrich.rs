use crate::domain::model::PartnerQuery;
use crate::domain::ports::PartnerDirectory;
use std::collections::{HashMap, HashSet};

pub fn fallback_partner_name(codigo: &str) -> String {
    format!("Parceiro {}", codigo)
}

/// 依序查每個不重複的 parceiro 代碼；查詢失敗只記錄，不中斷。
/// 空白代碼不查，直接用預設名稱（空的 searchCode 會變成不帶條件的清單）
pub async fn resolve_partner_names<D>(directory: &D, codigos: &[String]) -> HashMap<String, String>
where
    D: PartnerDirectory + ?Sized,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names = HashMap::new();

    for codigo in codigos {
        let codigo = codigo.trim();
        if codigo.is_empty() {
            tracing::debug!("Skipping partner lookup for empty codigoParceiro");
            continue;
        }
        if !seen.insert(codigo) {
            continue;
        }

        match directory.search_partners(&PartnerQuery::by_code(codigo)).await {
            Ok(partners) => {
                if let Some(partner) = partners.first() {
                    let name = partner
                        .display_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| fallback_partner_name(codigo));
                    names.insert(codigo.to_string(), name);
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Partner lookup for {} failed: {}", codigo, e);
            }
        }
    }

    tracing::debug!("Resolved {} of {} partner names", names.len(), seen.len());
    names
}

pub fn partner_name(names: &HashMap<String, String>, codigo: &str) -> String {
    names
        .get(codigo.trim())
        .cloned()
        .unwrap_or_else(|| fallback_partner_name(codigo))
}
