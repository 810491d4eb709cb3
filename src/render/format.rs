use crate::core::classify::parse_date;

/// pt-BR 貨幣格式：千分位用 `.`，小數用 `,`
pub fn format_brl(valor: f64) -> String {
    let cents = (valor.abs() * 100.0).round() as u64;
    let reais = cents / 100;
    let centavos = cents % 100;

    let digits = reais.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if valor < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, centavos)
}

/// "2024-01-05" -> "05/01/2024"；解析不了就原樣輸出
pub fn format_date_br(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}
