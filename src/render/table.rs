use crate::domain::model::{Pagination, Partner, Titulo};
use crate::render::format::{format_brl, format_date_br};
use crate::utils::error::Result;
use std::io::Write;

const HEADERS: [&str; 7] = [
    "Nro Título",
    "Parceiro",
    "Valor (R$)",
    "Vencimento",
    "Tipo",
    "Status",
    "Ações",
];

/// 這幾欄靠右對齊
const RIGHT_ALIGNED: [usize; 1] = [2];

pub const EMPTY_MESSAGE: &str = "Nenhum título encontrado para os filtros selecionados";

fn row_for(titulo: &Titulo) -> [String; 7] {
    let acao = if titulo.can_download_boleto() {
        "Boleto".to_string()
    } else {
        String::new()
    };

    [
        titulo.nro_titulo.clone(),
        titulo.parceiro.clone(),
        format_brl(titulo.valor),
        format_date_br(&titulo.data_vencimento),
        titulo.tipo_financeiro.to_string(),
        titulo.status.to_string(),
        acao,
    ]
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right {
        format!("{}{}", fill, cell)
    } else {
        format!("{}{}", cell, fill)
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| pad(cell, *width, RIGHT_ALIGNED.contains(&i)))
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}

pub fn render_table(titulos: &[Titulo], pagination: &Pagination, current_page: u32) -> String {
    let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = titulos.iter().map(|t| row_for(t).to_vec()).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");

    let mut lines = vec![render_line(&headers, &widths), separator];
    if rows.is_empty() {
        lines.push(EMPTY_MESSAGE.to_string());
    } else {
        lines.extend(rows.iter().map(|row| render_line(row, &widths)));
    }

    if pagination.total_count() > 0 {
        lines.push(String::new());
        lines.push(format!(
            "Total de registros: {}  │  Página {}{}",
            pagination.total,
            current_page,
            if pagination.has_more() {
                "  │  Próxima página disponível"
            } else {
                ""
            }
        ));
    }

    lines.join("\n")
}

/// 單筆 título 的明細卡片
pub fn render_details(titulo: &Titulo) -> String {
    let mut lines = vec![
        "Detalhes do Título".to_string(),
        format!("  Número do Título : {}", titulo.nro_titulo),
        format!("  Status           : {}", titulo.status),
        format!("  Tipo Financeiro  : {}", titulo.tipo_financeiro),
        format!("  Parceiro         : {}", titulo.parceiro),
        format!("  Cód. Parceiro    : {}", titulo.cod_parceiro),
        format!("  Valor            : {}", format_brl(titulo.valor)),
        format!(
            "  Vencimento       : {}",
            format_date_br(&titulo.data_vencimento)
        ),
        format!(
            "  Negociação       : {}",
            format_date_br(&titulo.data_negociacao)
        ),
        format!("  Tipo de Título   : {}", titulo.tipo_titulo),
    ];

    if let Some(conta) = &titulo.conta_bancaria {
        lines.push(format!("  Conta Bancária   : {}", conta));
    }
    if let Some(historico) = titulo.historico.as_deref().filter(|h| !h.is_empty()) {
        lines.push(format!("  Histórico        : {}", historico));
    }

    let boleto = &titulo.boleto;
    if let Some(nosso_numero) = boleto.nosso_numero.as_deref().filter(|n| !n.is_empty()) {
        lines.push(String::new());
        lines.push("  Informações do Boleto".to_string());
        lines.push(format!("    Nosso Número     : {}", nosso_numero));
        if let Some(linha) = boleto.linha_digitavel.as_deref().filter(|l| !l.is_empty()) {
            lines.push(format!("    Linha Digitável  : {}", linha));
        }
        if let Some(codigo) = boleto.codigo_barras.as_deref().filter(|c| !c.is_empty()) {
            lines.push(format!("    Código de Barras : {}", codigo));
        }
    }

    if titulo.can_download_boleto() {
        lines.push(String::new());
        lines.push(format!(
            "  Baixar boleto: sankhya-receivables boleto {} --parceiro {}",
            titulo.nro_titulo, titulo.cod_parceiro
        ));
    }

    lines.join("\n")
}

pub fn render_partners(partners: &[Partner]) -> String {
    if partners.is_empty() {
        return "Nenhum parceiro encontrado".to_string();
    }

    let width = partners
        .iter()
        .map(|p| p.codparc.chars().count())
        .max()
        .unwrap_or(0);

    partners
        .iter()
        .map(|p| {
            let name = p.display_name().unwrap_or("-");
            match p.cgc_cpf.as_deref().filter(|doc| !doc.is_empty()) {
                Some(doc) => format!("{}  {} - {}", pad(&p.codparc, width, true), name, doc),
                None => format!("{}  {}", pad(&p.codparc, width, true), name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSV 匯出，欄位與表格一致，另外加上原始日期與代碼
pub fn write_csv<W: Write>(titulos: &[Titulo], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "nroTitulo",
        "codParceiro",
        "parceiro",
        "valor",
        "dataVencimento",
        "dataNegociacao",
        "tipoFinanceiro",
        "tipoTitulo",
        "status",
        "nossoNumero",
    ])?;

    for titulo in titulos {
        let record = [
            titulo.nro_titulo.clone(),
            titulo.cod_parceiro.clone(),
            titulo.parceiro.clone(),
            format!("{:.2}", titulo.valor),
            titulo.data_vencimento.clone(),
            titulo.data_negociacao.clone(),
            titulo.tipo_financeiro.to_string(),
            titulo.tipo_titulo.to_string(),
            titulo.status.to_string(),
            titulo.boleto.nosso_numero.clone().unwrap_or_default(),
        ];
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
