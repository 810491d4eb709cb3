use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sankhya-receivables")]
#[command(about = "Títulos a receber do Sankhya: tabela no terminal e proxy JSON")]
pub struct CliConfig {
    /// Path to TOML configuration file (default: ./sankhya.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List títulos a receber for one partner
    Titulos(TitulosArgs),

    /// Search partners by name
    Parceiros(ParceirosArgs),

    /// Download the boleto PDF of one título
    Boleto(BoletoArgs),

    /// Run the JSON proxy server
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, clap::Args)]
pub struct TitulosArgs {
    /// Partner code (CODPARC), required like on the web screen
    #[arg(short, long)]
    pub parceiro: String,

    /// Tipo de movimento: real, provisao, todos (or 1, 2, 3)
    #[arg(short, long)]
    pub tipo: String,

    #[arg(long, default_value_t = 1)]
    pub pagina: u32,

    /// Empresa code; defaults to defaults.codigo_empresa from the config
    #[arg(long)]
    pub empresa: Option<String>,

    /// Status financeiro: aberto, baixado, todos (or 1, 2, 3)
    #[arg(long, default_value = "todos")]
    pub status: String,

    #[arg(long)]
    pub negociacao_inicio: Option<String>,

    #[arg(long)]
    pub negociacao_final: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub formato: OutputFormat,

    /// Show the detail card of one título instead of the table
    #[arg(long)]
    pub detalhes: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ParceirosArgs {
    /// Name filter; terms shorter than 2 characters list everything
    #[arg(short, long)]
    pub busca: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub pagina: u32,

    /// Page size; defaults to defaults.partner_page_size from the config
    #[arg(long)]
    pub limite: Option<u32>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct BoletoArgs {
    /// Título number (nroTitulo)
    pub nro: String,

    /// Partner code the título belongs to
    #[arg(short, long)]
    pub parceiro: String,

    #[arg(long, default_value_t = 1)]
    pub pagina: u32,

    /// Output directory; defaults to output.boleto_dir from the config
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ServeArgs {
    /// Bind address; defaults to server.bind from the config
    #[arg(long)]
    pub bind: Option<String>,
}
