use clap::Parser;
use sankhya_receivables::config::cli::{
    BoletoArgs, Command, OutputFormat, ParceirosArgs, TitulosArgs,
};
use sankhya_receivables::core::service::sort_by_nro_desc;
use sankhya_receivables::domain::model::{StatusFiltro, TipoMovimento, TitulosQuery};
use sankhya_receivables::render;
use sankhya_receivables::utils::error::ErrorSeverity;
use sankhya_receivables::utils::{logger, validation::Validate};
use sankhya_receivables::{
    AppConfig, CliConfig, LocalStorage, ReceivablesError, ReceivablesService, Result,
    SankhyaClient,
};

type Service = ReceivablesService<SankhyaClient, SankhyaClient>;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.command {
        Command::Serve(_) => logger::init_server_logger(),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Titulos(args) => titulos(&build_service(&config)?, &config, args).await,
        Command::Parceiros(args) => parceiros(&build_service(&config)?, &config, args).await,
        Command::Boleto(args) => boleto(&build_service(&config)?, &config, args).await,
        Command::Serve(args) => {
            let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
            sankhya_receivables::server::serve(&config, &bind).await
        }
    }
}

fn build_service(config: &AppConfig) -> Result<Service> {
    let client = SankhyaClient::new(config)?;
    Ok(ReceivablesService::new(client.clone(), client))
}

fn titulos_query(
    config: &AppConfig,
    parceiro: &str,
    pagina: u32,
    tipo: Option<&str>,
) -> Result<TitulosQuery> {
    Ok(TitulosQuery {
        pagina: pagina.max(1),
        codigo_empresa: config.defaults.codigo_empresa.clone(),
        codigo_parceiro: Some(parceiro.to_string()),
        tipo_financeiro: tipo.map(str::parse::<TipoMovimento>).transpose()?.unwrap_or_default(),
        ..TitulosQuery::default()
    })
}

async fn titulos(service: &Service, config: &AppConfig, args: TitulosArgs) -> Result<()> {
    let mut query = titulos_query(config, &args.parceiro, args.pagina, Some(args.tipo.as_str()))?;
    query.status_financeiro = args.status.parse::<StatusFiltro>()?;
    if let Some(empresa) = args.empresa {
        query.codigo_empresa = empresa;
    }
    query.data_negociacao_inicio = args.negociacao_inicio;
    query.data_negociacao_final = args.negociacao_final;

    let mut response = service.list_titulos(&query).await?;
    sort_by_nro_desc(&mut response.titulos);

    if let Some(nro) = args.detalhes {
        let titulo = response
            .titulos
            .iter()
            .find(|t| t.nro_titulo == nro)
            .ok_or(ReceivablesError::TituloNotFound { nro })?;
        println!("{}", render::render_details(titulo));
        return Ok(());
    }

    match args.formato {
        OutputFormat::Table => {
            println!(
                "{}",
                render::render_table(&response.titulos, &response.pagination, query.pagina)
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Csv => {
            render::write_csv(&response.titulos, std::io::stdout().lock())?;
        }
    }

    Ok(())
}

async fn parceiros(service: &Service, config: &AppConfig, args: ParceirosArgs) -> Result<()> {
    let page_size = args.limite.unwrap_or(config.defaults.partner_page_size);
    let partners = service
        .search_partners(args.busca.as_deref(), args.pagina, page_size)
        .await?;

    println!("{}", render::render_partners(&partners));
    Ok(())
}

async fn boleto(service: &Service, config: &AppConfig, args: BoletoArgs) -> Result<()> {
    let query = titulos_query(config, &args.parceiro, args.pagina, None)?;
    let titulo = service.find_titulo(&query, &args.nro).await?;

    let output_dir = args
        .output
        .unwrap_or_else(|| config.output.boleto_dir.clone());
    let storage = LocalStorage::new(output_dir);

    println!("📄 Preparando download do boleto...");
    let path = service.download_boleto(&titulo, &storage).await?;
    println!("✅ Boleto baixado com sucesso: {}", path);
    Ok(())
}
