use catalog_etl::core::engine::normalize_corpus;
use catalog_etl::utils::error::ErrorSeverity;
use catalog_etl::utils::{logger, validation::Validate};
use catalog_etl::{
    CatalogConfig, CatalogEngine, CatalogError, CliConfig, Command, CrosslistNormalizer,
    HttpRegistrarFeed, JsonListingStore, LocalStorage, ReconcileSummary, TermCode,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting catalog-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match CatalogConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config, args.command).await {
        tracing::error!(
            "❌ catalog-etl failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

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

    Ok(())
}

async fn run(config: &CatalogConfig, command: Command) -> Result<(), CatalogError> {
    let store = JsonListingStore::new(
        LocalStorage::new(&config.store.path),
        config.store.listings_file.clone(),
    );

    match command {
        Command::Normalize { corpus_dir } => {
            let corpus_dir = corpus_dir.unwrap_or_else(|| config.normalize.corpus_dir.clone());
            let normalizer = CrosslistNormalizer::new(config.normalize.sentinels.clone());
            let output = LocalStorage::new(&config.normalize.output_path);

            let report = normalize_corpus(&corpus_dir, &normalizer, &store, &output).await?;
            println!(
                "✅ {} canonical groups, {} duplicate codes, {} integrity faults",
                report.groups.len(),
                report.duplicates.len(),
                report.integrity_faults
            );
            for warning in &report.warnings {
                println!("⚠️ {}", warning);
            }
        }
        Command::Reconcile { term, dry_run } => {
            let engine = build_engine(config, store)?;
            let term = TermCode(term);

            let summary = if dry_run {
                tracing::info!("🔍 DRY RUN MODE - no listings will be written");
                engine.plan_term(term).await?.preview()
            } else {
                engine.reconcile_term(term).await?
            };
            print_summary(&summary);
        }
        Command::ReconcileAll => {
            let engine = build_engine(config, store)?;
            for summary in engine.reconcile_all_terms().await? {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

fn build_engine(
    config: &CatalogConfig,
    store: JsonListingStore<LocalStorage>,
) -> Result<CatalogEngine<HttpRegistrarFeed, JsonListingStore<LocalStorage>>, CatalogError> {
    let feed = HttpRegistrarFeed::new(config.registrar.term_url.clone(), config.auth_bearer())
        .with_timeout(config.request_timeout());
    Ok(CatalogEngine::new(feed, store, config.term_order()?))
}

fn print_summary(summary: &ReconcileSummary) {
    let term = summary
        .term
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "📊 Term {}: {} inserted, {} updated, {} unchanged",
        term, summary.inserts, summary.updates, summary.unchanged
    );
    for failure in &summary.failures {
        println!("❌ {}: {}", failure.id, failure.message);
    }
    for warning in &summary.warnings {
        println!("⚠️ {}", warning);
    }
}
