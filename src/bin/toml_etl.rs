use clap::Parser;
#[cfg(feature = "lambda")]
use warehouse_etl::config::lambda::S3SnapshotSource;
use warehouse_etl::config::toml_config::{SourceKind, TomlConfig};
use warehouse_etl::core::{ConfigProvider, RawDataSource};
use warehouse_etl::utils::error::ErrorSeverity;
use warehouse_etl::utils::{logger, validation::Validate};
use warehouse_etl::{
    EtlEngine, JsonFileLookup, LocalSnapshotSource, LocalStorage, TransformationOrchestrator,
};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Warehouse transformation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dry run - transform and summarise without writing any output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_cli_logger_with_level(
        args.verbose || config.monitoring_enabled(),
        config.log_level(),
    );
    tracing::info!("🚀 Starting TOML-based warehouse ETL");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let result = match config.source.r#type {
        SourceKind::Local => {
            let source = LocalSnapshotSource::new(config.snapshot_path());
            run_pipeline(source, &config, args.dry_run).await
        }
        SourceKind::S3 => run_s3_pipeline(&config, args.dry_run).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

/// 從 S3 讀取快照，輸出仍寫入本地 load.output_path
#[cfg(feature = "lambda")]
async fn run_s3_pipeline(config: &TomlConfig, dry_run: bool) -> warehouse_etl::Result<()> {
    let (bucket, prefix) = config.s3_location()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_s3::Client::new(&aws_config);

    tracing::info!("📥 Reading snapshot from s3://{}/{}", bucket, prefix);
    let source = S3SnapshotSource::new(client, bucket.to_string(), prefix.to_string());
    run_pipeline(source, config, dry_run).await
}

#[cfg(not(feature = "lambda"))]
async fn run_s3_pipeline(_config: &TomlConfig, _dry_run: bool) -> warehouse_etl::Result<()> {
    Err(warehouse_etl::EtlError::ConfigError {
        message: "source.type = \"s3\" needs a build with the `lambda` feature".to_string(),
    })
}

async fn run_pipeline<S: RawDataSource>(
    source: S,
    config: &TomlConfig,
    dry_run: bool,
) -> warehouse_etl::Result<()> {
    let lookup = JsonFileLookup::new(config.lookup_path());
    let orchestrator = TransformationOrchestrator::new(source, lookup);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let outcomes = orchestrator.run_outcomes().await?;

        println!("🔍 Dry Run Analysis:");
        for (table, outcome) in &outcomes {
            match outcome.table() {
                Some(t) => println!(
                    "  ✅ {:<18} {} rows, {} columns",
                    table,
                    t.len(),
                    t.columns().len()
                ),
                None => println!("  ⚠️ {:<18} skipped", table),
            }
        }
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = EtlEngine::new(orchestrator, storage, config.formats()?);
    let written = engine.run().await?;

    tracing::info!("✅ ETL process completed successfully!");
    println!("✅ ETL process completed successfully!");
    for key in &written {
        println!("📁 {}/{}", config.output_path(), key);
    }
    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("-")
    );
    match config.source.bucket.as_deref() {
        Some(bucket) if config.source.r#type == SourceKind::S3 => {
            println!("  Source: S3 s3://{}/{}", bucket, config.snapshot_path())
        }
        _ => println!("  Source: {:?} {}", config.source.r#type, config.snapshot_path()),
    }
    println!("  Lookup: {}", config.lookup_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
