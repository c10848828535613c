use clap::Parser;
use warehouse_etl::core::ConfigProvider;
use warehouse_etl::utils::error::ErrorSeverity;
use warehouse_etl::utils::{logger, validation::Validate};
use warehouse_etl::{
    CliConfig, EtlEngine, JsonFileLookup, LocalSnapshotSource, LocalStorage, OutputFormat,
    TransformationOrchestrator,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting warehouse-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    let formats = OutputFormat::parse_list(config.output_formats())?;

    // 組裝資料來源、查詢表與存儲
    let source = LocalSnapshotSource::new(config.snapshot_path());
    let lookup = JsonFileLookup::new(config.lookup_path());
    let storage = LocalStorage::new(config.output_path.clone());
    let orchestrator = TransformationOrchestrator::new(source, lookup);
    let engine = EtlEngine::new(orchestrator, storage, formats);

    match engine.run().await {
        Ok(written) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            for key in &written {
                println!("📁 {}/{}", config.output_path, key);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
