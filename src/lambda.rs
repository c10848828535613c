#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "lambda")]
use warehouse_etl::config::lambda::{LambdaConfig, S3SnapshotSource, S3Storage};
#[cfg(feature = "lambda")]
use warehouse_etl::core::ConfigProvider;
#[cfg(feature = "lambda")]
use warehouse_etl::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use warehouse_etl::{EtlEngine, JsonFileLookup, OutputFormat, TransformationOrchestrator};

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct Request {
    pub ingestion_prefix: Option<String>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub written: Vec<String>,
    pub tables_written: usize,
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    tracing::info!("Starting warehouse transform Lambda function");

    // 創建Lambda配置，事件可覆蓋讀取前綴
    let mut lambda_config = LambdaConfig::from_env()?;
    if let Some(prefix) = event.payload.ingestion_prefix {
        lambda_config.ingestion_prefix = prefix;
    }
    lambda_config.validate()?;
    let formats = OutputFormat::parse_list(lambda_config.output_formats())?;

    // 創建AWS配置和S3客戶端
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let s3_client = S3Client::from_conf(config);

    let source = S3SnapshotSource::new(
        s3_client.clone(),
        lambda_config.ingestion_bucket.clone(),
        lambda_config.ingestion_prefix.clone(),
    );
    let lookup = JsonFileLookup::new(lambda_config.lookup_path());
    let storage = S3Storage::new(s3_client, lambda_config.processed_bucket.clone());

    let orchestrator = TransformationOrchestrator::new(source, lookup);
    let engine = EtlEngine::new(orchestrator, storage, formats.clone());
    let written = engine.run().await?;

    let response = Response {
        message: "Warehouse transform completed successfully".to_string(),
        tables_written: written.len() / formats.len().max(1),
        written,
    };

    tracing::info!(
        "Warehouse transform completed: {} tables",
        response.tables_written
    );
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
