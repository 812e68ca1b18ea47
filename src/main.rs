use clap::Parser;
use label_relay::utils::{logger, validation::Validate};
use label_relay::{server, CliArgs, LabelIntake};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_server_logger(args.verbose, config.json_logs());
    tracing::info!("Starting label-relay");
    if !args.config_file_exists() {
        tracing::warn!(
            "Config file '{}' not found, using defaults and environment",
            args.config
        );
    }
    if let Some(provider) = args.provider {
        tracing::info!("🔧 Distance provider overridden to: {}", provider.as_str());
    }
    tracing::debug!("Config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitoring_enabled() {
        tracing::info!("🔍 Per-stage resource monitoring enabled");
    }

    let intake = Arc::new(LabelIntake::from_config(&config)?);
    tracing::info!(
        "Distance provider: {}, form: {}, webdriver: {}",
        intake.distance_provider(),
        config.browser.form_url,
        config.browser.webdriver_url
    );

    let app = server::router(intake, config.server.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    server::serve(listener, app).await?;

    Ok(())
}
