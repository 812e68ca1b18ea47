use clap::Parser;
use label_relay::config::toml_config::DistanceProviderKind;
use label_relay::domain::model::{ImageSource, LabelImage};
use label_relay::utils::{logger, validation::Validate};
use label_relay::{LabelIntake, RelayConfig};
use std::path::Path;

#[derive(Parser)]
#[command(name = "process-label")]
#[command(about = "Run one label photo through the booking pipeline without the HTTP server")]
struct Args {
    /// Label photo (JPEG or PNG)
    image: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "label-relay.toml")]
    config: String,

    #[arg(long, value_enum)]
    provider: Option<DistanceProviderKind>,

    /// Stop after the distance step, do not open the browser
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut config = if Path::new(&args.config).exists() {
        RelayConfig::from_file(&args.config)?
    } else {
        tracing::warn!(
            "Config file '{}' not found, using defaults and environment",
            args.config
        );
        RelayConfig::default()
    };
    if let Some(provider) = args.provider {
        config.distance.provider = provider;
    }
    config.resolve_secrets();

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let path = Path::new(&args.image);
    let image = LabelImage {
        bytes: tokio::fs::read(path).await?,
        mime_type: mime_for(path).to_string(),
        source: ImageSource::File,
    };

    let intake = LabelIntake::from_config(&config)?;
    let outcome = if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - browser step skipped");
        intake.preview(&image).await
    } else {
        intake.process(&image).await
    };

    match outcome {
        Ok(receipt) => {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("❌ {}", failure);
            eprintln!("💡 {}", failure.error.recovery_suggestion());
            std::process::exit(2);
        }
    }
}
