use clap::Parser;
use grace_core::GraceConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use grace_server::http;
use grace_server::relay::RelayService;

#[derive(Parser, Debug)]
#[command(author, version, about = "Grace chat relay", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "grace.toml")]
    config: String,

    /// Validate configuration and credential, print the rendered system prompt, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match GraceConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let relay = match RelayService::from_config(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Refusing to start: {}", e);
            eprintln!(
                "Set {} or enable http.allow_missing_credential to serve in degraded mode",
                config.provider.api_key_env()
            );
            std::process::exit(1);
        }
    };

    if args.check {
        println!(
            "✅ Provider: {} ({})",
            config.provider.kind.as_str(),
            config.provider.model()
        );
        if relay.is_configured() {
            println!("✅ Credential present in {}", config.provider.api_key_env());
        } else {
            println!("⚠️  No credential in {} — degraded mode", config.provider.api_key_env());
        }
        println!("\n{}", relay.system_prompt());
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(config.http.clone(), relay, tx.subscribe()).await?;

    Ok(())
}
