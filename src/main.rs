use anyhow::{Context, Result};
use clap::Parser;

use tinylink::config::{AppConfig, Cli, Commands};
use tinylink::runtime::modes::run_server;
use tinylink::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.command == Some(Commands::ConfigGen) {
        print!("{}", AppConfig::generate_sample_config());
        return Ok(());
    }

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    // guard 必须活到 main 结束，否则文件日志会丢失尾部
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(
        "tinylink v{} starting (storage: {}, cache: {})",
        env!("CARGO_PKG_VERSION"),
        redact_url(&config.database.database_url),
        config.cache.cache_type
    );

    run_server(config).await
}

/// 去掉连接串中的密码部分
fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
