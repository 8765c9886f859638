use anyhow::{bail, Context, Result};
use banwatch::{logging, platform, replay, AppConfig, Service};

#[derive(Debug)]
struct Cli {
    config_path: Option<String>,
    replay_path: Option<String>,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut config_path: Option<String> = None;
        let mut replay_path: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                    config_path = Some(value);
                }
                "--replay" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--replay requires a path"))?;
                    replay_path = Some(value);
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: banwatch [--config <path>] [--replay <capture>]\n\
                         --config <path>   Path to TOML configuration (default: config/banwatch.toml)\n\
                         --replay <path>   Replay a 'date time counter' capture file instead of polling"
                    );
                    std::process::exit(0);
                }
                other => {
                    if config_path.is_none() {
                        config_path = Some(other.to_string());
                    } else {
                        bail!("unknown argument '{other}'");
                    }
                }
            }
        }

        Ok(Self {
            config_path,
            replay_path,
        })
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse()?;

    // An explicit --config must load or the process refuses to start; the
    // default path is optional and falls back to built-in defaults.
    let config = match &cli.config_path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("unable to load configuration from {path}"))?,
        None => {
            let default_path = AppConfig::default_path();
            if std::path::Path::new(default_path).exists() {
                AppConfig::load(default_path)
                    .with_context(|| format!("unable to load configuration from {default_path}"))?
            } else {
                AppConfig::default()
            }
        }
    };

    let _log_guard = logging::init(&config)?;
    platform::log_platform_guidance();

    if let Some(capture) = cli.replay_path {
        tracing::info!(capture = %capture, data_dir = %config.data_directory, "replaying counter capture");
        replay::replay_capture(capture, &config).await
    } else {
        Service::new(config).run().await
    }
}
