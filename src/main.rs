use std::process;
use std::time::Duration;

use clap::Parser;

use sentinel_smoke::config::DEFAULT_MASTER_NAME;
use sentinel_smoke::logging::{self, LogFormat};
use sentinel_smoke::{RedisSentinelStore, SentinelConfig, SmokeResult, SmokeTest};

#[derive(Parser, Debug)]
#[command(name = "sentinel-smoke", version)]
#[command(
    about = "Smoke test a Redis deployment through Sentinel",
    long_about = "Smoke test a Redis deployment through Sentinel.\n\n\
                  Reads SENTINEL_ADDRESS (host:port) and SENTINEL_PASSWORD from the environment."
)]
struct Cli {
    /// Master name monitored by Sentinel
    #[arg(long, default_value = DEFAULT_MASTER_NAME)]
    master_name: String,

    /// Logical database index
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
    db: i64,

    /// Per-command timeout, e.g. "5s" or "500ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Smoke test failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

impl Cli {
    /// Layer the command-line settings over the environment config.
    fn configure(&self, config: SentinelConfig) -> SentinelConfig {
        config
            .with_master_name(self.master_name.as_str())
            .with_database(self.db)
            .with_command_timeout(self.timeout)
    }
}

async fn run(cli: Cli) -> SmokeResult<()> {
    let config = cli.configure(SentinelConfig::from_env()?);
    tracing::debug!(?config, "Loaded configuration");

    let mut store = RedisSentinelStore::new(&config)?;
    let mut test = SmokeTest::new(std::io::stdout().lock());
    test.run(&mut store).await?;
    Ok(())
}
