use clap::Parser;
use cryptomonitor::api::telegram::TelegramNotifier;
use cryptomonitor::api::yahoo::YahooChartSource;
use cryptomonitor::api::{NotificationSink, PriceSource};
use cryptomonitor::config::{parse_symbols, MonitorSettings, TelegramCredentials};
use cryptomonitor::monitor::SamplingInterval;
use cryptomonitor::ui::{headless, Dashboard};
use cryptomonitor::{MonitorEngine, MonitorError};
use env_logger::{Builder, Target, WriteStyle};
use log::{error, info, LevelFilter};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_LOG_FILE: &str = "cryptomonitor.log";

#[derive(Parser)]
#[command(name = "cryptomonitor")]
#[command(version, about = "Alerts on crypto price variations", long_about = None)]
struct Cli {
    /// Minimum absolute variation (percent) that triggers an alert
    #[arg(short, long, default_value_t = 5.0)]
    threshold: f64,

    /// Sampling interval: 1m, 5m, 15m, 30m or 1h
    #[arg(short, long, default_value = "5m")]
    interval: SamplingInterval,

    /// Comma separated symbols to watch (default: 20 major USD pairs)
    #[arg(long)]
    symbols: Option<String>,

    /// Minimum seconds between two alerts for the same symbol
    #[arg(long, default_value_t = 300)]
    cooldown_secs: u64,

    /// Seconds between the end of one tick and the start of the next
    #[arg(long, default_value_t = 60)]
    tick_secs: u64,

    #[arg(long, default_value_t = 15)]
    fetch_timeout_secs: u64,

    #[arg(long, default_value_t = 10)]
    delivery_timeout_secs: u64,

    /// Symbols fetched concurrently within a tick
    #[arg(long, default_value_t = 4)]
    fetch_concurrency: usize,

    /// Do not send Telegram alerts
    #[arg(long)]
    no_notifications: bool,

    /// Exit instead of running silently when the Telegram self-test fails
    #[arg(long)]
    require_notifications: bool,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    /// Log to stderr instead of running the terminal dashboard
    #[arg(long)]
    headless: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Log file (dashboard mode defaults to cryptomonitor.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> MonitorSettings {
        let defaults = MonitorSettings::default();
        MonitorSettings {
            symbols: self
                .symbols
                .as_deref()
                .map(parse_symbols)
                .unwrap_or(defaults.symbols),
            threshold_pct: self.threshold,
            interval: self.interval,
            cooldown: Duration::from_secs(self.cooldown_secs),
            tick_period: Duration::from_secs(self.tick_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            delivery_timeout: Duration::from_secs(self.delivery_timeout_secs),
            fetch_concurrency: self.fetch_concurrency,
            enable_notifications: !self.no_notifications,
        }
    }

    fn log_file(&self) -> Option<PathBuf> {
        match (&self.log_file, self.headless) {
            (Some(path), _) => Some(path.clone()),
            (None, false) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
            (None, true) => None,
        }
    }
}

fn init_logger(level: LevelFilter, log_file: Option<PathBuf>) -> Result<(), MonitorError> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module("cryptomonitor", level)
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        });

    match log_file {
        // The dashboard owns the terminal, so logs go to a file.
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never);
        }
        None => {
            builder.target(Target::Stderr).write_style(WriteStyle::Auto);
        }
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logger(cli.log_level, cli.log_file())?;

    let settings = cli.settings();
    settings.validate()?;

    info!(
        "Starting price monitor: {} symbols, threshold {}%, interval {}, cooldown {:?}",
        settings.symbols.len(),
        settings.threshold_pct,
        settings.interval,
        settings.cooldown
    );

    let source: Arc<dyn PriceSource> = Arc::new(YahooChartSource::new(settings.fetch_timeout)?);

    let notifier: Option<Arc<dyn NotificationSink>> = if settings.enable_notifications {
        let credentials = TelegramCredentials::from_parts(
            cli.telegram_token.clone(),
            cli.telegram_chat_id.clone(),
        )?;
        let telegram: Arc<dyn NotificationSink> =
            Arc::new(TelegramNotifier::new(credentials, settings.delivery_timeout)?);
        Some(telegram)
    } else {
        info!("Notifications disabled");
        None
    };

    let mut engine = match MonitorEngine::start(&settings, Arc::clone(&source), notifier).await {
        Ok(engine) => engine,
        Err(MonitorError::SelfTest(e)) if !cli.require_notifications => {
            error!(
                "Notification self-test failed, continuing without notifications: {}",
                e
            );
            MonitorEngine::new(&settings, source, None)?
        }
        Err(e) => return Err(e.into()),
    };

    if cli.headless {
        headless::run(&mut engine, &settings).await?;
    } else {
        let mut dashboard = Dashboard::new(settings.clone(), engine.notifications_enabled());
        dashboard.run(&mut engine).await?;
    }

    info!("Shutdown complete");
    Ok(())
}
