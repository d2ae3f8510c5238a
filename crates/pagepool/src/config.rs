//! Application configuration from CLI flags, environment, and settings files.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use pagepool_core::config::parse_duration;
use pagepool_core::{ConfigError, Locale, PoolSettings};

/// Drive a page instance pool with synthetic concurrent requests.
#[derive(Parser, Debug)]
#[command(name = "pagepool", version, about)]
pub struct AppConfig {
    /// Comma-separated page names to request.
    #[arg(long, default_value = "Index", value_delimiter = ',')]
    pub pages: Vec<String>,

    /// Comma-separated locales to request.
    #[arg(long, default_value = "en", value_delimiter = ',')]
    pub locales: Vec<String>,

    /// Number of concurrent request threads.
    #[arg(short, long, default_value = "8", env = "PAGEPOOL_THREADS",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: u32,

    /// Requests issued by each thread.
    #[arg(short, long, default_value = "100")]
    pub requests: u64,

    /// Time to construct one page instance (e.g. "5ms").
    #[arg(long, default_value = "5ms")]
    pub construct_time: String,

    /// Time one request holds its page (e.g. "1ms").
    #[arg(long, default_value = "1ms")]
    pub render_time: String,

    /// Fraction of requests that leave their page dirty, in [0, 1].
    #[arg(long, default_value = "0", value_parser = parse_fraction)]
    pub dirty_rate: f64,

    /// Comma-separated page names whose construction always fails.
    #[arg(long, value_delimiter = ',')]
    pub broken: Vec<String>,

    /// Pool settings file (JSON). Flags below override its defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// In-use count at which checkouts start waiting.
    #[arg(long)]
    pub soft_limit: Option<usize>,

    /// Ceiling on instances per page and locale.
    #[arg(long)]
    pub hard_limit: Option<usize>,

    /// How long a checkout waits at the soft limit (e.g. "10ms").
    #[arg(long)]
    pub soft_wait: Option<String>,

    /// Idle time before an available instance is evicted (e.g. "10m").
    #[arg(long)]
    pub active_window: Option<String>,

    /// Period between cleanup passes (e.g. "10s").
    #[arg(long)]
    pub cleanup_interval: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (one summary line).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Pool settings: the file (or built-in defaults) with flag overrides applied, validated.
    pub fn pool_settings(&self) -> Result<PoolSettings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => PoolSettings::load(path)?,
            None => PoolSettings::default(),
        };

        let defaults = &mut settings.defaults;
        if let Some(soft) = self.soft_limit {
            defaults.soft_limit = soft;
        }
        if let Some(hard) = self.hard_limit {
            defaults.hard_limit = hard;
        }
        if let Some(wait) = &self.soft_wait {
            defaults.soft_wait = parse_duration(wait)?;
        }
        if let Some(window) = &self.active_window {
            defaults.active_window = parse_duration(window)?;
        }
        if let Some(interval) = &self.cleanup_interval {
            settings.cleanup_interval = parse_duration(interval)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Parsed `--construct-time`.
    pub fn construct_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.construct_time)
    }

    /// Parsed `--render-time`.
    pub fn render_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.render_time)
    }

    /// Requested locales, normalized.
    #[must_use]
    pub fn locale_list(&self) -> Vec<Locale> {
        self.locales
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| Locale::new(l))
            .collect()
    }

    /// Requested page names with blanks removed.
    #[must_use]
    pub fn page_list(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|_| format!("not a number: {s}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1]"))
    }
}
