use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dlna_compliance::{ComplianceSuite, SuiteReport, TesterConfig, DEFAULT_TIMEOUT};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

pub mod render;

use render::{render_json, render_json_error, RenderOptions, TextRenderer};

/// DLNA/UPnP Media Server Compliance Tester
///
/// Checks a media server's device description, ContentDirectory and
/// ConnectionManager services, catalog metadata and media resources,
/// then grades the server on a weighted score.
#[derive(Parser, Debug)]
#[command(name = "dlna-tester")]
#[command(about = "DLNA/UPnP Media Server Compliance Tester")]
#[command(version = "0.1.0")]
pub struct Args {
    /// DLNA server IP address or hostname
    pub host: String,

    /// DLNA server port number
    pub port: u16,

    /// Show every result message and narrate each step
    #[arg(short, long)]
    pub verbose: bool,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: f64,

    /// Traverse every container instead of sampling one branch
    #[arg(long)]
    pub full_scan: bool,

    /// Item budget of a full scan
    #[arg(long, default_value = "1000")]
    pub max_items: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Get the request timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow::anyhow!("Host must not be empty"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!("Port must not be 0"));
        }

        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(anyhow::anyhow!(
                "Timeout must be a positive number of seconds, got {}",
                self.timeout
            ));
        }

        if self.max_items == 0 {
            return Err(anyhow::anyhow!("Max items must be at least 1"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub verbose: bool,
    pub full_scan: bool,
    pub max_items: usize,
    pub json: bool,
    pub use_colors: bool,
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let timeout = args.timeout_duration();

        Self {
            host: args.host,
            port: args.port,
            timeout,
            verbose: args.verbose,
            full_scan: args.full_scan,
            max_items: args.max_items,
            json: args.json,
            use_colors: !args.no_color,
            log_level: args.log_level,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let mut args = Args::parse();

        if let Ok(timeout) = std::env::var("DLNA_TESTER_TIMEOUT") {
            args.timeout = timeout
                .parse()
                .context("Invalid DLNA_TESTER_TIMEOUT environment variable")?;
        }

        if let Ok(max_items) = std::env::var("DLNA_TESTER_MAX_ITEMS") {
            args.max_items = max_items
                .parse()
                .context("Invalid DLNA_TESTER_MAX_ITEMS environment variable")?;
        }

        if let Ok(log_level) = std::env::var("DLNA_TESTER_LOG_LEVEL") {
            args.log_level = log_level;
        }

        if std::env::var("DLNA_TESTER_FULL_SCAN").is_ok() {
            args.full_scan = true;
        }

        if std::env::var("DLNA_TESTER_NO_COLOR").is_ok() {
            args.no_color = true;
        }

        args.validate()?;

        Ok(Config::from(args))
    }

    /// Core configuration of the run
    pub fn tester_config(&self) -> TesterConfig {
        TesterConfig::new(self.host.clone(), self.port)
            .with_timeout(self.timeout)
            .with_verbose(self.verbose)
            .with_full_scan(self.full_scan, self.max_items)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            use_colors: self.use_colors,
            verbose: self.verbose,
        }
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Target: {}:{}", self.host, self.port);
        info!("  Timeout: {}s", self.timeout.as_secs_f64());
        info!("  Full scan: {}", self.full_scan);
        info!("  Max items: {}", self.max_items);
        info!("  JSON output: {}", self.json);
        info!("  Use colors: {}", self.use_colors);
        info!("  Log level: {}", self.log_level);
    }
}

/// Initialize tracing/logging with the specified log level
///
/// Logs go to stderr so stdout carries only the report.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match log_level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "warn",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Open a session against the configured server and run every phase
fn run_suite(config: &Config) -> Result<SuiteReport> {
    let suite = ComplianceSuite::new(config.tester_config())
        .context("Failed to start compliance run")?;
    Ok(suite.run())
}

fn exit_code(report: &SuiteReport) -> ExitCode {
    if report.has_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_json(config: &Config) -> Result<ExitCode> {
    match run_suite(config) {
        Ok(report) => {
            println!("{}", render_json(&report)?);
            Ok(exit_code(&report))
        }
        Err(e) => {
            error!("Compliance run failed: {:#}", e);
            println!("{}", render_json_error(&format!("{:#}", e))?);
            Ok(ExitCode::from(2))
        }
    }
}

fn run_interactive(config: &Config) -> Result<ExitCode> {
    let renderer = TextRenderer::new(config.render_options());
    println!("{}", renderer.banner(&config.tester_config(), Local::now()));

    match run_suite(config) {
        Ok(report) => {
            println!("{}", renderer.report(&report));
            Ok(exit_code(&report))
        }
        Err(e) => {
            error!("Compliance run failed: {:#}", e);
            println!();
            println!("{}", renderer.error(&format!("{:#}", e)));
            Ok(ExitCode::from(2))
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env().context("Failed to parse configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("Error: failed to initialize logging: {:#}", e);
        return ExitCode::from(2);
    }

    config.print_summary();

    let outcome = if config.json {
        run_json(&config)
    } else {
        run_interactive(&config)
    };

    outcome.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        ExitCode::from(2)
    })
}
