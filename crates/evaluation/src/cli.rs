//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{UnknownWeatherPreset, WeatherPreset};
use std::path::PathBuf;

/// TransFuser evaluation harness for the CARLA simulator
#[derive(Parser, Debug)]
#[command(
    name = "transfuser-eval",
    author,
    version,
    about = "Run the TransFuser agent on CARLA",
    long_about = "Runs leaderboard evaluations of the TransFuser agent and drives a local \n\
                  closed loop against a CARLA server (or an in-process mock)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRANSFUSER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRANSFUSER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, global = true, env = "TRANSFUSER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a leaderboard evaluation
    Evaluate(EvaluateArgs),

    /// Drive locally with a constant-control agent
    Drive(DriveArgs),

    /// List weather presets
    Weather,

    /// Print the merged settings
    Config(ConfigArgs),
}

/// Arguments for the `evaluate` command. Unset values come from the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct EvaluateArgs {
    /// Path to TransFuser model weights
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Path to routes file
    #[arg(long)]
    pub routes: Option<PathBuf>,

    /// Path to scenarios file
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Path to checkpoint file
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Track to evaluate (SENSORS or MAP)
    #[arg(long)]
    pub track: Option<String>,

    /// CARLA server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Timeout for each route in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory to save evaluation results
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Path to agent module
    #[arg(long)]
    pub agent: Option<PathBuf>,

    /// Weather preset, display or internal name (see `weather`)
    #[arg(long, value_parser = parse_weather_preset)]
    pub weather_preset: Option<WeatherPreset>,

    /// Print the evaluator command without launching it
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_weather_preset(value: &str) -> Result<WeatherPreset, UnknownWeatherPreset> {
    value.parse()
}

/// Arguments for the `drive` command
#[derive(Args, Debug, Clone)]
pub struct DriveArgs {
    /// Settings file (TOML, JSON or YAML); built-in defaults when omitted
    #[arg(short, long, env = "TRANSFUSER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of control ticks
    #[arg(long, default_value = "200")]
    pub ticks: u64,

    /// Tick rate in Hz
    #[arg(long, default_value = "20")]
    pub hz: f64,

    /// Use the in-process mock simulator
    #[arg(long)]
    pub mock: bool,

    /// Spawn x
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub x: f64,

    /// Spawn y
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub y: f64,

    /// Spawn z (raised slightly before spawning)
    #[arg(long, default_value = "0.5", allow_negative_numbers = true)]
    pub z: f64,

    /// Spawn yaw in degrees
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub yaw: f64,

    /// Constant throttle [0, 1]
    #[arg(long, default_value = "0.3")]
    pub throttle: f64,

    /// Constant steer [-1, 1]
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub steer: f64,

    /// Disable rendering even if enabled in settings
    #[arg(long)]
    pub no_render: bool,
}

/// Arguments for the `config` command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Settings file (TOML, JSON or YAML); built-in defaults when omitted
    #[arg(short, long, env = "TRANSFUSER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print a single dotted key, e.g. `carla.port`
    #[arg(long)]
    pub key: Option<String>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_drive_with_negative_pose() {
        let cli = Cli::try_parse_from([
            "transfuser-eval",
            "drive",
            "--mock",
            "--ticks",
            "5",
            "--x",
            "-12.5",
            "--steer",
            "-0.2",
        ])
        .unwrap();
        match cli.command {
            Commands::Drive(args) => {
                assert!(args.mock);
                assert_eq!(args.ticks, 5);
                assert_eq!(args.x, -12.5);
                assert_eq!(args.steer, -0.2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_evaluate_dry_run() {
        let cli =
            Cli::try_parse_from(["transfuser-eval", "-v", "evaluate", "--port", "2002", "--dry-run"])
                .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Evaluate(args) => {
                assert!(args.dry_run);
                assert_eq!(args.port, Some(2002));
                assert!(args.routes.is_none());
                assert!(args.weather_preset.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn evaluate_weather(arg: &str) -> Option<WeatherPreset> {
        let cli = Cli::try_parse_from(["transfuser-eval", "evaluate", arg]).unwrap();
        match cli.command {
            Commands::Evaluate(args) => args.weather_preset,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_weather_preset_both_forms() {
        assert_eq!(
            evaluate_weather("--weather-preset=Hard Rain Noon"),
            Some(WeatherPreset::HardRainNoon)
        );
        assert_eq!(
            evaluate_weather("--weather-preset=HardRainNoon"),
            Some(WeatherPreset::HardRainNoon)
        );
    }

    #[test]
    fn test_weather_listing_commands_parse() {
        // every `evaluate` line printed by the `weather` command must be accepted
        let listing = crate::commands::preset_listing();
        let lines: Vec<&str> = listing
            .lines()
            .filter(|l| l.starts_with("transfuser-eval evaluate "))
            .collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let arg = line
                .trim_start_matches("transfuser-eval evaluate ")
                .replace('"', "");
            assert_eq!(evaluate_weather(&arg), Some(WeatherPreset::HardRainNoon));
        }
    }

    #[test]
    fn test_unknown_weather_preset_rejected() {
        let err = Cli::try_parse_from([
            "transfuser-eval",
            "evaluate",
            "--weather-preset=Monsoon",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
