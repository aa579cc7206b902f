//! `evaluate` command implementation.

use anyhow::{Context, Result};
use evaluation::{
    format_results, read_checkpoint, EnvConfig, EvaluationRequest, LeaderboardCommand,
    DEFAULT_CHECKPOINT_NAME, STATISTICS_UNAVAILABLE,
};
use tracing::{info, warn};

use super::shutdown_signal;
use crate::cli::EvaluateArgs;

/// Execute the `evaluate` command
pub async fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    // fails before anything is launched
    let env = EnvConfig::from_env().context("Invalid evaluation environment")?;
    let request = resolve_request(&env, args);
    let inherited = std::env::var("PYTHONPATH").ok();
    let command = LeaderboardCommand::build(&env, &request, inherited.as_deref());

    if args.dry_run {
        info!("Dry run mode - evaluator not launched");
        println!("{command}");
        return Ok(());
    }

    std::fs::create_dir_all(&request.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            request.output_dir.display()
        )
    })?;

    info!(
        routes = %request.routes.display(),
        track = %request.track,
        port = request.port,
        weather = request.weather.map(|w| w.internal_name()),
        "Starting leaderboard evaluation"
    );

    tokio::select! {
        result = command.run() => {
            result.context("Leaderboard evaluation failed")?;
        }
        _ = shutdown_signal() => {
            // dropping the run future kills the evaluator
            warn!("Received shutdown signal, evaluator stopped");
            return Ok(());
        }
    }

    match read_checkpoint(&request.checkpoint) {
        Ok(records) => {
            print!("{}", format_results(&records));
            for record in &records {
                observability::record_route_result(
                    &record.route_id,
                    &record.status,
                    record.completion,
                    record.infractions,
                );
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not read evaluation statistics");
            println!("Error getting statistics: {e}");
            println!("{STATISTICS_UNAVAILABLE}");
        }
    }

    Ok(())
}

/// Apply CLI overrides on top of the environment defaults
fn resolve_request(env: &EnvConfig, args: &EvaluateArgs) -> EvaluationRequest {
    let mut request = EvaluationRequest::from_env(env);

    if let Some(model) = &args.model_path {
        request.model_path = Some(model.clone());
    }
    if let Some(routes) = &args.routes {
        request.routes = routes.clone();
    }
    if let Some(scenarios) = &args.scenarios {
        request.scenarios = scenarios.clone();
    }
    if let Some(track) = &args.track {
        request.track = track.clone();
    }
    if let Some(port) = args.port {
        request.port = port;
    }
    if let Some(timeout) = args.timeout {
        request.timeout = timeout;
    }
    if let Some(weather) = args.weather_preset {
        request.weather = Some(weather);
    }
    if let Some(agent) = &args.agent {
        request.agent = agent.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        request.output_dir = output_dir.clone();
        request.checkpoint = output_dir.join(DEFAULT_CHECKPOINT_NAME);
    }
    if let Some(checkpoint) = &args.checkpoint {
        request.checkpoint = checkpoint.clone();
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::WeatherPreset;
    use std::path::PathBuf;

    fn env() -> EnvConfig {
        EnvConfig::from_lookup(|name| match name {
            "CARLA_ROOT" | "SCENARIO_RUNNER_ROOT" | "LEADERBOARD_ROOT" => Some(format!("/opt/{name}")),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_defaults_from_env() {
        let env = env();
        let request = resolve_request(&env, &EvaluateArgs::default());
        assert_eq!(request, EvaluationRequest::from_env(&env));
    }

    #[test]
    fn test_output_dir_moves_default_checkpoint() {
        let args = EvaluateArgs {
            output_dir: Some(PathBuf::from("/tmp/run1")),
            port: Some(2004),
            ..Default::default()
        };
        let request = resolve_request(&env(), &args);
        assert_eq!(request.port, 2004);
        assert_eq!(
            request.checkpoint,
            PathBuf::from("/tmp/run1/simulation_results.json")
        );
    }

    #[test]
    fn test_weather_preset_carried() {
        let args = EvaluateArgs {
            weather_preset: Some(WeatherPreset::SoftRainSunset),
            ..Default::default()
        };
        let request = resolve_request(&env(), &args);
        assert_eq!(request.weather, Some(WeatherPreset::SoftRainSunset));
    }

    #[test]
    fn test_explicit_checkpoint_wins() {
        let args = EvaluateArgs {
            output_dir: Some(PathBuf::from("/tmp/run1")),
            checkpoint: Some(PathBuf::from("/tmp/ckpt.json")),
            ..Default::default()
        };
        let request = resolve_request(&env(), &args);
        assert_eq!(request.checkpoint, PathBuf::from("/tmp/ckpt.json"));
    }
}
