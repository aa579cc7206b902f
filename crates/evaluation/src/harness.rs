//! Leaderboard evaluator launch and checkpoint parsing.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use contracts::WeatherPreset;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{info, instrument};

use crate::env::EnvConfig;
use crate::error::{EvalError, Result};

/// Interpreter used to run the evaluator
pub const PYTHON: &str = "python3";

/// Checkpoint file name used when none is given
pub const DEFAULT_CHECKPOINT_NAME: &str = "simulation_results.json";

/// Child environment variable carrying the requested weather preset
pub const WEATHER_PRESET_ENV: &str = "WEATHER_PRESET";

/// Printed when the run finished but the checkpoint could not be read
pub const STATISTICS_UNAVAILABLE: &str =
    "Evaluation completed, but statistics could not be retrieved.";

#[cfg(unix)]
const PATH_SEPARATOR: &str = ":";
#[cfg(not(unix))]
const PATH_SEPARATOR: &str = ";";

/// One evaluation run, with every value resolved
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub model_path: Option<PathBuf>,
    pub routes: PathBuf,
    pub scenarios: PathBuf,
    pub checkpoint: PathBuf,
    pub track: String,
    pub port: u16,
    pub timeout: u64,
    pub output_dir: PathBuf,
    pub agent: PathBuf,
    /// Route weather is kept when unset
    pub weather: Option<WeatherPreset>,
}

impl EvaluationRequest {
    /// Request built from environment defaults only
    pub fn from_env(env: &EnvConfig) -> Self {
        Self {
            model_path: env.model_path.clone(),
            routes: env.routes.clone(),
            scenarios: env.scenarios.clone(),
            checkpoint: env.output_dir.join(DEFAULT_CHECKPOINT_NAME),
            track: env.track.clone(),
            port: env.port,
            timeout: env.timeout,
            output_dir: env.output_dir.clone(),
            agent: env.agent.clone(),
            weather: None,
        }
    }
}

/// Fully resolved evaluator invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl LeaderboardCommand {
    /// Build the evaluator command line.
    ///
    /// `inherited_pythonpath` is appended after the simulator roots. A weather
    /// preset is handed to the agent through `WEATHER_PRESET` in its internal
    /// form; the evaluator itself has no weather flag.
    pub fn build(
        env: &EnvConfig,
        request: &EvaluationRequest,
        inherited_pythonpath: Option<&str>,
    ) -> Self {
        let mut args = vec![
            env.evaluator_script().display().to_string(),
            format!("--routes={}", request.routes.display()),
            format!("--scenarios={}", request.scenarios.display()),
            format!("--repetitions={}", env.repetitions),
            format!("--track={}", request.track),
            format!("--checkpoint={}", request.checkpoint.display()),
            format!("--agent={}", request.agent.display()),
        ];
        if let Some(model) = &request.model_path {
            args.push(format!("--agent-config={}", model.display()));
        }
        args.extend([
            format!("--host={}", env.host),
            format!("--port={}", request.port),
            format!("--trafficManagerPort={}", env.traffic_manager_port),
            format!("--trafficManagerSeed={}", env.traffic_manager_seed),
            format!("--timeout={}", request.timeout),
            format!("--debug={}", u8::from(env.debug)),
        ]);
        if env.record {
            args.push(format!("--record={}", request.output_dir.display()));
        }
        // the evaluator treats any non-empty value as true
        if env.resume {
            args.push("--resume=True".to_string());
        }

        let mut paths: Vec<String> = env
            .python_paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        if let Some(existing) = inherited_pythonpath.filter(|p| !p.is_empty()) {
            paths.push(existing.to_string());
        }

        let mut envs = vec![("PYTHONPATH".to_string(), paths.join(PATH_SEPARATOR))];
        if let Some(weather) = request.weather {
            envs.push((
                WEATHER_PRESET_ENV.to_string(),
                weather.internal_name().to_string(),
            ));
        }

        Self {
            program: PYTHON.to_string(),
            args,
            envs,
        }
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command.kill_on_drop(true);
        command
    }

    /// Launch the evaluator and wait for it to exit.
    #[instrument(name = "leaderboard_run", skip(self), fields(program = %self.program))]
    pub async fn run(&self) -> Result<()> {
        info!(command = %self, "launching leaderboard evaluator");
        let status = self
            .to_command()
            .status()
            .await
            .map_err(|source| EvalError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(EvalError::EvaluatorFailed {
                status: status.to_string(),
            });
        }
        info!("leaderboard evaluator finished");
        Ok(())
    }
}

impl fmt::Display for LeaderboardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{key}={} ", quote(value))?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("'{value}'")
    } else {
        value.to_string()
    }
}

/// Per-route result from the checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub route_id: String,
    pub status: String,
    /// Route completion in percent
    pub completion: f64,
    pub infractions: usize,
}

impl fmt::Display for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Route: {}", self.route_id)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Completion: {:.2}%", self.completion)?;
        write!(f, "Infractions: {}", self.infractions)
    }
}

#[derive(Deserialize)]
struct CheckpointFile {
    #[serde(rename = "_checkpoint")]
    checkpoint: CheckpointBody,
}

#[derive(Deserialize)]
struct CheckpointBody {
    #[serde(default)]
    records: Vec<RawRecord>,
}

#[derive(Deserialize)]
struct RawRecord {
    route_id: String,
    status: String,
    #[serde(default)]
    scores: RawScores,
    #[serde(default)]
    infractions: BTreeMap<String, Value>,
}

#[derive(Deserialize, Default)]
struct RawScores {
    #[serde(default)]
    score_route: f64,
}

impl From<RawRecord> for RouteRecord {
    fn from(raw: RawRecord) -> Self {
        let infractions = raw
            .infractions
            .values()
            .map(|v| match v {
                Value::Array(items) => items.len(),
                Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
                _ => 0,
            })
            .sum();
        Self {
            route_id: raw.route_id,
            status: raw.status,
            completion: raw.scores.score_route,
            infractions,
        }
    }
}

/// Parse leaderboard checkpoint JSON
pub fn parse_checkpoint(content: &str) -> serde_json::Result<Vec<RouteRecord>> {
    let file: CheckpointFile = serde_json::from_str(content)?;
    Ok(file
        .checkpoint
        .records
        .into_iter()
        .map(RouteRecord::from)
        .collect())
}

pub fn read_checkpoint(path: &Path) -> Result<Vec<RouteRecord>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| EvalError::checkpoint(path, e.to_string()))?;
    parse_checkpoint(&content).map_err(|e| EvalError::checkpoint(path, e.to_string()))
}

/// Results block printed after an evaluation
pub fn format_results(records: &[RouteRecord]) -> String {
    let mut out = String::from("\nEvaluation Results:\n==================\n");
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
        out.push_str(&"-".repeat(30));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvConfig {
        EnvConfig::from_lookup(|name| match name {
            "CARLA_ROOT" => Some("/opt/carla".into()),
            "SCENARIO_RUNNER_ROOT" => Some("/opt/sr".into()),
            "LEADERBOARD_ROOT" => Some("/opt/lb".into()),
            "DEFAULT_MODEL_PATH" => Some("/models/tf.ckpt".into()),
            "RESUME" => Some("1".into()),
            _ => None,
        })
        .unwrap()
    }

    const CHECKPOINT: &str = r#"{
        "_checkpoint": {
            "global_record": {},
            "progress": [2, 2],
            "records": [
                {
                    "index": 0,
                    "route_id": "RouteScenario_0",
                    "status": "Completed",
                    "scores": {"score_route": 100.0, "score_penalty": 0.6, "score_composed": 60.0},
                    "infractions": {
                        "collisions_vehicle": ["hit vehicle"],
                        "red_light": ["ran light", "ran light"],
                        "stop_infraction": []
                    }
                },
                {
                    "index": 1,
                    "route_id": "RouteScenario_1",
                    "status": "Failed - Agent timed out",
                    "scores": {"score_route": 42.5}
                }
            ]
        }
    }"#;

    #[test]
    fn test_command_line() {
        let env = env();
        let request = EvaluationRequest::from_env(&env);
        let command = LeaderboardCommand::build(&env, &request, Some("/usr/lib/py"));

        assert_eq!(command.program, "python3");
        assert_eq!(command.args[0], "/opt/lb/leaderboard/leaderboard_evaluator.py");
        assert!(command.args.contains(&"--routes=/opt/lb/data/longest6/longest6.xml".to_string()));
        assert!(command.args.contains(&"--agent-config=/models/tf.ckpt".to_string()));
        assert!(command.args.contains(&"--track=SENSORS".to_string()));
        assert!(command.args.contains(&"--checkpoint=results/simulation_results.json".to_string()));
        assert!(command.args.contains(&"--debug=0".to_string()));
        assert!(command.args.contains(&"--resume=True".to_string()));
        assert!(!command.args.iter().any(|a| a.starts_with("--record")));

        let (key, value) = &command.envs[0];
        assert_eq!(key, "PYTHONPATH");
        assert!(value.starts_with("/opt/carla/PythonAPI/carla"));
        assert!(value.contains("/opt/sr"));
        assert!(value.ends_with("/usr/lib/py"));
        assert_eq!(command.envs.len(), 1);
    }

    #[test]
    fn test_weather_preset_reaches_child_env() {
        let env = env();
        let mut request = EvaluationRequest::from_env(&env);
        request.weather = Some(WeatherPreset::HardRainNoon);
        let command = LeaderboardCommand::build(&env, &request, None);

        assert!(command
            .envs
            .contains(&("WEATHER_PRESET".to_string(), "HardRainNoon".to_string())));
        assert!(!command.args.iter().any(|a| a.contains("weather")));
        assert!(command.to_string().contains("WEATHER_PRESET=HardRainNoon "));
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let env = env();
        let mut request = EvaluationRequest::from_env(&env);
        request.routes = PathBuf::from("/data/my routes.xml");
        let text = LeaderboardCommand::build(&env, &request, None).to_string();
        assert!(text.starts_with("PYTHONPATH="));
        assert!(text.contains("'--routes=/data/my routes.xml'"));
    }

    #[test]
    fn test_parse_checkpoint() {
        let records = parse_checkpoint(CHECKPOINT).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].route_id, "RouteScenario_0");
        assert_eq!(records[0].infractions, 3);
        assert_eq!(records[0].completion, 100.0);
        assert_eq!(records[1].status, "Failed - Agent timed out");
        assert_eq!(records[1].infractions, 0);
    }

    #[test]
    fn test_parse_checkpoint_rejects_other_json() {
        assert!(parse_checkpoint(r#"{"records": []}"#).is_err());
        assert!(parse_checkpoint("not json").is_err());
    }

    #[test]
    fn test_format_results() {
        let records = parse_checkpoint(CHECKPOINT).unwrap();
        let text = format_results(&records);
        assert!(text.contains("Route: RouteScenario_1"));
        assert!(text.contains("Completion: 42.50%"));
        assert!(text.contains("Infractions: 3"));
    }

    #[test]
    fn test_read_missing_checkpoint() {
        let err = read_checkpoint(Path::new("/nonexistent/simulation_results.json")).unwrap_err();
        assert!(matches!(err, EvalError::Checkpoint { .. }));
    }
}
