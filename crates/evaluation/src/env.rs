//! Evaluation environment
//!
//! Every variable the leaderboard run depends on is read and validated once,
//! before anything touches the simulator.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{EvalError, Result};

/// Variables that must be set
pub const REQUIRED_VARS: [&str; 3] = ["CARLA_ROOT", "SCENARIO_RUNNER_ROOT", "LEADERBOARD_ROOT"];

/// Agent module handed to the leaderboard when `TEAM_AGENT` is unset
pub const DEFAULT_AGENT_PATH: &str = "team_code/leaderboard_eval.py";

/// Validated evaluation environment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvConfig {
    pub carla_root: PathBuf,
    pub scenario_runner_root: PathBuf,
    pub leaderboard_root: PathBuf,

    /// `CHALLENGE_TRACK_CODENAME`
    pub track: String,
    pub port: u16,
    /// Per-route timeout in seconds
    pub timeout: u64,
    pub output_dir: PathBuf,
    pub traffic_manager_port: u16,
    pub traffic_manager_seed: u64,
    pub host: String,
    /// `DEBUG_CHALLENGE`
    pub debug: bool,
    pub record: bool,
    pub resume: bool,
    pub repetitions: u32,
    pub routes: PathBuf,
    pub scenarios: PathBuf,
    /// `DEFAULT_MODEL_PATH`
    pub model_path: Option<PathBuf>,
    /// `TEAM_AGENT`
    pub agent: PathBuf,
}

impl EnvConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    ///
    /// Missing required variables are collected and reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty counts as unset
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EvalError::MissingEnv { names: missing });
        }

        let root = |name: &str| PathBuf::from(get(name).unwrap_or_default());
        let carla_root = root("CARLA_ROOT");
        let scenario_runner_root = root("SCENARIO_RUNNER_ROOT");
        let leaderboard_root = root("LEADERBOARD_ROOT");

        let routes = get("ROUTES")
            .map(PathBuf::from)
            .unwrap_or_else(|| leaderboard_root.join("data/longest6/longest6.xml"));
        let scenarios = get("SCENARIOS")
            .map(PathBuf::from)
            .unwrap_or_else(|| leaderboard_root.join("data/longest6/eval_scenarios.json"));

        let config = Self {
            track: get("CHALLENGE_TRACK_CODENAME").unwrap_or_else(|| "SENSORS".to_string()),
            port: parse_or(&get, "PORT", 2000)?,
            timeout: parse_or(&get, "TIMEOUT", 60)?,
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(|| "results".into()),
            traffic_manager_port: parse_or(&get, "TRAFFIC_MANAGER_PORT", 8000)?,
            traffic_manager_seed: parse_or(&get, "TRAFFIC_MANAGER_SEED", 0)?,
            host: get("HOST").unwrap_or_else(|| "localhost".to_string()),
            debug: flag(&get, "DEBUG_CHALLENGE"),
            record: flag(&get, "RECORD"),
            resume: flag(&get, "RESUME"),
            repetitions: parse_or(&get, "REPETITIONS", 1)?,
            routes,
            scenarios,
            model_path: get("DEFAULT_MODEL_PATH").map(PathBuf::from),
            agent: get("TEAM_AGENT")
                .map(PathBuf::from)
                .unwrap_or_else(|| DEFAULT_AGENT_PATH.into()),
            carla_root,
            scenario_runner_root,
            leaderboard_root,
        };

        debug!(?config, "evaluation environment loaded");
        Ok(config)
    }

    /// `$CARLA_ROOT/PythonAPI/carla`
    pub fn carla_python_api(&self) -> PathBuf {
        self.carla_root.join("PythonAPI").join("carla")
    }

    /// `$LEADERBOARD_ROOT/leaderboard/leaderboard_evaluator.py`
    pub fn evaluator_script(&self) -> PathBuf {
        self.leaderboard_root
            .join("leaderboard")
            .join("leaderboard_evaluator.py")
    }

    /// Import roots the evaluator needs, in search order
    pub fn python_paths(&self) -> Vec<PathBuf> {
        vec![
            self.carla_python_api(),
            self.scenario_runner_root.clone(),
            self.leaderboard_root.clone(),
        ]
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| EvalError::invalid_env(name, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn flag<G>(get: &G, name: &str) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    get(name).is_some_and(|v| v.trim() == "1")
}
