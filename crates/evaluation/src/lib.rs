//! # TransFuser Evaluation
//!
//! Leaderboard evaluation and local driving for the TransFuser agent.
//!
//! Responsibilities:
//! - Validate the evaluation environment once at startup
//! - Build and launch the leaderboard evaluator, then summarize its checkpoint
//! - Run a local closed loop through the simulator façade

pub mod agent;
pub mod drive;
pub mod env;
pub mod error;
pub mod harness;

pub use agent::{ConstantAgent, DrivingAgent};
pub use drive::{drive, DriveOptions, DriveReport, VIDEO_FILENAME};
pub use env::{EnvConfig, DEFAULT_AGENT_PATH, REQUIRED_VARS};
pub use error::{EvalError, Result};
pub use harness::{
    format_results, parse_checkpoint, read_checkpoint, EvaluationRequest, LeaderboardCommand,
    RouteRecord, DEFAULT_CHECKPOINT_NAME, STATISTICS_UNAVAILABLE, WEATHER_PRESET_ENV,
};
