//! Agent-facing side of the simulation
//!
//! Statistics, shaped rewards and observation encoding for the learning
//! agents. Agents subscribe to ball events and never touch the ball.

pub mod football;
pub mod observation;
pub mod reward;
pub mod stats;

pub use football::{FootballAgent, MatchResult};
pub use reward::{REWARD_HISTORY_LEN, RewardHistory, RewardKind};
pub use stats::AgentStats;
