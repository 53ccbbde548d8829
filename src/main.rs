//! Foosball Sim entry point
//!
//! Headless demo: two random agents play on the kinematic table.
//!
//! Usage: `foosball-sim [steps] [seed] [settings.json]`

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use foosball_sim::consts::*;
use foosball_sim::sim::{
    BallEvent, BallEventKind, BallEventListener, EventMask, KinematicTable, MatchState, tick,
};
use foosball_sim::{RewardKind, Settings, Side};

/// Physics ticks per agent decision
const DECISION_PERIOD: u64 = 5;
/// Goals that end an episode
const GOALS_PER_EPISODE: u32 = 5;

/// Logs what a scoreboard would show
#[derive(Default)]
struct Scoreboard {
    goals: [u32; 2],
}

impl BallEventListener for Scoreboard {
    fn on_ball_event(&mut self, event: &BallEvent, now: f64) {
        if let BallEvent::Goal { defender, .. } = event {
            let scorer = defender.opponent();
            self.goals[scorer.index()] += 1;
            log::info!(
                "Goal for {} at t={:.2}s ({} - {})",
                scorer.as_str(),
                now,
                self.goals[0],
                self.goals[1]
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Foosball Sim (headless) starting...");

    let mut args = std::env::args().skip(1);
    let steps: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(30_000);
    let seed_arg: Option<u64> = args.next().and_then(|s| s.parse().ok());
    let mut settings = match args.next() {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    if let Some(seed) = seed_arg {
        settings.seed = seed;
    }

    let mut rng = Pcg32::seed_from_u64(settings.seed ^ 0xA6E7);
    let mut state = MatchState::new(settings);
    let mut table = KinematicTable::new();

    let scoreboard = Rc::new(RefCell::new(Scoreboard::default()));
    state.subscribe(&scoreboard, EventMask::of(&[BallEventKind::Goal]));

    state.reset_episode();
    let mut returns = [0.0f32; 2];
    let mut episode_goals = 0;

    for step in 0..steps {
        if step % DECISION_PERIOD == 0 {
            for side in Side::BOTH {
                let _obs = state.collect_observations(side);
                returns[side.index()] += state.take_reward(side);
                let actions: Vec<f32> = (0..ACTION_LEN)
                    .map(|_| rng.random_range(-1.0f32..=1.0))
                    .collect();
                state.apply_actions(side, &actions);
            }
        }

        tick(&mut state, &mut table, SIM_DT);

        let goals = scoreboard.borrow().goals.iter().sum::<u32>();
        if goals - episode_goals >= GOALS_PER_EPISODE {
            report(&state, &returns);
            episode_goals = goals;
            returns = [0.0; 2];
            state.reset_episode();
        }
    }

    report(&state, &returns);
    log::info!(
        "Done: {} ticks, {:.1}s simulated, {} auto-kicks",
        state.clock().ticks(),
        state.now(),
        state.ball().kick_count()
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn report(state: &MatchState, returns: &[f32; 2]) {
    let now = state.now();
    println!("Episode {} at t={:.1}s", state.episode(), now);
    for side in Side::BOTH {
        let agent = state.agent(side);
        let stats = agent.stats();
        println!(
            "  {:<4} goals {} possession {:>5.1}% score rate {:.2} shot {:+.4} spin {:+.4} return {:+.3}",
            side.as_str(),
            stats.goals_scored(),
            stats.ball_possession(now) * 100.0,
            stats.overall_score_rate(),
            stats.reward(RewardKind::ShotReward),
            stats.reward(RewardKind::SpinPenalty),
            returns[side.index()]
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
