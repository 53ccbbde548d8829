//! Match state
//!
//! Wires one ball and two agents together. The ball's event bus holds the
//! agents weakly; this struct owns them. The physics collaborator drives
//! it through `tick` and the collision/trigger entry points, the agent
//! transport through actions, observations and rewards.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::Vec3;

use super::ball::Ball;
use super::collision::Contact;
use super::events::{BallEvent, BallEventListener, BodyId, EventMask, Side, SubscriptionId};
use super::layout::TableLayout;
use super::team::Team;
use super::timer::SimClock;
use crate::agent::FootballAgent;
use crate::consts::*;
use crate::settings::Settings;

/// One match on one table
#[derive(Debug)]
pub struct MatchState {
    clock: SimClock,
    ball: Ball,
    /// Indexed by [`Side::index`]
    agents: [Rc<RefCell<FootballAgent>>; 2],
    agent_subscriptions: [SubscriptionId; 2],
    layout: TableLayout,
    settings: Settings,
    episode: u32,
}

impl MatchState {
    /// Create a match on the standard table
    pub fn new(settings: Settings) -> Self {
        Self::with_layout(settings, TableLayout::standard())
    }

    pub fn with_layout(settings: Settings, layout: TableLayout) -> Self {
        let mut ball = Ball::new(
            &settings.ball,
            Vec3::new(0.0, BALL_MIN_Y, 0.0),
            settings.seed,
        );

        let classifier = ball.classifier_mut();
        for wall in &layout.walls {
            classifier.register_wall(wall.body, wall.position);
        }
        for team in &layout.teams {
            classifier.register_goal(team.goal.body, team.side);
            for rod in &team.rods {
                for &player in &rod.spec.players {
                    classifier.register_player(player, rod.role, team.side);
                }
            }
        }

        let agents = Side::BOTH.map(|side| {
            let t = layout.team(side);
            let team = Team::new(side, t.yaw, t.goal, &t.rod_specs());
            Rc::new(RefCell::new(FootballAgent::new(
                side.index() as u32 + 1,
                team,
                &settings.agent,
            )))
        });
        for side in Side::BOTH {
            let opponent_id = agents[side.opponent().index()].borrow().id();
            agents[side.index()].borrow_mut().set_opponent_id(opponent_id);
        }

        let agent_subscriptions = [
            ball.subscribe(&agents[0], FootballAgent::EVENT_MASK),
            ball.subscribe(&agents[1], FootballAgent::EVENT_MASK),
        ];

        log::info!(
            "Match created: seed={}, {} colliders",
            settings.seed,
            ball.classifier().len()
        );

        Self {
            clock: SimClock::new(),
            ball,
            agents,
            agent_subscriptions,
            layout,
            settings,
            episode: 0,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    /// Ball state is written back here by the physics collaborator
    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn agent(&self, side: Side) -> Ref<'_, FootballAgent> {
        self.agents[side.index()].borrow()
    }

    pub fn agent_mut(&self, side: Side) -> RefMut<'_, FootballAgent> {
        self.agents[side.index()].borrow_mut()
    }

    /// Register an external listener (sound, trails, UI). It is held
    /// weakly: dropping it detaches it.
    pub fn subscribe<L>(&mut self, listener: &Rc<RefCell<L>>, mask: EventMask) -> SubscriptionId
    where
        L: BallEventListener + 'static,
    {
        self.ball.subscribe(listener, mask)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.agent_subscriptions.contains(&id) {
            log::warn!("Refusing to detach an agent from its own match");
            return false;
        }
        self.ball.unsubscribe(id)
    }

    /// Advance the clock one physics tick and run the ball's schedule
    pub fn tick(&mut self, dt: f32) {
        let now = self.clock.advance(dt);
        self.ball.update(now);
    }

    /// New episode: the ball is reset first, then both agents
    pub fn reset_episode(&mut self) {
        self.episode += 1;
        let now = self.clock.now();
        self.ball.reset(now);
        for agent in &self.agents {
            agent.borrow_mut().agent_reset();
        }
        log::info!("Episode {} started at t={:.2}", self.episode, now);
    }

    pub fn on_collision_enter(&mut self, contact: &Contact) -> Option<BallEvent> {
        let now = self.clock.now();
        self.ball.on_collision_enter(contact, now)
    }

    pub fn on_collision_exit(&mut self, contact: &Contact) -> Option<BallEvent> {
        let now = self.clock.now();
        self.ball.on_collision_exit(contact, now)
    }

    pub fn on_trigger_enter(&mut self, body: BodyId) -> Option<BallEvent> {
        let now = self.clock.now();
        self.ball.on_trigger_enter(body, now)
    }

    /// Apply exactly [`ACTION_LEN`] rod actions for `side`
    pub fn apply_actions(&mut self, side: Side, actions: &[f32]) {
        assert_eq!(
            actions.len(),
            ACTION_LEN,
            "{} agent sent {} actions",
            side.as_str(),
            actions.len()
        );
        self.agent_mut(side).agent_action(actions);
    }

    /// Observation vector for `side`; books that side's shaped rewards
    pub fn collect_observations(&mut self, side: Side) -> Vec<f32> {
        let opponent = self.agents[side.opponent().index()].borrow();
        let mut agent = self.agents[side.index()].borrow_mut();
        agent.collect_observations(&self.ball, opponent.team())
    }

    pub fn text_observation(&mut self, side: Side) -> Option<String> {
        self.agent_mut(side).text_observation()
    }

    pub fn take_reward(&mut self, side: Side) -> f32 {
        self.agent_mut(side).take_reward()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RewardKind;
    use crate::sim::ball::{BallState, BallTask};
    use crate::sim::events::{BallEventKind, RodPosition};

    #[derive(Default)]
    struct Counter {
        goals: u32,
        kicks: u32,
    }

    impl BallEventListener for Counter {
        fn on_ball_event(&mut self, event: &BallEvent, _now: f64) {
            match event.kind() {
                BallEventKind::Goal => self.goals += 1,
                BallEventKind::AutoKick => self.kicks += 1,
                _ => {}
            }
        }
    }

    fn player(state: &MatchState, side: Side, role: RodPosition) -> BodyId {
        state.layout().team(side).rods[role.index()].spec.players[0]
    }

    fn goal(state: &MatchState, defender: Side) -> BodyId {
        state.layout().team(defender).goal.body
    }

    fn run_until(state: &mut MatchState, t: f64) {
        while state.now() + 1e-4 < t {
            state.tick(SIM_DT);
        }
    }

    fn touch(state: &mut MatchState, body: BodyId) {
        let contact = Contact::new(body, Vec3::ZERO);
        state.on_collision_enter(&contact);
        state.on_collision_exit(&contact);
    }

    #[test]
    fn test_reset_episode_kicks_off() {
        let mut state = MatchState::new(Settings::default());
        state.reset_episode();
        assert_eq!(state.ball().state(), BallState::AwaitingKick);
        assert_eq!(state.agent(Side::Red).game_count(), 1);
        run_until(&mut state, 0.6);
        assert_eq!(state.ball().kick_count(), 1);
        assert!(state.ball().is_scheduled(BallTask::CheckVelocity));
    }

    #[test]
    fn test_goal_flows_to_both_agents_and_fx() {
        let mut state = MatchState::new(Settings::default());
        let fx = Rc::new(RefCell::new(Counter::default()));
        state.subscribe(&fx, EventMask::ALL);
        state.reset_episode();
        run_until(&mut state, 1.0);

        let red_attacker = player(&state, Side::Red, RodPosition::Attack);
        touch(&mut state, red_attacker);
        assert!(state.agent(Side::Red).stats().has_ball());
        assert!(!state.agent(Side::Blue).stats().has_ball());

        run_until(&mut state, 2.0);
        let blue_goal = goal(&state, Side::Blue);
        state.on_trigger_enter(blue_goal);

        assert_eq!(state.agent(Side::Red).stats().goals_scored(), 1);
        assert_eq!(state.agent(Side::Blue).stats().goals_scored(), 0);
        assert_eq!(state.agent(Side::Blue).stats().total_goals_count(), 1);
        assert_eq!(state.take_reward(Side::Red), 1.0);
        assert_eq!(state.take_reward(Side::Blue), -1.0);
        assert_eq!(fx.borrow().goals, 1);
        assert_eq!(state.ball().state(), BallState::AwaitingKick);
    }

    #[test]
    fn test_possession_split_between_teams() {
        let mut state = MatchState::new(Settings::default());
        state.reset_episode();
        run_until(&mut state, 1.0);

        let body = player(&state, Side::Red, RodPosition::Midfield);
        touch(&mut state, body);
        run_until(&mut state, 4.0);
        let body = player(&state, Side::Blue, RodPosition::Defense);
        touch(&mut state, body);
        run_until(&mut state, 5.0);
        state.on_trigger_enter(goal(&state, Side::Red));

        let now = state.now();
        let red = state.agent(Side::Red).stats().ball_possession(now);
        let blue = state.agent(Side::Blue).stats().ball_possession(now);
        assert!((red - 0.75).abs() < 0.02, "red {}", red);
        assert!((blue - 0.25).abs() < 0.02, "blue {}", blue);
    }

    #[test]
    fn test_idle_ball_auto_kick_ends_possession() {
        let mut state = MatchState::new(Settings::default());
        let fx = Rc::new(RefCell::new(Counter::default()));
        state.subscribe(&fx, EventMask::ALL);
        state.reset_episode();
        run_until(&mut state, 0.6);
        assert_eq!(fx.borrow().kicks, 1);

        let body = player(&state, Side::Red, RodPosition::Keeper);
        touch(&mut state, body);
        assert!(state.agent(Side::Red).stats().has_ball());

        // Ball stops dead; samples at 1.5, 2.5 and 3.5
        state.ball_mut().vel = Vec3::ZERO;
        run_until(&mut state, 3.4);
        assert_eq!(fx.borrow().kicks, 1);
        assert_eq!(state.ball().idle_count(), 2);
        run_until(&mut state, 3.6);

        assert_eq!(fx.borrow().kicks, 2);
        assert_eq!(state.ball().idle_count(), 0);
        let red = state.agent(Side::Red);
        assert!(!red.stats().has_ball());
        assert!(!red.stats().game_running());
        assert_eq!(red.stats().goals_scored(), 0);
        assert_eq!(red.stats().total_goals_count(), 0);
    }

    #[test]
    fn test_observations_and_shaped_rewards() {
        let mut state = MatchState::new(Settings::default());
        state.reset_episode();
        state.apply_actions(Side::Red, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(state.collect_observations(Side::Red).len(), 60);
        assert_eq!(state.collect_observations(Side::Blue).len(), 60);

        let red = state.agent(Side::Red);
        assert!(red.stats().reward(RewardKind::SpinPenalty) < 0.0);
        assert_eq!(red.stats().reward(RewardKind::ShotReward), 0.0);
    }

    #[test]
    #[should_panic(expected = "red agent sent 9 actions")]
    fn test_wrong_action_count_panics() {
        let mut state = MatchState::new(Settings::default());
        state.apply_actions(Side::Red, &[0.0; 9]);
    }

    #[test]
    fn test_agents_cannot_be_unsubscribed() {
        let mut state = MatchState::new(Settings::default());
        let id = state.agent_subscriptions[0];
        assert!(!state.unsubscribe(id));
    }

    #[test]
    fn test_dropped_fx_listener_is_harmless() {
        let mut state = MatchState::new(Settings::default());
        {
            let fx = Rc::new(RefCell::new(Counter::default()));
            state.subscribe(&fx, EventMask::ALL);
        }
        state.reset_episode();
        run_until(&mut state, 1.0);
        assert_eq!(state.ball().kick_count(), 1);
    }

    #[test]
    fn test_degenerate_ball_settings_from_json_keep_running() {
        let settings = Settings::from_json(
            r#"{ "ball": { "idle_sample_interval": 0.0, "ball_mass": 0.0, "wall_bounce": 4.0 } }"#,
        )
        .unwrap();
        let mut state = MatchState::new(settings);
        state.reset_episode();
        for _ in 0..40 {
            state.tick(SIM_DT);
        }
        assert_eq!(state.ball().kick_count(), 1);
        assert!(state.ball().vel.is_finite());
        assert!(state.ball().is_scheduled(BallTask::CheckVelocity));
        assert_eq!(state.ball().settings().wall_bounce, 1.0);
    }

    #[test]
    fn test_text_channel_pairs_agents() {
        let mut settings = Settings::default();
        settings.agent.match_state_channel = true;
        let mut state = MatchState::new(settings);
        assert_eq!(state.text_observation(Side::Red).as_deref(), Some("2|play"));
        assert_eq!(state.text_observation(Side::Blue).as_deref(), Some("1|play"));
    }
}
