//! Deterministic two-paddle ball arena.
//!
//! The arena itself holds only immutable geometry; every mutable quantity
//! lives in an [`EnvironmentState`] value that is passed into [`Arena::step`]
//! and returned from it. Episodes therefore never share state and can run on
//! separate workers.
//!
//! Frame order is fixed: the ball moves first, then paddles, then paddle
//! contacts, walls and the out-of-bounds test are evaluated against the new
//! position. Bounces are consequently detected one frame late and the ball
//! may already overlap a paddle when it turns around.

use crate::config::ArenaConfig;
use crate::controller::Action;
use serde::{Deserialize, Serialize};

pub const OBSERVATION_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

/// A paddle is described by its top-left corner; `x` never changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paddle {
    pub x: f64,
    pub y: f64,
}

impl Paddle {
    pub fn center_y(&self, paddle_height: f64) -> f64 {
        self.y + paddle_height / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentState {
    pub ball: Ball,
    pub left: Paddle,
    pub right: Paddle,
    pub over: bool,
}

impl EnvironmentState {
    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Normalized view of the state, in canonical order:
/// ball x, ball y, ball dx, ball dy, left paddle y, right paddle y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation(pub [f64; OBSERVATION_LEN]);

impl Observation {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub state: EnvironmentState,
    pub winner: Option<Side>,
}

impl StepOutcome {
    pub fn terminal(&self) -> bool {
        self.state.over
    }
}

#[derive(Clone, Debug)]
pub struct Arena {
    config: ArenaConfig,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Ball at the center heading in a random horizontal direction with a
    /// random vertical component in `(-speed_y, speed_y)`; paddles centered.
    pub fn reset(&self, rng: &mut fastrand::Rng) -> EnvironmentState {
        let cfg = &self.config;
        let dx_sign = if rng.f64() > 0.5 { 1.0 } else { -1.0 };
        let dy_sign = if rng.f64() > 0.5 { 1.0 } else { -1.0 };
        let dy_scale = rng.f64();
        let paddle_y = cfg.height / 2.0 - cfg.paddle_height / 2.0;

        EnvironmentState {
            ball: Ball {
                x: cfg.width / 2.0,
                y: cfg.height / 2.0,
                dx: dx_sign * cfg.ball_speed_x,
                dy: dy_sign * dy_scale * cfg.ball_speed_y,
            },
            left: Paddle {
                x: cfg.left_paddle_x,
                y: paddle_y,
            },
            right: Paddle {
                x: cfg.right_paddle_x(),
                y: paddle_y,
            },
            over: false,
        }
    }

    /// Velocity terms are divided by twice the nominal speed, so they land in
    /// roughly [-0.5, 0.5] rather than [0, 1].
    pub fn observe(&self, state: &EnvironmentState) -> Observation {
        let cfg = &self.config;
        let travel = cfg.paddle_travel();
        Observation([
            state.ball.x / cfg.width,
            state.ball.y / cfg.height,
            state.ball.dx / (cfg.ball_speed_x * 2.0),
            state.ball.dy / (cfg.ball_speed_y * 2.0),
            state.left.y / travel,
            state.right.y / travel,
        ])
    }

    pub fn step(&self, mut state: EnvironmentState, left: Action, right: Action) -> StepOutcome {
        let cfg = &self.config;

        state.ball.x += state.ball.dx;
        state.ball.y += state.ball.dy;

        self.move_paddle(&mut state.left, left);
        self.move_paddle(&mut state.right, right);

        // Both paddles are tested every frame, far side included.
        if self.touches(&state.ball, &state.left) || self.touches(&state.ball, &state.right) {
            state.ball.dx = -state.ball.dx;
        }

        if state.ball.y > cfg.height - cfg.ball_radius || state.ball.y < cfg.ball_radius {
            state.ball.dy = -state.ball.dy;
        }

        let winner = if state.ball.x < 0.0 {
            Some(Side::Right)
        } else if state.ball.x > cfg.width {
            Some(Side::Left)
        } else {
            None
        };
        if winner.is_some() {
            state.over = true;
        }

        StepOutcome { state, winner }
    }

    // A paddle sitting on a bound with the matching action stays put; no clamping.
    fn move_paddle(&self, paddle: &mut Paddle, action: Action) {
        let cfg = &self.config;
        if action.decreases() {
            if paddle.y > 0.0 {
                paddle.y -= cfg.paddle_speed;
            }
        } else if paddle.y < cfg.paddle_travel() {
            paddle.y += cfg.paddle_speed;
        }
    }

    fn touches(&self, ball: &Ball, paddle: &Paddle) -> bool {
        let cfg = &self.config;
        ball.x - cfg.ball_radius <= paddle.x + cfg.paddle_width
            && ball.x + cfg.ball_radius >= paddle.x
            && ball.y >= paddle.y
            && ball.y <= paddle.y + cfg.paddle_height
    }
}
