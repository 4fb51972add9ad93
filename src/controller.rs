use crate::env::{EnvironmentState, Observation};
use crate::error::ControllerFault;

/// One paddle command for one frame. Values below [`Action::THRESHOLD`] move
/// the paddle toward decreasing coordinates, everything else toward
/// increasing ones. Values outside [0, 1] are accepted and read the same way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action(pub f64);

impl Action {
    pub const THRESHOLD: f64 = 0.5;

    pub fn decreases(self) -> bool {
        self.0 < Self::THRESHOLD
    }
}

/// Decision capability of an evaluated candidate. Only the first output
/// element is consumed; [`Controller::export`] yields a record suitable for
/// persistence.
pub trait Controller {
    fn compute(&self, inputs: &[f64]) -> Vec<f64>;
    fn export(&self) -> serde_json::Value;
}

/// Runs the controller on an observation and checks the output contract.
pub fn decide<C: Controller + ?Sized>(
    controller: &C,
    observation: &Observation,
) -> Result<Action, ControllerFault> {
    let outputs = controller.compute(observation.as_slice());
    let first = *outputs.first().ok_or(ControllerFault::EmptyOutput)?;
    if !first.is_finite() {
        return Err(ControllerFault::NonFinite(first));
    }
    Ok(Action(first))
}

/// Fixed heuristic driving the left paddle in every episode.
///
/// While the ball approaches it chases the ball's height; while the ball
/// travels away it makes a coin-flip move.
#[derive(Clone, Copy, Debug)]
pub struct TrackingOpponent {
    paddle_height: f64,
}

impl TrackingOpponent {
    pub fn new(paddle_height: f64) -> Self {
        Self { paddle_height }
    }

    pub fn act(&self, state: &EnvironmentState, rng: &mut fastrand::Rng) -> Action {
        if state.ball.dx < 0.0 {
            let center = state.left.center_y(self.paddle_height);
            if center > state.ball.y {
                Action(0.0)
            } else {
                Action(1.0)
            }
        } else {
            Action(rng.f64())
        }
    }
}

/// Always answers with the same value. Useful as a baseline candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantController(pub f64);

impl Controller for ConstantController {
    fn compute(&self, _inputs: &[f64]) -> Vec<f64> {
        vec![self.0]
    }

    fn export(&self) -> serde_json::Value {
        serde_json::json!({ "constant": self.0 })
    }
}
