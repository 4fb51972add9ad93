use crate::controller::{decide, Controller, TrackingOpponent};
use crate::env::{Arena, Side};
use crate::error::ControllerFault;
use serde::{Deserialize, Serialize};

/// Reward for every frame played, including the terminal one.
pub const SURVIVAL_REWARD: u32 = 1;
/// Extra reward when the evaluated (right) side wins the point.
pub const WIN_BONUS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// `None` when the frame budget ran out first.
    pub winner: Option<Side>,
    pub frames: u32,
    pub score: u32,
}

impl EpisodeOutcome {
    pub fn evaluated_side_won(&self) -> bool {
        self.winner == Some(Side::Right)
    }
}

/// Adds the reward of the frame that produced `winner`, saturating at
/// `u32::MAX`.
pub fn credit_frame(score: u32, winner: Option<Side>) -> u32 {
    let reward = if winner == Some(Side::Right) {
        SURVIVAL_REWARD + WIN_BONUS
    } else {
        SURVIVAL_REWARD
    };
    score.saturating_add(reward)
}

/// Plays one episode with `controller` on the right paddle against the fixed
/// opponent, starting from a fresh reset.
///
/// All randomness (the initial ball velocity and the opponent's idle moves)
/// is drawn from `rng`, so identical seeds and identical controller outputs
/// give identical outcomes. The loop runs at most `frame_budget` frames.
pub fn run_episode<C: Controller + ?Sized>(
    arena: &Arena,
    controller: &C,
    frame_budget: u32,
    rng: &mut fastrand::Rng,
) -> Result<EpisodeOutcome, ControllerFault> {
    let opponent = TrackingOpponent::new(arena.config().paddle_height);
    let mut state = arena.reset(rng);
    let mut frames = 0u32;
    let mut score = 0u32;
    let mut winner = None;

    while !state.over && frames < frame_budget {
        let observation = arena.observe(&state);
        let right = decide(controller, &observation)?;
        let left = opponent.act(&state, rng);

        let outcome = arena.step(state, left, right);
        state = outcome.state;
        winner = outcome.winner;

        score = credit_frame(score, winner);
        frames += 1;
    }

    Ok(EpisodeOutcome {
        winner,
        frames,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::controller::ConstantController;

    #[test]
    fn frame_budget_bounds_every_episode() {
        let arena = Arena::new(ArenaConfig::default());
        for budget in [1, 5, 50, 1_000] {
            for seed in 0..16 {
                let mut rng = fastrand::Rng::with_seed(seed);
                let outcome = run_episode(&arena, &ConstantController(0.3), budget, &mut rng)
                    .expect("constant controller never faults");
                assert!(outcome.frames <= budget, "budget={budget} seed={seed}");
                assert!(outcome.frames >= 1);
            }
        }
    }

    #[test]
    fn exhausted_budget_scores_exactly_the_budget() {
        // The ball needs well over 50 frames to leave a 1200px arena at 8px/frame.
        let arena = Arena::new(ArenaConfig::default());
        let mut rng = fastrand::Rng::with_seed(3);
        let outcome = run_episode(&arena, &ConstantController(0.5), 50, &mut rng)
            .expect("constant controller never faults");
        assert_eq!(
            outcome,
            EpisodeOutcome {
                winner: None,
                frames: 50,
                score: 50
            }
        );
    }

    #[test]
    fn same_seed_replays_identically() {
        let arena = Arena::new(ArenaConfig::default());
        for seed in [0u64, 1, 0xDEAD_BEEF, 0xC0FF_EE11] {
            let mut rng_a = fastrand::Rng::with_seed(seed);
            let mut rng_b = fastrand::Rng::with_seed(seed);
            let a = run_episode(&arena, &ConstantController(0.7), 1_000, &mut rng_a)
                .expect("constant controller never faults");
            let b = run_episode(&arena, &ConstantController(0.7), 1_000, &mut rng_b)
                .expect("constant controller never faults");
            assert_eq!(a, b, "seed={seed:#x}");
        }
    }

    #[test]
    fn win_bonus_is_credited_only_for_a_right_win() {
        assert_eq!(credit_frame(0, None), 1);
        assert_eq!(credit_frame(0, Some(Side::Left)), 1);
        assert_eq!(credit_frame(7, Some(Side::Right)), 18);
    }

    #[test]
    fn credit_saturates_near_the_top_of_the_range() {
        assert_eq!(credit_frame(u32::MAX - 3, Some(Side::Right)), u32::MAX);
        assert_eq!(credit_frame(u32::MAX, None), u32::MAX);
    }

    #[test]
    fn faulty_controller_aborts_the_episode() {
        let arena = Arena::new(ArenaConfig::default());
        let mut rng = fastrand::Rng::with_seed(5);
        let err = run_episode(&arena, &ConstantController(f64::NAN), 1_000, &mut rng)
            .expect_err("NaN output must be rejected");
        assert!(matches!(err, ControllerFault::NonFinite(_)));
    }
}
