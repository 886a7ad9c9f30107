use std::fmt;

use jumpwin_core::{
    ActionVector, Actor, Button, MoveSequence, forward_forced, forward_jumping_forced,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::course::GateCourse;

const HUMAN_SALT: u64 = 0x9e37_79b9_7f4a_7c15;
/// Chance a human hops nervously between two gates.
const HOP_CHANCE: f64 = 0.4;

/// Who records the playthrough that gets scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunnerKind {
    /// Jittered timing, occasional slips and stray hops.
    Human,
    /// Centres every jump in its window.
    Agent,
    /// Holds right and never jumps.
    Forward,
    /// Holds right and taps jump every other frame.
    Hopper,
}

impl RunnerKind {
    pub const ALL: [RunnerKind; 4] = [
        RunnerKind::Human,
        RunnerKind::Agent,
        RunnerKind::Forward,
        RunnerKind::Hopper,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RunnerKind::Human => "Human",
            RunnerKind::Agent => "Agent",
            RunnerKind::Forward => "Forward",
            RunnerKind::Hopper => "Hopper",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            RunnerKind::Human => "human",
            RunnerKind::Agent => "agent",
            RunnerKind::Forward => "forward",
            RunnerKind::Hopper => "hopper",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            RunnerKind::Human => "jittered timing with slips and stray hops",
            RunnerKind::Agent => "search agent centring each jump",
            RunnerKind::Forward => "holds right, never jumps",
            RunnerKind::Hopper => "holds right, taps jump every other frame",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|runner| runner.key().eq_ignore_ascii_case(token.trim()))
    }

    #[must_use]
    pub fn actor(self) -> Actor {
        match self {
            RunnerKind::Human => Actor::Human,
            RunnerKind::Agent => Actor::SearchAgent,
            RunnerKind::Forward => forward_forced(),
            RunnerKind::Hopper => forward_jumping_forced(),
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Right held for the whole course with jumps pressed at `(frame, hold)`.
fn plan_with_jumps(length: usize, jumps: &[(usize, usize)]) -> MoveSequence {
    let mut moves = MoveSequence::repeat(&ActionVector::from_buttons(&[Button::Right]), length);
    for &(frame, hold) in jumps {
        moves = moves.with_jump_held(frame..frame + hold);
    }
    moves
}

/// Playthrough a human might record on `course`.
///
/// Take-off points and holds are drawn from each gate's accepted ranges; with
/// the tier's slip chance the take-off comes one unit too late. Stray one- or
/// two-frame hops land well clear of the gates.
#[must_use]
pub fn human_plan(course: &GateCourse) -> MoveSequence {
    let mut rng = ChaCha20Rng::seed_from_u64(course.seed.rotate_left(17) ^ HUMAN_SALT);
    let slip_chance = course.tier.slip_chance();
    let mut jumps = Vec::new();
    // first frame not yet used by an earlier jump or its gap
    let mut free_from = 0;

    for gate in &course.gates {
        if gate.open > free_from + 6 && rng.gen_bool(HOP_CHANCE) {
            let hop_start = rng.gen_range(free_from..gate.open - 5);
            let hop_hold = rng.gen_range(1..=2);
            jumps.push((hop_start, hop_hold));
        }

        let takeoff = if rng.gen_bool(slip_chance) {
            gate.close + 1
        } else {
            rng.gen_range(gate.open..=gate.close)
        };
        let hold = rng.gen_range(gate.min_hold..=gate.max_hold);
        // taking off at distance d means pressing on frame d - 1
        let frame = takeoff.saturating_sub(1);
        jumps.push((frame, hold));
        free_from = frame + hold + 2;
    }

    if course.length > free_from + 6 && rng.gen_bool(HOP_CHANCE) {
        jumps.push((rng.gen_range(free_from..course.length - 5), 1));
    }

    plan_with_jumps(course.length, &jumps)
}

/// Centred take-off, middle hold, no stray jumps.
#[must_use]
pub fn agent_plan(course: &GateCourse) -> MoveSequence {
    let jumps: Vec<(usize, usize)> = course
        .gates
        .iter()
        .map(|gate| {
            let takeoff = gate.open + (gate.close - gate.open) / 2;
            let hold = gate.min_hold + (gate.max_hold - gate.min_hold) / 2;
            (takeoff.saturating_sub(1), hold)
        })
        .collect();
    plan_with_jumps(course.length, &jumps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::course::Tier;
    use crate::logic::simulator::CourseOracle;
    use jumpwin_core::{Outcome, ReplayOracle, segment_jumps};

    #[test]
    fn runners_parse_by_key() {
        assert_eq!(RunnerKind::parse("HOPPER"), Some(RunnerKind::Hopper));
        assert_eq!(RunnerKind::parse("robot"), None);
    }

    #[test]
    fn agent_clears_every_generated_course() {
        for tier in Tier::ALL {
            for seed in 0..25 {
                let course = GateCourse::generate(tier, seed);
                let replay = CourseOracle
                    .simulate(&course, &RunnerKind::Agent.actor(), false)
                    .unwrap();
                assert_eq!(replay.outcome, Outcome::Win, "{}", course.name);
            }
        }
    }

    #[test]
    fn human_plans_are_reproducible_and_well_separated() {
        let course = GateCourse::generate(Tier::Gentle, 7);
        let plan = human_plan(&course);
        assert_eq!(plan, human_plan(&course));
        assert_eq!(plan.len(), course.length);

        let jumps = segment_jumps(&plan).unwrap();
        assert!(jumps.len() >= course.gates.len());
        for pair in jumps.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }

    #[test]
    fn forward_runner_dies_at_the_first_gate() {
        let course = GateCourse::generate(Tier::Standard, 3);
        let replay = CourseOracle
            .simulate(&course, &RunnerKind::Forward.actor(), false)
            .unwrap();
        assert!(!replay.outcome.is_win());
        assert_eq!(replay.frames, course.gates[0].close + 1);
    }
}
