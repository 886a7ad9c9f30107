use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Difficulty band a course is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Gentle,
    Standard,
    Brutal,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Gentle, Tier::Standard, Tier::Brutal];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Gentle => "Gentle",
            Tier::Standard => "Standard",
            Tier::Brutal => "Brutal",
        }
    }

    /// Tag used inside course codes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Tier::Gentle => "GENTLE",
            Tier::Standard => "STANDARD",
            Tier::Brutal => "BRUTAL",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.code().eq_ignore_ascii_case(token.trim()))
    }

    const fn profile(self) -> TierProfile {
        match self {
            Tier::Gentle => TierProfile {
                gates: (2, 3),
                window: (6, 10),
                min_hold: (1, 2),
                hold_span: (6, 10),
                spacing: (20, 32),
                time_slack: 2,
                slip_chance: 0.02,
            },
            Tier::Standard => TierProfile {
                gates: (3, 5),
                window: (3, 6),
                min_hold: (2, 3),
                hold_span: (3, 6),
                spacing: (14, 26),
                time_slack: 3,
                slip_chance: 0.08,
            },
            Tier::Brutal => TierProfile {
                gates: (5, 7),
                window: (0, 2),
                min_hold: (3, 5),
                hold_span: (0, 2),
                spacing: (10, 18),
                time_slack: 5,
                slip_chance: 0.2,
            },
        }
    }

    /// Chance a human runner misjudges a gate.
    #[must_use]
    pub const fn slip_chance(self) -> f64 {
        self.profile().slip_chance
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive ranges the generator draws from.
struct TierProfile {
    gates: (usize, usize),
    window: (usize, usize),
    min_hold: (usize, usize),
    hold_span: (usize, usize),
    spacing: (usize, usize),
    /// Time limit is `length + length / time_slack`.
    time_slack: usize,
    slip_chance: f64,
}

/// What kills a runner who misses a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Enemy,
    Pit,
}

/// A gap that must be jumped: the jump has to start while the runner's
/// distance lies in `open..=close` and be held `min_hold..=max_hold` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub open: usize,
    pub close: usize,
    pub min_hold: usize,
    pub max_hold: usize,
    pub hazard: Hazard,
}

impl Gate {
    #[must_use]
    pub const fn accepts_start(&self, distance: usize) -> bool {
        self.open <= distance && distance <= self.close
    }

    #[must_use]
    pub const fn accepts_hold(&self, hold: usize) -> bool {
        self.min_hold <= hold && hold <= self.max_hold
    }

    /// Distance by which a jump started at `close` and held longest has landed.
    #[must_use]
    pub const fn clear_of(&self) -> usize {
        self.close + self.max_hold
    }
}

/// A synthetic run-right level made of gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCourse {
    pub name: String,
    pub seed: u64,
    pub tier: Tier,
    /// Distance that wins the course.
    pub length: usize,
    /// Frames before the run times out.
    pub time_limit: usize,
    pub gates: Vec<Gate>,
}

impl GateCourse {
    /// Deterministically generate the course for `tier` and `seed`.
    #[must_use]
    pub fn generate(tier: Tier, seed: u64) -> Self {
        let profile = tier.profile();
        let mut rng = ChaCha20Rng::seed_from_u64(seed ^ tier_salt(tier));

        let gate_count = rng.gen_range(profile.gates.0..=profile.gates.1);
        let mut gates = Vec::with_capacity(gate_count);
        let mut cursor = rng.gen_range(profile.spacing.0..=profile.spacing.1);
        for _ in 0..gate_count {
            let open = cursor;
            let close = open + rng.gen_range(profile.window.0..=profile.window.1);
            let min_hold = rng.gen_range(profile.min_hold.0..=profile.min_hold.1);
            let max_hold = min_hold + rng.gen_range(profile.hold_span.0..=profile.hold_span.1);
            let hazard = if rng.gen_bool(0.5) {
                Hazard::Enemy
            } else {
                Hazard::Pit
            };
            let gate = Gate {
                open,
                close,
                min_hold,
                max_hold,
                hazard,
            };
            cursor = gate.clear_of() + rng.gen_range(profile.spacing.0..=profile.spacing.1);
            gates.push(gate);
        }

        let length = cursor;
        Self {
            name: format!("{tier} course {seed}"),
            seed,
            tier,
            length,
            time_limit: length + length / profile.time_slack,
            gates,
        }
    }

    /// A course with no gates: holding right wins.
    #[cfg(test)]
    pub fn flat(length: usize) -> Self {
        Self {
            name: format!("flat {length}"),
            seed: 0,
            tier: Tier::Gentle,
            length,
            time_limit: length * 2,
            gates: Vec::new(),
        }
    }
}

const fn tier_salt(tier: Tier) -> u64 {
    match tier {
        Tier::Gentle => 0x6a09_e667_f3bc_c908,
        Tier::Standard => 0xbb67_ae85_84ca_a73b,
        Tier::Brutal => 0x3c6e_f372_fe94_f82b,
    }
}
