pub mod analysis;
pub mod course;
pub mod reports;
pub mod runners;
pub mod seeds;
pub mod simulator;

pub use analysis::{
    DifficultyAggregate, DifficultyRecord, aggregate_difficulty, expand_scenarios,
    run_difficulty_analysis,
};
pub use course::Tier;
pub use runners::RunnerKind;
pub use seeds::resolve_seed_inputs;
