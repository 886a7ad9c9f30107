use anyhow::{Context, Result};
use jumpwin_core::numbers::usize_to_f64;
use jumpwin_core::{
    DifficultyEvaluator, EvalError, Evaluation, EvaluatorConfig, FailureCause, Outcome,
    WindowStrategy,
};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use super::course::{GateCourse, Tier};
use super::runners::RunnerKind;
use super::seeds::SeedInfo;
use super::simulator::CourseOracle;

/// One (tier, runner) pairing to evaluate across every seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Scenario {
    pub tier: Tier,
    pub runner: RunnerKind,
}

impl Scenario {
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} - {}", self.tier, self.runner)
    }

    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.tier.code().to_lowercase(), self.runner.key())
    }
}

/// Every combination of `tiers` and `runners`, tier-major.
#[must_use]
pub fn expand_scenarios(tiers: &[Tier], runners: &[RunnerKind]) -> Vec<Scenario> {
    tiers
        .iter()
        .flat_map(|&tier| runners.iter().map(move |&runner| Scenario { tier, runner }))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DifficultyRecord {
    pub scenario_name: String,
    pub tier: Tier,
    pub runner: String,
    pub strategy: WindowStrategy,
    pub seed_code: String,
    pub seed_value: u64,
    pub gates: usize,
    pub length: usize,
    pub outcome: Option<Outcome>,
    pub failure: Option<FailureCause>,
    pub jumps_found: usize,
    pub jumps_pruned: usize,
    pub difficulty: Option<f64>,
    pub objective: Option<f64>,
    pub error: Option<String>,
    pub fatal: bool,
    pub elapsed_ms: u128,
}

impl DifficultyRecord {
    fn new(
        scenario: Scenario,
        seed: &SeedInfo,
        course: &GateCourse,
        strategy: WindowStrategy,
    ) -> Self {
        Self {
            scenario_name: scenario.name(),
            tier: scenario.tier,
            runner: scenario.runner.label().to_string(),
            strategy,
            seed_code: seed.code_for_tier(scenario.tier),
            seed_value: seed.seed,
            gates: course.gates.len(),
            length: course.length,
            outcome: None,
            failure: None,
            jumps_found: 0,
            jumps_pruned: 0,
            difficulty: None,
            objective: None,
            error: None,
            fatal: false,
            elapsed_ms: 0,
        }
    }

    fn with_result(mut self, result: Result<Evaluation, EvalError>) -> Self {
        match result {
            Ok(evaluation) => {
                self.outcome = Some(evaluation.original);
                self.failure = evaluation.failure;
                self.jumps_found = evaluation.jumps_found;
                self.jumps_pruned = evaluation.jumps_pruned;
                self.difficulty = Some(evaluation.difficulty);
                self.objective = Some(evaluation.objective);
            }
            Err(err) => {
                self.fatal = err.is_fatal();
                self.error = Some(err.to_string());
            }
        }
        self
    }

    /// Scored by window search rather than a penalty or an error.
    #[must_use]
    pub fn window_scored(&self) -> bool {
        self.difficulty.is_some() && self.failure.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DifficultyAggregate {
    pub scenario_name: String,
    pub tier: Tier,
    pub runner: String,
    pub runs: usize,
    pub scored: usize,
    pub penalized: usize,
    pub errors: usize,
    pub mean_difficulty: f64,
    pub std_difficulty: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub win_rate: f64,
    pub mean_jumps_pruned: f64,
}

/// Generate, record and score every scenario on every matching seed.
///
/// # Errors
///
/// Fails only when an evaluator cannot be built; per-run errors are captured
/// in the records.
pub fn run_difficulty_analysis(
    config: &EvaluatorConfig,
    scenarios: &[Scenario],
    seeds: &[SeedInfo],
) -> Result<Vec<DifficultyRecord>> {
    let mut records = Vec::with_capacity(scenarios.len() * seeds.len());
    let mut evaluators: BTreeMap<RunnerKind, DifficultyEvaluator<CourseOracle>> = BTreeMap::new();

    for &scenario in scenarios {
        if !evaluators.contains_key(&scenario.runner) {
            let evaluator = DifficultyEvaluator::new(CourseOracle, config.clone())
                .context("failed to build difficulty evaluator")?
                .with_actor(scenario.runner.actor());
            evaluators.insert(scenario.runner, evaluator);
        }
        let Some(evaluator) = evaluators.get(&scenario.runner) else {
            continue;
        };

        for seed in seeds.iter().filter(|seed| seed.matches_tier(scenario.tier)) {
            let course = GateCourse::generate(scenario.tier, seed.seed);
            let started = Instant::now();
            let result = evaluator.try_evaluate(&course);
            let mut record =
                DifficultyRecord::new(scenario, seed, &course, config.strategy).with_result(result);
            record.elapsed_ms = started.elapsed().as_millis();

            match (&record.error, record.difficulty) {
                (Some(error), _) => warn!("{} {}: {error}", record.scenario_name, record.seed_code),
                (None, Some(difficulty)) => info!(
                    "{} {}: difficulty {difficulty}",
                    record.scenario_name, record.seed_code
                ),
                (None, None) => {}
            }
            records.push(record);
        }
    }

    Ok(records)
}

pub fn aggregate_difficulty(records: &[DifficultyRecord]) -> Vec<DifficultyAggregate> {
    let mut aggregates: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for record in records {
        aggregates
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
    }
    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

struct AggregateBuilder {
    scenario_name: String,
    tier: Tier,
    runner: String,
    runs: usize,
    penalized: usize,
    errors: usize,
    wins: usize,
    pruned_sum: usize,
    difficulty: RunningStats,
}

impl AggregateBuilder {
    fn new(record: &DifficultyRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            tier: record.tier,
            runner: record.runner.clone(),
            runs: 0,
            penalized: 0,
            errors: 0,
            wins: 0,
            pruned_sum: 0,
            difficulty: RunningStats::default(),
        }
    }

    fn ingest(&mut self, record: &DifficultyRecord) {
        self.runs += 1;
        if record.error.is_some() {
            self.errors += 1;
        }
        if record.failure.is_some() {
            self.penalized += 1;
        }
        if record.outcome.is_some_and(Outcome::is_win) {
            self.wins += 1;
        }
        self.pruned_sum = self.pruned_sum.saturating_add(record.jumps_pruned);
        if record.window_scored()
            && let Some(difficulty) = record.difficulty
        {
            self.difficulty.add(difficulty);
        }
    }

    fn finish(self) -> DifficultyAggregate {
        let denom = usize_to_f64(self.runs.max(1));
        DifficultyAggregate {
            scenario_name: self.scenario_name,
            tier: self.tier,
            runner: self.runner,
            runs: self.runs,
            scored: self.difficulty.count,
            penalized: self.penalized,
            errors: self.errors,
            mean_difficulty: self.difficulty.mean(),
            std_difficulty: self.difficulty.std_dev(),
            min_difficulty: self.difficulty.min(),
            max_difficulty: self.difficulty.max(),
            win_rate: usize_to_f64(self.wins) / denom,
            mean_jumps_pruned: usize_to_f64(self.pruned_sum) / denom,
        }
    }
}

#[derive(Debug, Clone)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = usize_to_f64(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / usize_to_f64(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    fn min(&self) -> f64 {
        if self.min.is_finite() { self.min } else { 0.0 }
    }

    fn max(&self) -> f64 {
        if self.max.is_finite() { self.max } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EvaluatorConfig {
        EvaluatorConfig::default().with_max_concurrency(2)
    }

    #[test]
    fn scenarios_expand_tier_major() {
        let scenarios = expand_scenarios(
            &[Tier::Gentle, Tier::Brutal],
            &[RunnerKind::Agent, RunnerKind::Forward],
        );
        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[1].key(), "gentle/forward");
        assert_eq!(scenarios[2].name(), "Brutal - Agent");
    }

    #[test]
    fn agent_runs_are_window_scored() {
        let scenarios = expand_scenarios(&[Tier::Standard], &[RunnerKind::Agent]);
        let seeds = vec![SeedInfo::from_numeric(11)];
        let records = run_difficulty_analysis(&config(), &scenarios, &seeds).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.window_scored(), "{record:?}");
        assert_eq!(record.jumps_found, record.gates);
        assert_eq!(record.jumps_pruned, 0);
        let difficulty = record.difficulty.unwrap();
        assert!(difficulty > 0.0 && difficulty < 1.0);
    }

    #[test]
    fn forward_runs_take_hazard_penalties() {
        let scenarios = expand_scenarios(&[Tier::Gentle], &[RunnerKind::Forward]);
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let records = run_difficulty_analysis(&config(), &scenarios, &seeds).unwrap();

        for record in &records {
            assert!(matches!(
                record.failure,
                Some(FailureCause::DiedToEnemy | FailureCause::DiedToFall)
            ));
            assert!(matches!(record.difficulty, Some(d) if d == -5.0 || d == -6.0));
        }

        let aggregates = aggregate_difficulty(&records);
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].runs, 2);
        assert_eq!(aggregates[0].penalized, 2);
        assert_eq!(aggregates[0].scored, 0);
        assert_eq!(aggregates[0].win_rate, 0.0);
    }

    #[test]
    fn coded_seeds_skip_other_tiers() {
        let scenarios = expand_scenarios(&[Tier::Gentle, Tier::Brutal], &[RunnerKind::Agent]);
        let seeds = vec![SeedInfo::from_course_code(
            4,
            Tier::Brutal,
            "GC-BRUTAL-4".to_string(),
        )];
        let records = run_difficulty_analysis(&config(), &scenarios, &seeds).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tier, Tier::Brutal);
        assert_eq!(records[0].seed_code, "GC-BRUTAL-4");
    }

    fn scored_record(outcome: Outcome, pruned: usize) -> DifficultyRecord {
        let scenario = Scenario {
            tier: Tier::Gentle,
            runner: RunnerKind::Human,
        };
        let seed = SeedInfo::from_numeric(9);
        let course = GateCourse::generate(Tier::Gentle, 9);
        let failure = FailureCause::from_outcome(outcome);
        let difficulty = failure.map_or(0.5, FailureCause::penalty);
        let evaluation = Evaluation {
            original: outcome,
            reproducible: failure.is_none(),
            jumps_found: pruned + 1,
            jumps_pruned: pruned,
            window: None,
            failure,
            difficulty,
            objective: -difficulty,
        };
        DifficultyRecord::new(scenario, &seed, &course, WindowStrategy::PairCounting)
            .with_result(Ok(evaluation))
    }

    #[test]
    fn aggregates_average_over_every_run() {
        let records = vec![
            scored_record(Outcome::Win, 3),
            scored_record(Outcome::DiedToEnemy, 0),
            scored_record(Outcome::Win, 2),
            scored_record(Outcome::TimedOut, 0),
        ];
        let aggregates = aggregate_difficulty(&records);

        assert_eq!(aggregates.len(), 1);
        let aggregate = &aggregates[0];
        assert_eq!(aggregate.runs, 4);
        assert_eq!(aggregate.scored, 2);
        assert_eq!(aggregate.penalized, 2);
        assert_eq!(aggregate.errors, 0);
        assert_eq!(aggregate.win_rate, 0.5);
        assert_eq!(aggregate.mean_jumps_pruned, 1.25);
        assert_eq!(aggregate.mean_difficulty, 0.5);
        assert_eq!(aggregate.std_difficulty, 0.0);
    }

    #[test]
    fn running_stats_track_extremes() {
        let mut stats = RunningStats::default();
        for value in [0.2, 0.4, 0.6] {
            stats.add(value);
        }
        assert!((stats.mean() - 0.4).abs() < 1e-12);
        assert_eq!(stats.min(), 0.2);
        assert_eq!(stats.max(), 0.6);
        assert_eq!(RunningStats::default().min(), 0.0);
    }
}
