mod logic;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use jumpwin_core::{EvaluatorConfig, WindowStrategy};
use log::{debug, error};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    DifficultyAggregate, DifficultyRecord, RunnerKind, Tier, aggregate_difficulty,
    expand_scenarios, resolve_seed_inputs, run_difficulty_analysis,
};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Count feasible (start, end) pairs per jump
    Pairs,
    /// Count start frames with at least one winning end
    Starts,
}

impl From<StrategyArg> for WindowStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Pairs => WindowStrategy::PairCounting,
            StrategyArg::Starts => WindowStrategy::StartCounting,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "jumpwin-tester", version = "0.1.0")]
#[command(about = "Score generated gate courses with the jump-window difficulty search")]
struct Args {
    /// Seeds to run: integers or course codes like GC-BRUTAL-7 (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Course tiers to generate (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    tiers: String,

    /// Runners recording the scored playthrough (comma-separated, or "all")
    #[arg(long, default_value = "human,agent")]
    runners: String,

    /// Window strategy; overrides the config file
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Longest jump hold tried by the pair search; overrides the config file
    #[arg(long)]
    max_hold: Option<usize>,

    /// Worker threads for the window search; overrides the config file
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-evaluation deadline in milliseconds; overrides the config file
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON evaluator configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if args.output.is_some() || args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let config = build_config(&args)?;
    debug!("evaluator config: {config:?}");

    let tiers = parse_tiers(&args.tiers)?;
    let runners = parse_runners(&args.runners)?;
    let scenarios = expand_scenarios(&tiers, &runners);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let records = run_difficulty_analysis(&config, &scenarios, &seed_infos)?;
    let aggregates = aggregate_difficulty(&records);

    write_reports(&args, &records, &aggregates, start_time)?;

    let fatal = records.iter().filter(|r| r.fatal).count();
    if fatal > 0 {
        error!("{fatal} evaluation(s) hit a fatal error");
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for scenario in expand_scenarios(&Tier::ALL, &RunnerKind::ALL) {
        writeln!(
            output_target.writer(),
            "  {:25} - {} course, {}",
            scenario.key(),
            scenario.tier,
            scenario.runner.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🦘 Jump-Window Difficulty Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn build_config(args: &Args) -> Result<EvaluatorConfig> {
    let mut config = match &args.config {
        Some(path) => EvaluatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EvaluatorConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(max_hold) = args.max_hold {
        config.max_hold_frames = max_hold;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }
    config.validate().context("invalid evaluator configuration")?;
    Ok(config)
}

fn parse_tiers(arg: &str) -> Result<Vec<Tier>> {
    let tokens = split_csv(arg);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(Tier::ALL.to_vec());
    }
    let mut tiers = Vec::new();
    for token in tokens {
        let Some(tier) = Tier::parse(&token) else {
            bail!("Unknown tier: {token}");
        };
        if !tiers.contains(&tier) {
            tiers.push(tier);
        }
    }
    if tiers.is_empty() {
        bail!("No tiers selected");
    }
    Ok(tiers)
}

fn parse_runners(arg: &str) -> Result<Vec<RunnerKind>> {
    let tokens = split_csv(arg);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(RunnerKind::ALL.to_vec());
    }
    let mut runners = Vec::new();
    for token in tokens {
        let Some(runner) = RunnerKind::parse(&token) else {
            bail!("Unknown runner: {token}");
        };
        if !runners.contains(&runner) {
            runners.push(runner);
        }
    }
    if runners.is_empty() {
        bail!("No runners selected");
    }
    Ok(runners)
}

fn write_reports(
    args: &Args,
    records: &[DifficultyRecord],
    aggregates: &[DifficultyAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(output_target.writer(), records, aggregates)?;
        }
        "markdown" => {
            if records.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Jump-Window Difficulty Report\n\n_No evaluations executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(
                    output_target.writer(),
                    records,
                    aggregates,
                )?;
            }
        }
        "csv" => {
            logic::reports::generate_csv_report(output_target.writer(), records)?;
        }
        _ => {
            if records.is_empty() {
                writeln!(&mut output_target, "No evaluations executed.")?;
            } else {
                logic::reports::generate_console_report(
                    output_target.writer(),
                    records,
                    aggregates,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::seeds::SeedInfo;
    use jumpwin_core::Outcome;

    fn base_args() -> Args {
        Args {
            seeds: "1337".to_string(),
            tiers: "all".to_string(),
            runners: "human,agent".to_string(),
            strategy: None,
            max_hold: None,
            concurrency: Some(1),
            timeout_ms: None,
            config: None,
            report: "json".to_string(),
            output: None,
            list_scenarios: false,
            verbose: false,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("jumpwin-{}-{name}", std::process::id()))
    }

    fn sample_records() -> (Vec<DifficultyRecord>, Vec<DifficultyAggregate>) {
        let config = build_config(&base_args()).unwrap();
        let scenarios = expand_scenarios(&[Tier::Gentle], &[RunnerKind::Agent]);
        let records =
            run_difficulty_analysis(&config, &scenarios, &[SeedInfo::from_numeric(5)]).unwrap();
        let aggregates = aggregate_difficulty(&records);
        (records, aggregates)
    }

    #[test]
    fn cli_overrides_take_precedence_over_config_file() {
        let path = temp_file("config.json");
        std::fs::write(
            &path,
            r#"{"strategy": "start_counting", "max_hold_frames": 9, "timeout_ms": 500}"#,
        )
        .unwrap();
        let args = Args {
            config: Some(path),
            max_hold: Some(12),
            strategy: Some(StrategyArg::Pairs),
            ..base_args()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.strategy, WindowStrategy::PairCounting);
        assert_eq!(config.max_hold_frames, 12);
        assert_eq!(config.timeout_ms, Some(500));
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args {
            max_hold: Some(0),
            ..base_args()
        };
        assert!(build_config(&args).is_err());

        let args = Args {
            config: Some(temp_file("missing.json")),
            ..base_args()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn tiers_and_runners_expand_all_keyword() {
        assert_eq!(parse_tiers("all").unwrap(), Tier::ALL.to_vec());
        assert_eq!(
            parse_tiers("brutal, gentle,brutal").unwrap(),
            vec![Tier::Brutal, Tier::Gentle]
        );
        assert_eq!(parse_runners("ALL").unwrap(), RunnerKind::ALL.to_vec());
        assert!(parse_runners("agent,robot").is_err());
        assert!(parse_tiers(" , ").is_err());
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("brutal/hopper"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_json_for_records() {
        let (records, aggregates) = sample_records();
        let temp = temp_file("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &records, &aggregates, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["records"][0]["scenario_name"], "Gentle - Agent");
        assert_eq!(value["records"][0]["outcome"], serde_json::json!(Outcome::Win));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No evaluations executed"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let (records, aggregates) = sample_records();
        let temp = temp_file("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &records, &aggregates, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("scenario,tier,runner"));
        assert!(content.contains("Gentle - Agent,GENTLE,Agent,GC-GENTLE-5"));
    }

    #[test]
    fn write_reports_console_includes_summary() {
        let (records, aggregates) = sample_records();
        let temp = temp_file("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &records, &aggregates, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Difficulty Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
