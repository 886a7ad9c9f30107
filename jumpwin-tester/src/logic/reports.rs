use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{DifficultyAggregate, DifficultyRecord};

#[derive(Serialize)]
struct JsonReport<'a> {
    records: &'a [DifficultyRecord],
    aggregates: &'a [DifficultyAggregate],
}

fn fmt_difficulty(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |d| format!("{d:.4}"))
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[DifficultyRecord],
    aggregates: &[DifficultyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Difficulty Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;

    let errors = records.iter().filter(|r| r.error.is_some()).count();
    let fatal = records.iter().filter(|r| r.fatal).count();
    writeln!(out, "Evaluations: {}", records.len())?;
    writeln!(
        out,
        "Window-scored: {}",
        records
            .iter()
            .filter(|r| r.window_scored())
            .count()
            .to_string()
            .green()
    )?;
    writeln!(out, "Errors: {} ({fatal} fatal)", errors.to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for aggregate in aggregates {
        writeln!(out, "{}", aggregate.scenario_name.bold())?;
        writeln!(
            out,
            "   Runs: {} (scored {}, penalized {}, errors {})",
            aggregate.runs, aggregate.scored, aggregate.penalized, aggregate.errors
        )?;
        writeln!(
            out,
            "   Difficulty: mean {:.4} ± {:.4} [{:.4}, {:.4}]",
            aggregate.mean_difficulty,
            aggregate.std_difficulty,
            aggregate.min_difficulty,
            aggregate.max_difficulty
        )?;
        writeln!(
            out,
            "   Win rate: {:.1}%  Mean jumps pruned: {:.2}",
            aggregate.win_rate * 100.0,
            aggregate.mean_jumps_pruned
        )?;
    }

    let failed: Vec<&DifficultyRecord> = records.iter().filter(|r| r.error.is_some()).collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "⚠️  Evaluation errors".bright_yellow().bold())?;
        for record in failed {
            let message = record.error.as_deref().unwrap_or_default();
            writeln!(
                out,
                "   • {} {}: {}",
                record.scenario_name,
                record.seed_code,
                message.red()
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[DifficultyRecord],
    aggregates: &[DifficultyAggregate],
) -> Result<()> {
    let report = JsonReport {
        records,
        aggregates,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[DifficultyRecord],
    aggregates: &[DifficultyAggregate],
) -> Result<()> {
    writeln!(out, "# Jump-Window Difficulty Report\n")?;

    writeln!(out, "## Summary\n")?;
    writeln!(
        out,
        "| Scenario | Runs | Scored | Penalized | Errors | Mean | Std | Min | Max | Win rate | Pruned |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|---|---|")?;
    for a in aggregates {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.1}% | {:.2} |",
            a.scenario_name,
            a.runs,
            a.scored,
            a.penalized,
            a.errors,
            a.mean_difficulty,
            a.std_difficulty,
            a.min_difficulty,
            a.max_difficulty,
            a.win_rate * 100.0,
            a.mean_jumps_pruned
        )?;
    }

    writeln!(out, "\n## Evaluations\n")?;
    for record in records {
        writeln!(out, "### {} ({})\n", record.scenario_name, record.seed_code)?;
        writeln!(
            out,
            "- **Outcome**: {}",
            record.outcome.map_or("-", |o| o.label())
        )?;
        writeln!(
            out,
            "- **Jumps**: {} found, {} pruned",
            record.jumps_found, record.jumps_pruned
        )?;
        writeln!(
            out,
            "- **Difficulty**: {}",
            fmt_difficulty(record.difficulty)
        )?;
        if let Some(failure) = record.failure {
            writeln!(out, "- **Penalty**: {}", failure.label())?;
        }
        if let Some(error) = &record.error {
            writeln!(out, "- **Error**: {error}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[DifficultyRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,tier,runner,seed_code,seed_value,strategy,gates,length,outcome,failure,jumps_found,jumps_pruned,difficulty,objective,error,elapsed_ms"
    )?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.scenario_name,
            r.tier.code(),
            r.runner,
            r.seed_code,
            r.seed_value,
            r.strategy,
            r.gates,
            r.length,
            r.outcome.map_or("", |o| o.label()),
            r.failure.map_or("", |f| f.label()),
            r.jumps_found,
            r.jumps_pruned,
            r.difficulty.map(|d| d.to_string()).unwrap_or_default(),
            r.objective.map(|d| d.to_string()).unwrap_or_default(),
            r.error.as_deref().unwrap_or_default().replace(',', ";"),
            r.elapsed_ms
        )?;
    }
    Ok(())
}
