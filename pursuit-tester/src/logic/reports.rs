use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use pursuit_game::{EpisodeOutcome, Role};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{RunSummary, ScenarioResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    run: Option<&'a RunSummary>,
    scenarios: &'a [ScenarioResult],
}

pub fn generate_console_report<W: Write>(
    writer: &mut W,
    run: Option<&RunSummary>,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    if let Some(run) = run {
        writeln!(writer)?;
        writeln!(writer, "{}", "🏃 Training Run Summary".bright_cyan().bold())?;
        writeln!(writer, "{}", "=======================".cyan())?;
        writeln!(
            writer,
            "Policies: chaser={} evader={} (seed {}, dt {})",
            run.chaser_policy, run.evader_policy, run.plan.seed, run.plan.dt
        )?;
        writeln!(writer, "Episodes: {}", run.episodes.len())?;
        writeln!(
            writer,
            "Captures: {}",
            run.count(EpisodeOutcome::ChaserCaughtEvader)
                .to_string()
                .green()
        )?;
        writeln!(
            writer,
            "Timeouts: {}",
            (run.count(EpisodeOutcome::EvaderSurvivedTimeout)
                + run.count(EpisodeOutcome::ChaserTimedOut))
            .to_string()
            .yellow()
        )?;
        if run.unfinished() > 0 {
            writeln!(writer, "Unfinished: {}", run.unfinished().to_string().red())?;
        }
        writeln!(writer, "Capture rate: {:.1}%", run.capture_rate())?;
        writeln!(writer, "Average ticks: {:.1}", run.average_ticks())?;
        writeln!(
            writer,
            "Average reward: chaser {:+.2}, evader {:+.2}",
            run.average_reward(Role::Chaser),
            run.average_reward(Role::Evader)
        )?;
        writeln!(writer, "Scene changes: {}", run.scene_changes())?;
        writeln!(
            writer,
            "Progression: {} episodes, chaser {} / evader {}, scene index {}",
            run.record.total_episodes,
            run.record.chaser_wins,
            run.record.evader_wins,
            run.record.current_scene_index
        )?;
        writeln!(writer, "Wall clock: {:?}", run.wall_clock)?;
    }

    if results.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Logic Check Results".bright_cyan().bold())?;
    writeln!(writer, "{}", "======================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(writer, "Total scenarios: {total}")?;
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (total - passed).to_string().red())?;
    #[allow(clippy::cast_precision_loss)]
    let success_rate = passed as f64 / total as f64 * 100.0;
    writeln!(writer, "Success rate: {success_rate:.1}%")?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            writer,
            "   Checks: {} ({:?})",
            result.checks_run, result.duration
        )?;
        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(
    writer: &mut W,
    run: Option<&RunSummary>,
    results: &[ScenarioResult],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        run,
        scenarios: results,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(
    writer: &mut W,
    run: Option<&RunSummary>,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(writer, "# Pursuit Arena Test Results\n")?;
    writeln!(
        writer,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    if let Some(run) = run {
        writeln!(writer, "## Training Run\n")?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(
            writer,
            "| Policies | {} vs {} |",
            run.chaser_policy, run.evader_policy
        )?;
        writeln!(writer, "| Episodes | {} |", run.episodes.len())?;
        writeln!(
            writer,
            "| Captures | {} |",
            run.count(EpisodeOutcome::ChaserCaughtEvader)
        )?;
        writeln!(writer, "| Capture rate | {:.1}% |", run.capture_rate())?;
        writeln!(writer, "| Average ticks | {:.1} |", run.average_ticks())?;
        writeln!(writer, "| Scene changes | {} |", run.scene_changes())?;
        writeln!(
            writer,
            "| Total episodes (store) | {} |",
            run.record.total_episodes
        )?;
        writeln!(writer)?;
    }

    if results.is_empty() {
        writeln!(writer, "_No scenarios executed._")?;
        return Ok(());
    }

    writeln!(writer, "## Logic Checks\n")?;
    writeln!(writer, "| Scenario | Status | Checks | Duration |")?;
    writeln!(writer, "|----------|--------|--------|----------|")?;
    for result in results {
        let status = if result.passed { "✅ PASS" } else { "❌ FAIL" };
        writeln!(
            writer,
            "| {} | {} | {} | {:?} |",
            result.scenario_name, status, result.checks_run, result.duration
        )?;
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for result in failed {
            writeln!(writer, "### {}\n", result.scenario_name)?;
            for failure in &result.failures {
                writeln!(writer, "- {failure}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row per played episode.
pub fn generate_csv_report<W: Write>(writer: &mut W, run: Option<&RunSummary>) -> Result<()> {
    writeln!(
        writer,
        "episode,scene,outcome,ticks,sim_seconds,chaser_reward,evader_reward,scene_changed,total_episodes"
    )?;
    let Some(run) = run else {
        return Ok(());
    };
    for ep in &run.episodes {
        writeln!(
            writer,
            "{},{},{},{},{:.3},{:.4},{:.4},{},{}",
            ep.index,
            csv_field(&ep.scene),
            ep.outcome.map_or("unfinished", EpisodeOutcome::label),
            ep.ticks,
            ep.sim_seconds,
            ep.chaser_reward,
            ep.evader_reward,
            ep.scene_changed,
            ep.total_episodes
        )?;
    }
    Ok(())
}
