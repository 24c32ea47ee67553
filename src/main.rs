use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod fixtures;
mod metrics;
mod models;
mod narratives;
mod report;

use crate::fixtures::{BuiltinFixtures, CsvTopicProvider, DataProvider};
use crate::models::Fixtures;
use crate::narratives::NarrativeCatalog;
use crate::report::{Section, ViewState};

#[derive(Parser)]
#[command(name = "workforce-insights")]
#[command(about = "Content and attendance insights for the employee assistant", long_about = None)]
struct Cli {
    /// Load topics from a CSV file instead of the builtin data set
    #[arg(long, global = true, env = "INSIGHTS_TOPICS_CSV")]
    topics_csv: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics by question volume with trend and quality
    Topics,
    /// Rank content gaps by priority
    Gaps {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show before/after impact of a content update
    Impact {
        #[arg(long, default_value_t = 0)]
        update: usize,
    },
    /// Summarize absences by shift and weekday
    Attendance,
    /// Show ROI metrics
    Roi,
    /// Write a dashboard report
    Report {
        #[arg(long, value_enum, default_value_t = SectionArg::All)]
        section: SectionArg,
        #[arg(long, default_value_t = 0)]
        update: usize,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SectionArg {
    All,
    Insights,
    Impact,
    Unified,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::All => Section::All,
            SectionArg::Insights => Section::Insights,
            SectionArg::Impact => Section::Impact,
            SectionArg::Unified => Section::Unified,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let fixtures = load_fixtures(cli.topics_csv.as_deref())?;
    let narratives = NarrativeCatalog::builtin();

    match cli.command {
        Commands::Topics => {
            let view = report::insights_view(&fixtures, &narratives);
            if view.topics.is_empty() {
                println!("No topics loaded.");
                return Ok(());
            }

            println!("Topics by question volume:");
            let mut rows: Vec<_> = view.topics.iter().collect();
            rows.sort_by(|a, b| b.topic.question_count.cmp(&a.topic.question_count));
            for row in rows {
                println!(
                    "- {}: {} questions, {} {:+}%, quality {}% ({})",
                    row.topic.name,
                    report::with_thousands(u64::from(row.topic.question_count)),
                    row.trend_direction.arrow(),
                    row.topic.trend_percent,
                    row.topic.quality_score,
                    row.quality.label()
                );
            }
        }
        Commands::Gaps { limit } => {
            let view = report::insights_view(&fixtures, &narratives);
            if view.gaps.is_empty() {
                println!("No content gaps flagged.");
                return Ok(());
            }

            println!("Content gaps by priority:");
            for gap in view.gaps.iter().take(limit) {
                println!(
                    "{}. {} (quality {}%, {}), ~{} employees/month not getting answers",
                    gap.rank,
                    gap.topic.name,
                    gap.topic.quality_score,
                    gap.quality.label(),
                    gap.unresolved_per_month
                );
                if let Some(narrative) = gap.narrative {
                    println!("   {}", narrative.recommended_action);
                }
            }
        }
        Commands::Impact { update } => {
            let view = report::impact_view(&fixtures, update)?;
            println!("{} ({})", view.topic_name, view.status_label);
            for card in &view.cards {
                match card.after {
                    Some(after) => println!(
                        "- {}: {}{} -> {}{} ({})",
                        card.label,
                        card.before,
                        card.unit,
                        after,
                        card.unit,
                        report::describe_impact(card.impact)
                    ),
                    None => println!("- {}: no update yet", card.label),
                }
            }
            println!(
                "{} of {} gaps addressed, {} questions/month reduced, ~{} HR hours saved",
                view.summary.updates_addressed,
                view.summary.gaps_total,
                view.summary.questions_reduced,
                view.summary.hr_hours_saved
            );
        }
        Commands::Attendance => {
            let view = report::unified_view(&fixtures);
            println!("{} absences across all shifts:", view.total_absences);
            for row in &view.shifts {
                let flag = if row.elevated { " (elevated)" } else { "" };
                println!(
                    "- {}: {} absences at {:.1}%{}",
                    row.shift.shift_name, row.shift.absences, row.shift.absence_rate_percent, flag
                );
            }
            if let Some(peak) = view.weekday_peak {
                println!(
                    "{} absences are {}% higher than the midweek average.",
                    peak.weekday, peak.percent_above_midweek
                );
            }
        }
        Commands::Roi => {
            for display in metrics::aggregate_roi(&fixtures.roi) {
                println!(
                    "- {}: {} -> {} ({})",
                    display.metric.name,
                    display.metric.baseline,
                    display.metric.current,
                    display.caption
                );
            }
        }
        Commands::Report {
            section,
            update,
            format,
            out,
        } => {
            let view = ViewState {
                section: section.into(),
                selected_update: update,
            };
            let dashboard = report::build_dashboard(&fixtures, &narratives, view)?;
            let contents = match format {
                Format::Markdown => report::build_report(&dashboard),
                Format::Json => report::render_json(&dashboard)?,
            };
            std::fs::write(&out, contents)
                .with_context(|| format!("failed to write report: {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_fixtures(topics_csv: Option<&Path>) -> anyhow::Result<Fixtures> {
    let provider: Box<dyn DataProvider> = match topics_csv {
        Some(path) => Box::new(CsvTopicProvider::new(path)),
        None => Box::new(BuiltinFixtures),
    };
    provider.load()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_command_defaults() {
        let cli = Cli::try_parse_from(["workforce-insights", "report"]).unwrap();
        match cli.command {
            Commands::Report {
                section,
                update,
                format,
                out,
            } => {
                assert_eq!(Section::from(section), Section::All);
                assert_eq!(update, 0);
                assert!(format == Format::Markdown);
                assert_eq!(out, PathBuf::from("report.md"));
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn section_flag_maps_to_view_section() {
        let cli = Cli::try_parse_from(["workforce-insights", "report", "--section", "unified"])
            .unwrap();
        match cli.command {
            Commands::Report { section, .. } => {
                assert_eq!(Section::from(section), Section::Unified);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn dashboard_json_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dashboard.json");
        let fixtures = load_fixtures(None).unwrap();
        let narratives = NarrativeCatalog::builtin();
        let dashboard =
            report::build_dashboard(&fixtures, &narratives, ViewState::default()).unwrap();

        std::fs::write(&out, report::render_json(&dashboard).unwrap()).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.contains("\"total_absences\": 264"));
    }
}
