use std::fmt::Write;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::{
    self, Impact, ImpactSummary, MonthlyResolution, Polarity, QualityBand, RoiDisplay,
    TopicSummary, TrendDirection, TrendSeverity, WeekdayPeak, WeeklyAttendanceTotal,
};
use crate::models::{ContentUpdate, CorrelationInsight, Fixtures, ShiftSummary, Topic};
use crate::narratives::{Narrative, NarrativeCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    All,
    Insights,
    Impact,
    Unified,
}

/// What the caller is looking at. Owned by the caller and passed in per render.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewState {
    pub section: Section,
    pub selected_update: usize,
}

impl ViewState {
    fn shows(&self, section: Section) -> bool {
        self.section == Section::All || self.section == section
    }
}

#[derive(Debug, Serialize)]
pub struct TopicRow<'a> {
    pub topic: &'a Topic,
    pub quality: QualityBand,
    pub trend_severity: TrendSeverity,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Serialize)]
pub struct GapRow<'a> {
    pub rank: usize,
    pub topic: &'a Topic,
    pub quality: QualityBand,
    pub unresolved_per_month: u32,
    pub narrative: Option<&'a Narrative>,
}

#[derive(Debug, Serialize)]
pub struct InsightsView<'a> {
    pub summary: TopicSummary,
    pub topics: Vec<TopicRow<'a>>,
    pub gaps: Vec<GapRow<'a>>,
    pub monthly: Vec<MonthlyResolution>,
}

#[derive(Debug, Serialize)]
pub struct ImpactCard {
    pub label: &'static str,
    pub unit: &'static str,
    pub before: u32,
    pub after: Option<u32>,
    pub impact: Impact,
}

#[derive(Debug, Serialize)]
pub struct ImpactView<'a> {
    pub summary: ImpactSummary,
    pub topic_name: &'a str,
    pub update: &'a ContentUpdate,
    pub status_label: &'static str,
    pub cards: Vec<ImpactCard>,
    pub marker_week: Option<NaiveDate>,
    pub unresolved_per_month: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ShiftRow<'a> {
    pub shift: &'a ShiftSummary,
    pub elevated: bool,
}

#[derive(Debug, Serialize)]
pub struct InsightRow<'a> {
    pub marker: &'static str,
    pub insight: &'a CorrelationInsight,
}

#[derive(Debug, Serialize)]
pub struct UnifiedView<'a> {
    pub total_absences: u32,
    pub shifts: Vec<ShiftRow<'a>>,
    pub weekday_peak: Option<WeekdayPeak>,
    pub weekly: Vec<WeeklyAttendanceTotal>,
    pub insights: Vec<InsightRow<'a>>,
    pub roi: Vec<RoiDisplay<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<InsightsView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unified: Option<UnifiedView<'a>>,
}

pub fn build_dashboard<'a>(
    fixtures: &'a Fixtures,
    narratives: &'a NarrativeCatalog,
    view: ViewState,
) -> anyhow::Result<Dashboard<'a>> {
    let insights = view
        .shows(Section::Insights)
        .then(|| insights_view(fixtures, narratives));
    let impact = if view.shows(Section::Impact) {
        Some(impact_view(fixtures, view.selected_update)?)
    } else {
        None
    };
    let unified = view.shows(Section::Unified).then(|| unified_view(fixtures));

    Ok(Dashboard {
        insights,
        impact,
        unified,
    })
}

pub fn insights_view<'a>(
    fixtures: &'a Fixtures,
    narratives: &'a NarrativeCatalog,
) -> InsightsView<'a> {
    let topics = fixtures
        .topics
        .iter()
        .map(|topic| TopicRow {
            topic,
            quality: metrics::classify_quality(topic.quality_score),
            trend_severity: metrics::classify_trend_severity(topic.trend_percent),
            trend_direction: metrics::trend_direction(topic.trend_percent),
        })
        .collect();

    let gaps = metrics::rank_gaps(&fixtures.topics)
        .into_iter()
        .enumerate()
        .map(|(index, topic)| GapRow {
            rank: index + 1,
            topic,
            quality: metrics::classify_quality(topic.quality_score),
            unresolved_per_month: metrics::estimate_unresolved_volume(
                topic.question_count,
                topic.quality_score,
            ),
            narrative: narratives.get(&topic.id),
        })
        .collect();

    InsightsView {
        summary: metrics::summarize_topics(&fixtures.topics),
        topics,
        gaps,
        monthly: metrics::monthly_resolution(&fixtures.monthly_volume),
    }
}

pub fn impact_view(fixtures: &Fixtures, selected_update: usize) -> anyhow::Result<ImpactView<'_>> {
    let update = fixtures.content_updates.get(selected_update).with_context(|| {
        format!(
            "content update {selected_update} does not exist ({} available)",
            fixtures.content_updates.len()
        )
    })?;

    let topic = fixtures.topics.iter().find(|topic| topic.id == update.topic_id);
    let topic_name = topic.map_or(update.topic_id.as_str(), |topic| topic.name.as_str());
    let after = update.after;

    let cards = vec![
        impact_card(
            "Questions / Month",
            "",
            update.before.question_count,
            after.map(|m| m.question_count),
            Polarity::LowerIsBetter,
        ),
        impact_card(
            "Resolution Quality",
            "%",
            u32::from(update.before.quality_score),
            after.map(|m| u32::from(m.quality_score)),
            Polarity::HigherIsBetter,
        ),
        impact_card(
            "Fallback-to-HR Rate",
            "%",
            u32::from(update.before.fallback_rate),
            after.map(|m| u32::from(m.fallback_rate)),
            Polarity::LowerIsBetter,
        ),
    ];

    let unresolved_per_month = after.is_none().then(|| {
        metrics::estimate_unresolved_volume(
            update.before.question_count,
            update.before.quality_score,
        )
    });

    Ok(ImpactView {
        summary: metrics::impact_summary(&fixtures.content_updates, &fixtures.topics),
        topic_name,
        update,
        status_label: metrics::impact_status(update.status),
        cards,
        marker_week: metrics::update_marker_week(update),
        unresolved_per_month,
    })
}

fn impact_card(
    label: &'static str,
    unit: &'static str,
    before: u32,
    after: Option<u32>,
    polarity: Polarity,
) -> ImpactCard {
    ImpactCard {
        label,
        unit,
        before,
        after,
        impact: metrics::compute_impact(before, after, polarity),
    }
}

pub fn unified_view(fixtures: &Fixtures) -> UnifiedView<'_> {
    UnifiedView {
        total_absences: metrics::total_absences(&fixtures.shifts),
        shifts: fixtures
            .shifts
            .iter()
            .map(|shift| ShiftRow {
                shift,
                elevated: metrics::is_elevated_absence(shift.absence_rate_percent),
            })
            .collect(),
        weekday_peak: metrics::weekday_peak(&fixtures.weekdays),
        weekly: metrics::attendance_totals(&fixtures.attendance),
        insights: fixtures
            .insights
            .iter()
            .map(|insight| InsightRow {
                marker: metrics::insight_marker(insight.kind),
                insight,
            })
            .collect(),
        roi: metrics::aggregate_roi(&fixtures.roi),
    }
}

pub fn week_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

pub fn describe_impact(impact: Impact) -> String {
    match impact {
        Impact::Measured {
            improved: true,
            change_percent,
        } => format!("{change_percent}% improvement"),
        Impact::Measured {
            improved: false,
            change_percent,
        } => format!("{change_percent}% regression"),
        Impact::NoUpdateYet => "no update yet".to_string(),
        Impact::NotApplicable => "change not applicable".to_string(),
    }
}

pub fn render_json(dashboard: &Dashboard<'_>) -> anyhow::Result<String> {
    serde_json::to_string_pretty(dashboard).context("failed to serialize dashboard")
}

pub fn build_report(dashboard: &Dashboard<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Workforce Insights Report");

    if let Some(insights) = &dashboard.insights {
        write_insights(&mut output, insights);
    }
    if let Some(impact) = &dashboard.impact {
        write_impact(&mut output, impact);
    }
    if let Some(unified) = &dashboard.unified {
        write_unified(&mut output, unified);
    }

    output
}

fn write_insights(output: &mut String, view: &InsightsView<'_>) {
    let summary = &view.summary;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Content Insights");
    let _ = writeln!(
        output,
        "{} questions, average resolution quality {}%, {} content gaps",
        with_thousands(summary.total_questions),
        summary.average_quality,
        summary.gap_count
    );
    if let Some((name, trend)) = &summary.top_trending {
        let _ = writeln!(output, "Top trending topic: {name} ({trend:+}%)");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Topic Demand");
    if view.topics.is_empty() {
        let _ = writeln!(output, "No topics recorded.");
    }
    for row in &view.topics {
        let flag = if row.topic.is_gap() { " (gap)" } else { "" };
        let severity = match row.trend_severity {
            TrendSeverity::High => ", high",
            TrendSeverity::Normal => "",
        };
        let _ = writeln!(
            output,
            "- {}{}: {} questions, {} {:+}%{}, quality {}% ({})",
            row.topic.name,
            flag,
            with_thousands(u64::from(row.topic.question_count)),
            row.trend_direction.arrow(),
            row.topic.trend_percent,
            severity,
            row.topic.quality_score,
            row.quality.label()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### What to Fix Next");
    if view.gaps.is_empty() {
        let _ = writeln!(output, "No content gaps flagged.");
    }
    for gap in &view.gaps {
        let _ = writeln!(
            output,
            "{}. {} (quality {}%, {}): ~{} employees/month not getting answers",
            gap.rank,
            gap.topic.name,
            gap.topic.quality_score,
            gap.quality.label(),
            gap.unresolved_per_month
        );
        if let Some(narrative) = gap.narrative {
            let _ = writeln!(output, "   - Gap: {}", narrative.gap_detail);
            let _ = writeln!(output, "   - Action: {}", narrative.recommended_action);
            if let Some(note) = &narrative.note {
                let _ = writeln!(output, "   - Note: {note}");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Question Volume");
    for month in &view.monthly {
        let share = month
            .resolved_percent
            .map_or_else(|| "n/a".to_string(), |percent| format!("{percent}%"));
        let _ = writeln!(
            output,
            "- {}: {} total, {} resolved ({})",
            month.month,
            with_thousands(u64::from(month.total_questions)),
            with_thousands(u64::from(month.resolved_questions)),
            share
        );
    }
}

fn write_impact(output: &mut String, view: &ImpactView<'_>) {
    let summary = &view.summary;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Content Impact");
    let _ = writeln!(
        output,
        "{} of {} gaps addressed, {} questions/month reduced, ~{} HR hours saved/month",
        summary.updates_addressed,
        summary.gaps_total,
        summary.questions_reduced,
        summary.hr_hours_saved
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "### {} ({})", view.topic_name, view.status_label);
    let _ = writeln!(output, "{}", view.update.details);
    if let (Some(by), Some(on)) = (&view.update.updated_by, view.update.updated_on) {
        let _ = writeln!(output, "Updated {} by {}", on.format("%b %-d, %Y"), by);
    }

    let _ = writeln!(output);
    for card in &view.cards {
        match card.after {
            Some(after) => {
                let _ = writeln!(
                    output,
                    "- {}: {}{} -> {}{} ({})",
                    card.label,
                    card.before,
                    card.unit,
                    after,
                    card.unit,
                    describe_impact(card.impact)
                );
            }
            None => {
                let _ = writeln!(
                    output,
                    "- {}: {}{} (no update yet)",
                    card.label, card.before, card.unit
                );
            }
        }
    }

    let _ = writeln!(output);
    match view.marker_week {
        Some(week) => {
            let _ = writeln!(output, "Content updated in the week of {}", week_label(week));
        }
        None => {
            let _ = writeln!(
                output,
                "No content update: flat trend indicates stagnant quality"
            );
        }
    }
    for point in &view.update.weekly {
        let _ = writeln!(
            output,
            "- {}: {} questions, quality {}%",
            week_label(point.week_start),
            point.question_count,
            point.quality_score
        );
    }

    if let Some(unresolved) = view.unresolved_per_month {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "~{} employees per month are not getting the answers they need about {}.",
            unresolved, view.topic_name
        );
    }
}

fn write_unified(output: &mut String, view: &UnifiedView<'_>) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    let _ = writeln!(output, "{} absences across all shifts", view.total_absences);

    let _ = writeln!(output);
    let _ = writeln!(output, "### Shifts");
    for row in &view.shifts {
        let flag = if row.elevated { " (elevated)" } else { "" };
        let _ = writeln!(
            output,
            "- {}: {} absences, {:.1}%{} absence rate, {} EA questions, top topic {} ({}%)",
            row.shift.shift_name,
            row.shift.absences,
            row.shift.absence_rate_percent,
            flag,
            with_thousands(u64::from(row.shift.assistant_usage)),
            row.shift.top_topic,
            row.shift.top_topic_share_percent
        );
    }

    if let Some(peak) = &view.weekday_peak {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "{} absences are {}% higher than the midweek average.",
            peak.weekday, peak.percent_above_midweek
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Weekly Absences and EA Questions");
    for week in &view.weekly {
        let _ = writeln!(
            output,
            "- {}: {} absences, {} EA questions",
            week_label(week.week_start),
            week.absences,
            with_thousands(u64::from(week.assistant_questions))
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Connected Insights");
    if view.insights.is_empty() {
        let _ = writeln!(output, "No connected insights for this window.");
    }
    for row in &view.insights {
        let insight = row.insight;
        let _ = writeln!(output, "- {} {}", row.marker, insight.title);
        let _ = writeln!(output, "  {}", insight.narrative);
        let _ = writeln!(output, "  What this means: {}", insight.recommended_action);
        let _ = writeln!(output, "  Confidence: {}", insight.confidence);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## ROI");
    for display in &view.roi {
        let _ = writeln!(
            output,
            "- {}: {} -> {} ({})",
            display.metric.name, display.metric.baseline, display.metric.current, display.caption
        );
    }
}
