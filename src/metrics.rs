use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{
    ContentUpdate, InsightKind, MonthlyVolume, RoiDirection, RoiMetric, ShiftSummary, Topic,
    UpdateStatus, WeekdayAbsence, WeeklyAttendancePoint,
};

/// Trend magnitude, in percent, above which a topic is flagged.
pub const HIGH_TREND_THRESHOLD: u32 = 20;

/// Shift absence rate, in percent, above which a shift is flagged.
pub const ELEVATED_ABSENCE_RATE: f64 = 5.5;

/// HR handling time assumed for each question the assistant resolves.
pub const HR_MINUTES_PER_QUESTION: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Strong,
    Fair,
    NeedsWork,
}

impl QualityBand {
    pub fn label(self) -> &'static str {
        match self {
            QualityBand::Strong => "Strong",
            QualityBand::Fair => "Fair",
            QualityBand::NeedsWork => "Needs Work",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSeverity {
    High,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            TrendDirection::Up => "↑",
            TrendDirection::Down => "↓",
        }
    }
}

/// Which way a metric has to move to count as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Impact {
    Measured { improved: bool, change_percent: u64 },
    /// No after-metrics recorded for the topic.
    NoUpdateYet,
    /// Baseline of zero, so the change has no percentage.
    NotApplicable,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub total_questions: u64,
    pub average_quality: u8,
    pub gap_count: usize,
    pub top_trending: Option<(String, i32)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyResolution {
    pub month: String,
    pub total_questions: u32,
    pub resolved_questions: u32,
    pub resolved_percent: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub updates_addressed: usize,
    pub gaps_total: usize,
    pub questions_reduced: i64,
    pub hr_hours_saved: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayPeak {
    pub weekday: Weekday,
    pub absences: u32,
    pub percent_above_midweek: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyAttendanceTotal {
    pub week_start: NaiveDate,
    pub absences: u32,
    pub assistant_questions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiTone {
    Positive,
    Highlight,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiDisplay<'a> {
    pub metric: &'a RoiMetric,
    pub tone: RoiTone,
    pub caption: String,
}

pub fn rank_gaps(topics: &[Topic]) -> Vec<&Topic> {
    let mut gaps: Vec<&Topic> = topics.iter().filter(|topic| topic.is_gap()).collect();
    // sort_by_key is stable, duplicates keep their input order
    gaps.sort_by_key(|topic| topic.gap_priority);
    gaps
}

pub fn classify_quality(score: u8) -> QualityBand {
    match score {
        80..=u8::MAX => QualityBand::Strong,
        60..=79 => QualityBand::Fair,
        _ => QualityBand::NeedsWork,
    }
}

pub fn classify_trend_severity(trend_percent: i32) -> TrendSeverity {
    if trend_percent.unsigned_abs() > HIGH_TREND_THRESHOLD {
        TrendSeverity::High
    } else {
        TrendSeverity::Normal
    }
}

pub fn trend_direction(trend_percent: i32) -> TrendDirection {
    if trend_percent >= 0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    }
}

pub fn compute_impact(before: u32, after: Option<u32>, polarity: Polarity) -> Impact {
    let Some(after) = after else {
        return Impact::NoUpdateYet;
    };
    if before == 0 {
        return Impact::NotApplicable;
    }

    let improved = match polarity {
        Polarity::HigherIsBetter => after > before,
        Polarity::LowerIsBetter => after < before,
    };
    let delta = u64::from(before.abs_diff(after));

    Impact::Measured {
        improved,
        change_percent: round_ratio(delta * 100, u64::from(before)),
    }
}

/// Employees per month who ask about a topic and do not get an adequate answer.
pub fn estimate_unresolved_volume(question_count: u32, quality_score: u8) -> u32 {
    let unresolved_share = 100 - u64::from(quality_score.min(100));
    round_ratio(u64::from(question_count) * unresolved_share, 100) as u32
}

pub fn aggregate_roi(metrics: &[RoiMetric]) -> Vec<RoiDisplay<'_>> {
    metrics
        .iter()
        .map(|metric| match metric.direction {
            RoiDirection::Improved => RoiDisplay {
                metric,
                tone: RoiTone::Positive,
                caption: format!("{} improvement", metric.change),
            },
            RoiDirection::New => RoiDisplay {
                metric,
                tone: RoiTone::Highlight,
                caption: "New capability".to_string(),
            },
        })
        .collect()
}

pub fn summarize_topics(topics: &[Topic]) -> TopicSummary {
    let total_questions = topics.iter().map(|t| u64::from(t.question_count)).sum();
    let quality_sum: u64 = topics.iter().map(|t| u64::from(t.quality_score)).sum();
    let average_quality = if topics.is_empty() {
        0
    } else {
        round_ratio(quality_sum, topics.len() as u64) as u8
    };

    let top_trending = topics
        .iter()
        .fold(None::<&Topic>, |best, topic| match best {
            Some(current) if current.trend_percent >= topic.trend_percent => Some(current),
            _ => Some(topic),
        })
        .map(|topic| (topic.name.clone(), topic.trend_percent));

    TopicSummary {
        total_questions,
        average_quality,
        gap_count: topics.iter().filter(|t| t.is_gap()).count(),
        top_trending,
    }
}

pub fn monthly_resolution(volumes: &[MonthlyVolume]) -> Vec<MonthlyResolution> {
    volumes
        .iter()
        .map(|volume| MonthlyResolution {
            month: volume.month.clone(),
            total_questions: volume.total_questions,
            resolved_questions: volume.resolved_questions,
            resolved_percent: (volume.total_questions > 0).then(|| {
                round_ratio(
                    u64::from(volume.resolved_questions) * 100,
                    u64::from(volume.total_questions),
                )
            }),
        })
        .collect()
}

pub fn impact_summary(updates: &[ContentUpdate], topics: &[Topic]) -> ImpactSummary {
    let mut updates_addressed = 0;
    let mut questions_reduced = 0i64;

    for update in updates {
        if update.status == UpdateStatus::NoUpdate {
            continue;
        }
        updates_addressed += 1;
        if let Some(after) = update.after {
            questions_reduced +=
                i64::from(update.before.question_count) - i64::from(after.question_count);
        }
    }

    let hr_hours_saved = if questions_reduced > 0 {
        round_ratio((questions_reduced * HR_MINUTES_PER_QUESTION) as u64, 60)
    } else {
        0
    };

    ImpactSummary {
        updates_addressed,
        gaps_total: topics.iter().filter(|t| t.is_gap()).count(),
        questions_reduced,
        hr_hours_saved,
    }
}

/// Week of the series in which the content change landed.
pub fn update_marker_week(update: &ContentUpdate) -> Option<NaiveDate> {
    let updated_on = update.updated_on?;
    update
        .weekly
        .iter()
        .map(|point| point.week_start)
        .filter(|week_start| *week_start <= updated_on)
        .max()
}

pub fn impact_status(status: UpdateStatus) -> &'static str {
    match status {
        UpdateStatus::Improved => "Significant improvement",
        UpdateStatus::Improving => "Improving, monitor",
        UpdateStatus::NoUpdate => "No action taken",
    }
}

pub fn total_absences(shifts: &[ShiftSummary]) -> u32 {
    shifts.iter().map(|shift| shift.absences).sum()
}

pub fn is_elevated_absence(absence_rate_percent: f64) -> bool {
    absence_rate_percent > ELEVATED_ABSENCE_RATE
}

pub fn weekday_peak(days: &[WeekdayAbsence]) -> Option<WeekdayPeak> {
    let midweek: Vec<u64> = days
        .iter()
        .filter(|day| {
            matches!(
                day.weekday,
                Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri
            )
        })
        .map(|day| u64::from(day.absences))
        .collect();
    let midweek_sum: u64 = midweek.iter().sum();
    if midweek_sum == 0 {
        return None;
    }

    let peak = days.iter().fold(None::<&WeekdayAbsence>, |best, day| match best {
        Some(current) if current.absences >= day.absences => Some(current),
        _ => Some(day),
    })?;

    // peak * n - sum over sum, so the midweek mean never leaves integers
    let excess = (u64::from(peak.absences) * midweek.len() as u64).saturating_sub(midweek_sum);

    Some(WeekdayPeak {
        weekday: peak.weekday,
        absences: peak.absences,
        percent_above_midweek: round_ratio(excess * 100, midweek_sum),
    })
}

pub fn attendance_totals(points: &[WeeklyAttendancePoint]) -> Vec<WeeklyAttendanceTotal> {
    points
        .iter()
        .map(|point| WeeklyAttendanceTotal {
            week_start: point.week_start,
            absences: point.calloffs + point.pto + point.no_call_no_show + point.tardy,
            assistant_questions: point.assistant_questions,
        })
        .collect()
}

pub fn insight_marker(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Spike => "🔗",
        InsightKind::Pattern => "📊",
        InsightKind::Gap => "⚠️",
    }
}

/// `numerator / denominator` rounded half up. `denominator` must be non-zero.
fn round_ratio(numerator: u64, denominator: u64) -> u64 {
    (numerator * 2 + denominator) / (denominator * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{BuiltinFixtures, DataProvider};
    use crate::models::TopicMetrics;

    fn topic(name: &str, quality: u8, trend: i32, priority: Option<u32>) -> Topic {
        Topic {
            id: name.to_lowercase(),
            name: name.to_string(),
            question_count: 100,
            trend_percent: trend,
            quality_score: quality,
            gap_priority: priority,
        }
    }

    fn week(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    #[test]
    fn gaps_rank_by_priority() {
        let topics = vec![
            topic("Safety", 34, 41, Some(3)),
            topic("Pay", 88, -3, None),
            topic("Pto", 62, 28, Some(1)),
            topic("Benefits", 45, 5, Some(2)),
        ];

        let ranked: Vec<&str> = rank_gaps(&topics).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(ranked, vec!["Pto", "Benefits", "Safety"]);
    }

    #[test]
    fn duplicate_priorities_keep_input_order() {
        let topics = vec![
            topic("Second", 40, 0, Some(2)),
            topic("FirstA", 40, 0, Some(1)),
            topic("FirstB", 40, 0, Some(1)),
        ];

        let ranked: Vec<&str> = rank_gaps(&topics).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(ranked, vec!["FirstA", "FirstB", "Second"]);
    }

    #[test]
    fn builtin_gap_priorities_are_consistent() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let ranked = rank_gaps(&fixtures.topics);

        assert_eq!(ranked.len(), fixtures.topics.iter().filter(|t| t.is_gap()).count());
        for (index, gap) in ranked.iter().enumerate() {
            assert_eq!(gap.gap_priority, Some(index as u32 + 1));
        }
    }

    #[test]
    fn quality_bands_include_lower_bound() {
        assert_eq!(classify_quality(100), QualityBand::Strong);
        assert_eq!(classify_quality(80), QualityBand::Strong);
        assert_eq!(classify_quality(79), QualityBand::Fair);
        assert_eq!(classify_quality(60), QualityBand::Fair);
        assert_eq!(classify_quality(59), QualityBand::NeedsWork);
        assert_eq!(classify_quality(0), QualityBand::NeedsWork);
    }

    #[test]
    fn trend_severity_uses_magnitude() {
        assert_eq!(classify_trend_severity(41), TrendSeverity::High);
        assert_eq!(classify_trend_severity(-21), TrendSeverity::High);
        assert_eq!(classify_trend_severity(20), TrendSeverity::Normal);
        assert_eq!(classify_trend_severity(-12), TrendSeverity::Normal);
        assert_eq!(trend_direction(-3), TrendDirection::Down);
        assert_eq!(trend_direction(0), TrendDirection::Up);
    }

    #[test]
    fn impact_for_lower_is_better_metric() {
        assert_eq!(
            compute_impact(847, Some(518), Polarity::LowerIsBetter),
            Impact::Measured {
                improved: true,
                change_percent: 39
            }
        );
        assert_eq!(
            compute_impact(42, Some(89), Polarity::HigherIsBetter),
            Impact::Measured {
                improved: true,
                change_percent: 112
            }
        );
    }

    #[test]
    fn impact_sentinels() {
        assert_eq!(
            compute_impact(45, None, Polarity::HigherIsBetter),
            Impact::NoUpdateYet
        );
        assert_eq!(
            compute_impact(0, Some(12), Polarity::HigherIsBetter),
            Impact::NotApplicable
        );
    }

    #[test]
    fn unchanged_metric_is_not_an_improvement() {
        for value in [1, 45, 847] {
            assert_eq!(
                compute_impact(value, Some(value), Polarity::HigherIsBetter),
                Impact::Measured {
                    improved: false,
                    change_percent: 0
                }
            );
        }
    }

    #[test]
    fn regression_is_reported() {
        assert_eq!(
            compute_impact(34, Some(30), Polarity::HigherIsBetter),
            Impact::Measured {
                improved: false,
                change_percent: 12
            }
        );
    }

    #[test]
    fn impact_percent_is_not_truncated_for_large_changes() {
        assert_eq!(
            compute_impact(1, Some(u32::MAX), Polarity::HigherIsBetter),
            Impact::Measured {
                improved: true,
                change_percent: 429_496_729_400
            }
        );
    }

    #[test]
    fn unresolved_volume_rounds_half_up() {
        assert_eq!(estimate_unresolved_volume(541, 45), 298);
        assert_eq!(estimate_unresolved_volume(412, 34), 272);
        assert_eq!(estimate_unresolved_volume(356, 52), 171);
        assert_eq!(estimate_unresolved_volume(847, 62), 322);
        assert_eq!(estimate_unresolved_volume(100, 100), 0);
        assert_eq!(estimate_unresolved_volume(0, 10), 0);
    }

    #[test]
    fn derivations_are_repeatable() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let first: Vec<&str> = rank_gaps(&fixtures.topics).iter().map(|t| t.id.as_str()).collect();
        let second: Vec<&str> = rank_gaps(&fixtures.topics).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(first, second);
        assert_eq!(
            compute_impact(412, Some(380), Polarity::LowerIsBetter),
            compute_impact(412, Some(380), Polarity::LowerIsBetter)
        );
    }

    #[test]
    fn roi_tone_follows_direction() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let display = aggregate_roi(&fixtures.roi);

        assert_eq!(display.len(), fixtures.roi.len());
        assert_eq!(display[0].tone, RoiTone::Positive);
        assert_eq!(display[0].caption, "-15.5% improvement");
        let last = display.last().unwrap();
        assert_eq!(last.tone, RoiTone::Highlight);
        assert_eq!(last.caption, "New capability");
    }

    #[test]
    fn builtin_topic_summary() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let summary = summarize_topics(&fixtures.topics);

        assert_eq!(summary.total_questions, 4283);
        assert_eq!(summary.average_quality, 69);
        assert_eq!(summary.gap_count, 4);
        assert_eq!(summary.top_trending, Some(("Safety Protocols".to_string(), 41)));
    }

    #[test]
    fn empty_topic_summary() {
        let summary = summarize_topics(&[]);
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.average_quality, 0);
        assert_eq!(summary.top_trending, None);
    }

    #[test]
    fn resolution_share_guards_empty_months() {
        let volumes = vec![
            MonthlyVolume {
                month: "Sep".to_string(),
                total_questions: 2890,
                resolved_questions: 2340,
            },
            MonthlyVolume {
                month: "Oct".to_string(),
                total_questions: 0,
                resolved_questions: 0,
            },
        ];

        let shares = monthly_resolution(&volumes);
        assert_eq!(shares[0].resolved_percent, Some(81));
        assert_eq!(shares[1].resolved_percent, None);
    }

    #[test]
    fn resolution_share_is_not_truncated() {
        let volumes = vec![MonthlyVolume {
            month: "Feb".to_string(),
            total_questions: 1,
            resolved_questions: u32::MAX,
        }];

        let shares = monthly_resolution(&volumes);
        assert_eq!(shares[0].resolved_percent, Some(429_496_729_500));
    }

    #[test]
    fn weekday_peak_is_not_truncated() {
        let days = vec![
            WeekdayAbsence {
                weekday: Weekday::Mon,
                absences: u32::MAX,
                assistant_questions: 0,
            },
            WeekdayAbsence {
                weekday: Weekday::Tue,
                absences: 1,
                assistant_questions: 0,
            },
        ];

        let peak = weekday_peak(&days).unwrap();
        assert_eq!(peak.percent_above_midweek, 429_496_729_400);
    }

    #[test]
    fn builtin_impact_summary() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let summary = impact_summary(&fixtures.content_updates, &fixtures.topics);

        assert_eq!(summary.updates_addressed, 2);
        assert_eq!(summary.gaps_total, 4);
        assert_eq!(summary.questions_reduced, 361);
        assert_eq!(summary.hr_hours_saved, 18);
    }

    #[test]
    fn marker_week_precedes_update_date() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let markers: Vec<Option<NaiveDate>> = fixtures
            .content_updates
            .iter()
            .map(update_marker_week)
            .collect();

        assert_eq!(markers, vec![Some(week(1, 13)), Some(week(2, 3)), None]);
    }

    #[test]
    fn marker_week_needs_a_prior_week() {
        let metrics = TopicMetrics {
            question_count: 10,
            quality_score: 50,
            fallback_rate: 50,
        };
        let update = ContentUpdate {
            topic_id: "pto".to_string(),
            updated_by: None,
            updated_on: Some(week(1, 1)),
            days_since_update: None,
            details: String::new(),
            before: metrics,
            after: Some(metrics),
            status: UpdateStatus::Improving,
            weekly: vec![crate::models::WeeklyQuality {
                week_start: week(1, 6),
                question_count: 10,
                quality_score: 50,
            }],
        };

        assert_eq!(update_marker_week(&update), None);
    }

    #[test]
    fn shifts_and_weekdays() {
        let fixtures = BuiltinFixtures.load().unwrap();

        assert_eq!(total_absences(&fixtures.shifts), 264);
        let elevated: Vec<bool> = fixtures
            .shifts
            .iter()
            .map(|shift| is_elevated_absence(shift.absence_rate_percent))
            .collect();
        assert_eq!(elevated, vec![false, true, true]);

        let peak = weekday_peak(&fixtures.weekdays).unwrap();
        assert_eq!(peak.weekday, Weekday::Mon);
        assert_eq!(peak.absences, 68);
        assert_eq!(peak.percent_above_midweek, 63);
    }

    #[test]
    fn weekday_peak_without_midweek_data() {
        let days = vec![WeekdayAbsence {
            weekday: Weekday::Mon,
            absences: 10,
            assistant_questions: 4,
        }];
        assert!(weekday_peak(&days).is_none());
    }

    #[test]
    fn attendance_totals_sum_absence_types() {
        let fixtures = BuiltinFixtures.load().unwrap();
        let totals = attendance_totals(&fixtures.attendance);

        assert_eq!(totals.len(), fixtures.attendance.len());
        assert_eq!(totals[0].absences, 42 + 28 + 8 + 15);
        assert_eq!(totals[0].assistant_questions, 890);
    }
}
