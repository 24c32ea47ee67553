use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context};
use chrono::{NaiveDate, Weekday};
use tracing::{debug, info};

use crate::models::{
    ContentUpdate, CorrelationInsight, Fixtures, InsightKind, MonthlyVolume, RoiDirection,
    RoiMetric, ShiftSummary, Topic, TopicMetrics, UpdateStatus, WeekdayAbsence,
    WeeklyAttendancePoint, WeeklyQuality,
};

/// Source of the records a dashboard is derived from.
pub trait DataProvider {
    fn load(&self) -> anyhow::Result<Fixtures>;
}

/// The data set compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFixtures;

impl DataProvider for BuiltinFixtures {
    fn load(&self) -> anyhow::Result<Fixtures> {
        let fixtures = Fixtures {
            topics: topics(),
            monthly_volume: monthly_volume(),
            content_updates: content_updates()?,
            attendance: attendance()?,
            weekdays: weekdays(),
            shifts: shifts(),
            insights: insights(),
            roi: roi(),
        };
        validate(&fixtures)?;
        debug!(topics = fixtures.topics.len(), "loaded builtin fixtures");
        Ok(fixtures)
    }
}

/// Reads topics from a CSV file; every other collection comes from the builtin set.
#[derive(Debug, Clone)]
pub struct CsvTopicProvider {
    path: PathBuf,
}

impl CsvTopicProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataProvider for CsvTopicProvider {
    fn load(&self) -> anyhow::Result<Fixtures> {
        let topics = read_topics_csv(&self.path)?;
        info!(path = %self.path.display(), topics = topics.len(), "loaded topics from csv");

        let mut fixtures = BuiltinFixtures.load()?;
        fixtures.topics = topics;
        validate(&fixtures)
            .with_context(|| format!("invalid topic data in {}", self.path.display()))?;
        Ok(fixtures)
    }
}

fn read_topics_csv(path: &Path) -> anyhow::Result<Vec<Topic>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: String,
        name: String,
        questions: u32,
        trend_percent: i32,
        quality: u8,
        gap_priority: Option<u32>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open topics csv: {}", path.display()))?;
    let mut topics = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("bad topic row {}", index + 1))?;
        topics.push(Topic {
            id: row.id,
            name: row.name,
            question_count: row.questions,
            trend_percent: row.trend_percent,
            quality_score: row.quality,
            gap_priority: row.gap_priority,
        });
    }

    Ok(topics)
}

pub fn validate(fixtures: &Fixtures) -> anyhow::Result<()> {
    let mut ids = HashSet::new();
    for topic in &fixtures.topics {
        ensure!(ids.insert(topic.id.as_str()), "duplicate topic id {}", topic.id);
        ensure!(
            topic.quality_score <= 100,
            "topic {} has quality {} above 100",
            topic.id,
            topic.quality_score
        );
    }

    let mut priorities: Vec<u32> = fixtures
        .topics
        .iter()
        .filter_map(|topic| topic.gap_priority)
        .collect();
    priorities.sort_unstable();
    for (index, priority) in priorities.iter().enumerate() {
        let expected = index as u32 + 1;
        if *priority != expected {
            bail!(
                "gap priorities must run 1..={} without gaps, found {priority} where {expected} was expected",
                priorities.len()
            );
        }
    }

    for update in &fixtures.content_updates {
        let has_after = update.after.is_some();
        let updated = update.status != UpdateStatus::NoUpdate;
        ensure!(
            has_after == updated,
            "content update for {} has status {:?} but after metrics present = {has_after}",
            update.topic_id,
            update.status
        );
        if !fixtures.topics.is_empty() && !ids.contains(update.topic_id.as_str()) {
            debug!(topic = %update.topic_id, "content update references a topic outside the loaded set");
        }
    }

    Ok(())
}

fn topic(
    id: &str,
    name: &str,
    question_count: u32,
    trend_percent: i32,
    quality_score: u8,
    gap_priority: Option<u32>,
) -> Topic {
    Topic {
        id: id.to_string(),
        name: name.to_string(),
        question_count,
        trend_percent,
        quality_score,
        gap_priority,
    }
}

fn topics() -> Vec<Topic> {
    vec![
        topic("pto-time-off", "PTO / Time Off Policy", 847, 28, 62, Some(1)),
        topic("shift-schedule", "Shift Schedule & Hours", 623, 12, 78, None),
        topic("benefits-insurance", "Benefits & Insurance", 541, 5, 45, Some(2)),
        topic("pay-direct-deposit", "Pay & Direct Deposit", 498, -3, 88, None),
        topic("safety-protocols", "Safety Protocols", 412, 41, 34, Some(3)),
        topic("meal-kit-assembly", "Meal Kit Assembly Process", 387, 8, 71, None),
        topic("attendance-points", "Attendance Points", 356, 15, 52, Some(4)),
        topic("holiday-schedule", "Holiday Schedule", 298, -12, 91, None),
        topic("parking-transportation", "Parking & Transportation", 187, 2, 83, None),
        topic("uniform-dress-code", "Uniform & Dress Code", 134, -5, 89, None),
    ]
}

fn monthly_volume() -> Vec<MonthlyVolume> {
    [
        ("Sep", 2890, 2340),
        ("Oct", 3120, 2510),
        ("Nov", 3450, 2680),
        ("Dec", 2980, 2390),
        ("Jan", 3680, 2870),
        ("Feb", 4283, 3210),
    ]
    .into_iter()
    .map(|(month, total_questions, resolved_questions)| MonthlyVolume {
        month: month.to_string(),
        total_questions,
        resolved_questions,
    })
    .collect()
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

fn weekly_quality(rows: &[(i32, u32, u32, u32, u8)]) -> anyhow::Result<Vec<WeeklyQuality>> {
    rows.iter()
        .map(|&(year, month, day, question_count, quality_score)| {
            Ok(WeeklyQuality {
                week_start: date(year, month, day)?,
                question_count,
                quality_score,
            })
        })
        .collect()
}

fn metrics(question_count: u32, quality_score: u8, fallback_rate: u8) -> TopicMetrics {
    TopicMetrics {
        question_count,
        quality_score,
        fallback_rate,
    }
}

fn content_updates() -> anyhow::Result<Vec<ContentUpdate>> {
    Ok(vec![
        ContentUpdate {
            topic_id: "pto-time-off".to_string(),
            updated_by: Some("Stacy M.".to_string()),
            updated_on: Some(date(2026, 1, 15)?),
            days_since_update: Some(35),
            details: "Added site-specific accrual rules for Aurora, Newark, and Irving. \
                      Added blackout date calendar. Added rollover policy FAQ."
                .to_string(),
            before: metrics(847, 42, 58),
            after: Some(metrics(518, 89, 11)),
            status: UpdateStatus::Improved,
            weekly: weekly_quality(&[
                (2025, 12, 23, 210, 41),
                (2025, 12, 30, 225, 40),
                (2026, 1, 6, 198, 43),
                (2026, 1, 13, 215, 42),
                (2026, 1, 20, 156, 72),
                (2026, 1, 27, 138, 84),
                (2026, 2, 3, 125, 88),
                (2026, 2, 10, 130, 89),
                (2026, 2, 17, 127, 89),
            ])?,
        },
        ContentUpdate {
            topic_id: "safety-protocols".to_string(),
            updated_by: Some("Marcus J.".to_string()),
            updated_on: Some(date(2026, 2, 3)?),
            days_since_update: Some(16),
            details: "Updated PPE requirements for cold storage. Added new chemical handling \
                      procedures per Jan 2026 OSHA update. Still missing: forklift \
                      certification renewal process."
                .to_string(),
            before: metrics(412, 34, 66),
            after: Some(metrics(380, 61, 39)),
            status: UpdateStatus::Improving,
            weekly: weekly_quality(&[
                (2026, 1, 6, 95, 33),
                (2026, 1, 13, 108, 35),
                (2026, 1, 20, 112, 34),
                (2026, 1, 27, 98, 33),
                (2026, 2, 3, 102, 35),
                (2026, 2, 10, 94, 55),
                (2026, 2, 17, 88, 61),
            ])?,
        },
        ContentUpdate {
            topic_id: "benefits-insurance".to_string(),
            updated_by: None,
            updated_on: None,
            days_since_update: None,
            details: "No content update made. Gap identified 45 days ago. Life event and \
                      eligibility change content still missing."
                .to_string(),
            before: metrics(541, 45, 55),
            after: None,
            status: UpdateStatus::NoUpdate,
            weekly: weekly_quality(&[
                (2026, 1, 6, 130, 46),
                (2026, 1, 13, 138, 44),
                (2026, 1, 20, 142, 45),
                (2026, 1, 27, 135, 44),
                (2026, 2, 3, 148, 43),
                (2026, 2, 10, 140, 45),
                (2026, 2, 17, 145, 45),
            ])?,
        },
    ])
}

fn attendance() -> anyhow::Result<Vec<WeeklyAttendancePoint>> {
    let rows = [
        ((1, 6), 42, 28, 8, 15, 890),
        ((1, 13), 38, 31, 6, 12, 920),
        ((1, 20), 51, 45, 11, 18, 1150),
        ((1, 27), 44, 35, 7, 14, 980),
        ((2, 3), 39, 32, 5, 11, 940),
        ((2, 10), 47, 52, 9, 16, 1180),
        ((2, 17), 43, 38, 7, 13, 1020),
    ];

    rows.into_iter()
        .map(
            |((month, day), calloffs, pto, no_call_no_show, tardy, assistant_questions)| {
                Ok(WeeklyAttendancePoint {
                    week_start: date(2026, month, day)?,
                    calloffs,
                    pto,
                    no_call_no_show,
                    tardy,
                    assistant_questions,
                })
            },
        )
        .collect()
}

fn weekdays() -> Vec<WeekdayAbsence> {
    [
        (Weekday::Mon, 68, 245),
        (Weekday::Tue, 42, 180),
        (Weekday::Wed, 35, 155),
        (Weekday::Thu, 38, 160),
        (Weekday::Fri, 52, 210),
        (Weekday::Sat, 24, 85),
        (Weekday::Sun, 18, 45),
    ]
    .into_iter()
    .map(|(weekday, absences, assistant_questions)| WeekdayAbsence {
        weekday,
        absences,
        assistant_questions,
    })
    .collect()
}

fn shifts() -> Vec<ShiftSummary> {
    [
        ("1st Shift (6a-2p)", 89, 4.2, 1840, "PTO Policy", 28),
        ("2nd Shift (2p-10p)", 112, 5.8, 1620, "Shift Schedule", 34),
        ("3rd Shift (10p-6a)", 63, 6.1, 823, "Safety Protocols", 41),
    ]
    .into_iter()
    .map(
        |(shift_name, absences, absence_rate_percent, assistant_usage, top_topic, share)| {
            ShiftSummary {
                shift_name: shift_name.to_string(),
                absences,
                absence_rate_percent,
                assistant_usage,
                top_topic: top_topic.to_string(),
                top_topic_share_percent: share,
            }
        },
    )
    .collect()
}

fn insights() -> Vec<CorrelationInsight> {
    vec![
        CorrelationInsight {
            kind: InsightKind::Spike,
            title: "PTO questions and PTO absences moving together".to_string(),
            narrative: "Week of Feb 10: PTO questions spiked 42% and PTO call-offs increased \
                        49%. Employees may be researching policy before requesting time off."
                .to_string(),
            recommended_action: "Review PTO content. Are employees finding what they need, or \
                                 calling off because they can't figure out the process?"
                .to_string(),
            confidence: "Strong correlation (r=0.84 over 8 weeks)".to_string(),
        },
        CorrelationInsight {
            kind: InsightKind::Pattern,
            title: "Monday EA usage predicts Monday absences".to_string(),
            narrative: "Monday morning EA questions (6am-8am) correlate with same-day call-off \
                        volume. When pre-shift EA questions exceed 60, call-offs that day are \
                        35% higher than average."
                .to_string(),
            recommended_action: "Potential leading indicator. Could enable proactive staffing \
                                 adjustments."
                .to_string(),
            confidence: "Moderate correlation (r=0.71 over 12 weeks)".to_string(),
        },
        CorrelationInsight {
            kind: InsightKind::Gap,
            title: "3rd shift safety questions with no matching content".to_string(),
            narrative: "3rd shift employees ask about safety protocols 3.2x more than other \
                        shifts, but resolution quality for safety is only 34%. 3rd shift also \
                        has the highest absence rate (6.1%)."
                .to_string(),
            recommended_action: "Update safety content with 3rd-shift-specific procedures. \
                                 Possible connection between content frustration and \
                                 absenteeism."
                .to_string(),
            confidence: "Exploratory, needs more data".to_string(),
        },
    ]
}

fn roi() -> Vec<RoiMetric> {
    [
        ("Absenteeism Rate", "5.8%", "4.9%", "-15.5%", RoiDirection::Improved),
        ("NCNS Rate", "1.4%", "0.8%", "-43%", RoiDirection::Improved),
        ("Avg Time to Notification", "47 min", "8 min", "-83%", RoiDirection::Improved),
        ("HR Questions via EA (self-served)", "0", "4,283/mo", "New", RoiDirection::New),
    ]
    .into_iter()
    .map(|(name, baseline, current, change, direction)| RoiMetric {
        name: name.to_string(),
        baseline: baseline.to_string(),
        current: current.to_string(),
        change: change.to_string(),
        direction,
    })
    .collect()
}
