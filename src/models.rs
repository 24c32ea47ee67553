use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub question_count: u32,
    pub trend_percent: i32,
    pub quality_score: u8,
    pub gap_priority: Option<u32>,
}

impl Topic {
    pub fn is_gap(&self) -> bool {
        self.gap_priority.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyVolume {
    pub month: String,
    pub total_questions: u32,
    pub resolved_questions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopicMetrics {
    pub question_count: u32,
    pub quality_score: u8,
    pub fallback_rate: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Improved,
    Improving,
    NoUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyQuality {
    pub week_start: NaiveDate,
    pub question_count: u32,
    pub quality_score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentUpdate {
    pub topic_id: String,
    pub updated_by: Option<String>,
    pub updated_on: Option<NaiveDate>,
    pub days_since_update: Option<u32>,
    pub details: String,
    pub before: TopicMetrics,
    pub after: Option<TopicMetrics>,
    pub status: UpdateStatus,
    pub weekly: Vec<WeeklyQuality>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyAttendancePoint {
    pub week_start: NaiveDate,
    pub calloffs: u32,
    pub pto: u32,
    pub no_call_no_show: u32,
    pub tardy: u32,
    pub assistant_questions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayAbsence {
    pub weekday: chrono::Weekday,
    pub absences: u32,
    pub assistant_questions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftSummary {
    pub shift_name: String,
    pub absences: u32,
    pub absence_rate_percent: f64,
    pub assistant_usage: u32,
    pub top_topic: String,
    pub top_topic_share_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Spike,
    Pattern,
    Gap,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationInsight {
    pub kind: InsightKind,
    pub title: String,
    pub narrative: String,
    pub recommended_action: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiDirection {
    Improved,
    New,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiMetric {
    pub name: String,
    pub baseline: String,
    pub current: String,
    pub change: String,
    pub direction: RoiDirection,
}

/// Every collection a dashboard render needs, as handed over by a provider.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub topics: Vec<Topic>,
    pub monthly_volume: Vec<MonthlyVolume>,
    pub content_updates: Vec<ContentUpdate>,
    pub attendance: Vec<WeeklyAttendancePoint>,
    pub weekdays: Vec<WeekdayAbsence>,
    pub shifts: Vec<ShiftSummary>,
    pub insights: Vec<CorrelationInsight>,
    pub roi: Vec<RoiMetric>,
}
