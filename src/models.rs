use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowIntensity {
    Light,
    Medium,
    Heavy,
    Spotting,
}

impl FlowIntensity {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowIntensity::Light => "light",
            FlowIntensity::Medium => "medium",
            FlowIntensity::Heavy => "heavy",
            FlowIntensity::Spotting => "spotting",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(FlowIntensity::Light),
            "medium" => Some(FlowIntensity::Medium),
            "heavy" => Some(FlowIntensity::Heavy),
            "spotting" => Some(FlowIntensity::Spotting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One logged period. `end_date` stays empty while the period is ongoing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_by_date: BTreeMap<NaiveDate, FlowIntensity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsRecord {
    pub default_cycle_length: i64,
    pub default_period_length: i64,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            default_cycle_length: 28,
            default_period_length: 5,
        }
    }
}

/// Derived cycle state, recomputed on every read. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CycleData {
    pub current_cycle_day: i64,
    pub cycle_phase: CyclePhase,
    pub next_period_date: Option<NaiveDate>,
    pub days_until_next_period: Option<i64>,
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub cycle_count: usize,
    pub fertility_window: Option<FertilityWindow>,
    pub is_on_period: bool,
}

/// Six fertile days ending the day after predicted ovulation. Confidence is
/// a data-sufficiency tier, not a statistical interval.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FertilityWindow {
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub confidence: Confidence,
}

/// One completed cycle for the history view. Raw values, outliers included.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CycleHistoryEntry {
    pub cycle_number: usize,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: i64,
    pub period_length: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Insight {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FlowDay {
    pub date: NaiveDate,
    pub intensity: FlowIntensity,
}

#[derive(Debug, Serialize)]
pub struct FlowCycle {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub days: Vec<FlowDay>,
}
