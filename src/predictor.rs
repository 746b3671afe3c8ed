//! Pure cycle arithmetic. No I/O, no clock reads: callers pass `today` in,
//! so every function here is deterministic and safe to call from anywhere.

use chrono::{Duration, NaiveDate};

use crate::models::{
    Confidence, CycleData, CycleHistoryEntry, CyclePhase, FertilityWindow, Insight, PeriodRecord,
    SettingsRecord,
};

/// Cycle-length samples longer than this are treated as logging gaps,
/// not real cycles, and excluded from the rolling average.
const MAX_CYCLE_SAMPLE_DAYS: i64 = 45;

/// Period-length samples longer than this are excluded from the average.
const MAX_PERIOD_SAMPLE_DAYS: i64 = 10;

/// An open period older than this is no longer reported as ongoing
/// (covers a forgotten end-date log).
const OPEN_PERIOD_CEILING_DAYS: i64 = 10;

/// Luteal phase modeled as a fixed 14-day tail.
const LUTEAL_DAYS: i64 = 14;

/// Derive the full cycle state from logged history and settings.
///
/// `history` must be sorted descending by start date (most recent first),
/// which is the order the store returns.
pub fn compute_cycle_data(
    history: &[PeriodRecord],
    settings: &SettingsRecord,
    today: NaiveDate,
) -> CycleData {
    let Some(latest) = history.first() else {
        // An untracked user should not be told they are mid-cycle.
        return CycleData {
            current_cycle_day: 0,
            cycle_phase: CyclePhase::Follicular,
            next_period_date: None,
            days_until_next_period: None,
            average_cycle_length: settings.default_cycle_length,
            average_period_length: settings.default_period_length,
            cycle_count: 0,
            fertility_window: None,
            is_on_period: false,
        };
    };

    let average_cycle_length = average_cycle_length(history, settings);
    let average_period_length = average_period_length(history, settings);

    let days_since_start = (today - latest.start_date).num_days();
    let is_on_period =
        latest.end_date.is_none() && days_since_start < OPEN_PERIOD_CEILING_DAYS;
    let current_cycle_day = days_since_start + 1;

    let next_period_date = latest.start_date + Duration::days(average_cycle_length);
    let days_until_next_period = (next_period_date - today).num_days().max(0);

    let cycle_phase = determine_cycle_phase(
        current_cycle_day,
        average_cycle_length,
        average_period_length,
        is_on_period,
    );

    let fertility_window =
        calculate_fertility_window(latest.start_date, average_cycle_length, history.len());

    CycleData {
        current_cycle_day,
        cycle_phase,
        next_period_date: Some(next_period_date),
        days_until_next_period: Some(days_until_next_period),
        average_cycle_length,
        average_period_length,
        cycle_count: history.len(),
        fertility_window,
        is_on_period,
    }
}

/// Classify a cycle day into a phase.
///
/// Ovulation is placed `LUTEAL_DAYS` before the end of the cycle, with a
/// window reaching two days either side. Cycles shorter than ~16 days
/// collapse the follicular window entirely; that behavior is intentional
/// and left unclamped.
pub fn determine_cycle_phase(
    cycle_day: i64,
    cycle_length: i64,
    period_length: i64,
    is_on_period: bool,
) -> CyclePhase {
    if is_on_period || cycle_day <= period_length {
        return CyclePhase::Menstrual;
    }

    let ovulation_day = cycle_length - LUTEAL_DAYS;
    if cycle_day <= ovulation_day - 2 {
        CyclePhase::Follicular
    } else if cycle_day <= ovulation_day + 2 {
        CyclePhase::Ovulation
    } else {
        CyclePhase::Luteal
    }
}

/// Predicted fertile window: ovulation minus five days through ovulation
/// plus one (the standard sperm-survival heuristic).
pub fn calculate_fertility_window(
    last_start: NaiveDate,
    cycle_length: i64,
    cycle_count: usize,
) -> Option<FertilityWindow> {
    if cycle_count < 1 {
        return None;
    }

    let ovulation_date = last_start + Duration::days(cycle_length - LUTEAL_DAYS);
    let confidence = if cycle_count >= 3 {
        Confidence::High
    } else if cycle_count >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    Some(FertilityWindow {
        fertile_start: ovulation_date - Duration::days(5),
        fertile_end: ovulation_date + Duration::days(1),
        ovulation_date,
        confidence,
    })
}

/// Per-cycle history for display, oldest first. Unlike the averages, raw
/// lengths are kept so the user can see anomalies.
pub fn compute_cycle_history(history: &[PeriodRecord]) -> Vec<CycleHistoryEntry> {
    let mut entries = Vec::new();

    // history is newest-first; walk it from the back so cycle 1 is the oldest.
    for (n, pair) in history.windows(2).rev().enumerate() {
        let newer = &pair[0];
        let older = &pair[1];

        entries.push(CycleHistoryEntry {
            cycle_number: n + 1,
            start_date: older.start_date,
            end_date: older.end_date,
            cycle_length: (newer.start_date - older.start_date).num_days(),
            period_length: older
                .end_date
                .map(|end| (end - older.start_date).num_days() + 1),
        });
    }

    entries
}

/// Select the informational messages for today. One phase-keyed insight
/// whenever any cycle has been logged, plus a heads-up when the next
/// period is three days out or closer.
pub fn daily_insights(data: &CycleData) -> Vec<Insight> {
    if data.cycle_count == 0 {
        return vec![Insight {
            title: "Start tracking".into(),
            message: "Log your next period to unlock cycle predictions and daily insights."
                .into(),
        }];
    }

    let phase_insight = match data.cycle_phase {
        CyclePhase::Menstrual => Insight {
            title: "Menstrual phase".into(),
            message: "Energy tends to be lowest now. Rest, hydrate, and keep iron-rich foods on the menu.".into(),
        },
        CyclePhase::Follicular => Insight {
            title: "Follicular phase".into(),
            message: "Rising estrogen usually means rising energy. A good stretch for harder workouts and new plans.".into(),
        },
        CyclePhase::Ovulation => Insight {
            title: "Ovulation window".into(),
            message: "You are in your most fertile days. Some people notice higher energy and body temperature.".into(),
        },
        CyclePhase::Luteal => Insight {
            title: "Luteal phase".into(),
            message: "Progesterone is doing its thing. Cravings and lower mood are common; steady meals and sleep help.".into(),
        },
    };

    let mut insights = vec![phase_insight];

    if let Some(days) = data.days_until_next_period {
        if days <= 3 {
            insights.push(Insight {
                title: "Period approaching".into(),
                message: format!(
                    "Your next period is predicted in {} day(s). A good time to stock up.",
                    days
                ),
            });
        }
    }

    insights
}

fn average_cycle_length(history: &[PeriodRecord], settings: &SettingsRecord) -> i64 {
    let samples: Vec<i64> = history
        .windows(2)
        .map(|pair| (pair[0].start_date - pair[1].start_date).num_days())
        .filter(|len| *len > 0 && *len <= MAX_CYCLE_SAMPLE_DAYS)
        .collect();

    rounded_mean(&samples).unwrap_or(settings.default_cycle_length)
}

fn average_period_length(history: &[PeriodRecord], settings: &SettingsRecord) -> i64 {
    let samples: Vec<i64> = history
        .iter()
        .filter_map(|rec| rec.end_date.map(|end| (end - rec.start_date).num_days() + 1))
        .filter(|len| *len > 0 && *len <= MAX_PERIOD_SAMPLE_DAYS)
        .collect();

    rounded_mean(&samples).unwrap_or(settings.default_period_length)
}

fn rounded_mean(samples: &[i64]) -> Option<i64> {
    if samples.is_empty() {
        return None;
    }
    let sum: i64 = samples.iter().sum();
    Some((sum as f64 / samples.len() as f64).round() as i64)
}
