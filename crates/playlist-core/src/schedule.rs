use crate::config::ScheduleConfig;
use crate::error::ScheduleError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One availability window; sent as the playlist's entire calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_all_day: bool,
    pub recurrence_rule: Option<String>,
}

impl ScheduleWindow {
    /// A window opening at `start` and lasting `config.window_days`.
    pub fn starting_at(
        start: DateTime<Utc>,
        config: &ScheduleConfig,
    ) -> Result<Self, ScheduleError> {
        let end_date = Duration::try_days(config.window_days)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(|| ScheduleError::OutOfRange {
                start: start.to_rfc3339(),
                days: config.window_days,
            })?;
        Ok(Self {
            start_date: start,
            end_date,
            is_all_day: config.all_day,
            recurrence_rule: config.recurrence_rule.clone(),
        })
    }

    /// Calendar replacement body: a one-element array.
    pub fn calendar_body(&self) -> serde_json::Value {
        serde_json::json!([self])
    }
}
