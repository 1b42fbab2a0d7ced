use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::workflows::grants::condition::FormData;
use crate::workflows::grants::form::{OverviewRow, StepSummary};

/// Identifier shared by a pending application and the submitted record it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unsubmitted answers for one applicant and form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub form_id: String,
    pub application_data: Option<FormData>,
    #[serde(default)]
    pub submission_attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingApplication {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Saved answers, or an empty map before the first save.
    pub fn data(&self) -> FormData {
        self.application_data.clone().unwrap_or_default()
    }
}

/// Immutable record written on successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub form_id: String,
    pub application_title: Option<String>,
    pub application_country: Option<String>,
    pub application_overview: Vec<OverviewRow>,
    pub application_summary: Vec<StepSummary>,
    pub external_reference_id: String,
    pub external_submission_payload: Value,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// Reminder windows before a pending application expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationType {
    MonthBefore,
    WeekBefore,
    DayBefore,
}

impl ExpirationType {
    pub const fn label(self) -> &'static str {
        match self {
            ExpirationType::MonthBefore => "month_before",
            ExpirationType::WeekBefore => "week_before",
            ExpirationType::DayBefore => "day_before",
        }
    }
}

/// Ledger row: the reminders already sent for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationExpiration {
    pub id: Uuid,
    pub application_id: ApplicationId,
    pub expiration_types: Vec<ExpirationType>,
}

/// Day offsets for each reminder, largest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSchedule {
    windows: Vec<(ExpirationType, u32)>,
}

impl ReminderSchedule {
    pub fn new(mut windows: Vec<(ExpirationType, u32)>) -> Self {
        windows.sort_by_key(|(_, days)| Reverse(*days));
        Self { windows }
    }

    pub fn days_for(&self, expiration: ExpirationType) -> Option<u32> {
        self.windows
            .iter()
            .find(|(kind, _)| *kind == expiration)
            .map(|(_, days)| *days)
    }

    /// Each reminder with the exclusive lower bound of its window, e.g. `(WeekBefore, 1, 7)`.
    pub fn windows(&self) -> impl Iterator<Item = (ExpirationType, u32, u32)> + '_ {
        self.windows.iter().enumerate().map(|(index, (kind, days))| {
            let lower = self
                .windows
                .get(index + 1)
                .map(|(_, next)| *next)
                .unwrap_or(0);
            (*kind, lower, *days)
        })
    }
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self::new(vec![
            (ExpirationType::MonthBefore, 30),
            (ExpirationType::WeekBefore, 7),
            (ExpirationType::DayBefore, 1),
        ])
    }
}
