use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{parse_time, ValidationError, TIME_FORMAT};

pub const DEFAULT_HOURS: f64 = 8.0;
pub const DEFAULT_START: &str = "09:00";
pub const DEFAULT_URGENCY_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_PLAN_DAYS: u32 = 7;
pub const MAX_PLAN_DAYS: u32 = 31;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Knobs for a single scheduling run.
///
/// Options are validated once by [`ScheduleOptions::from_params`]; the
/// scheduler itself trusts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// The day being planned. Urgency is measured from here.
    pub date: NaiveDate,
    /// Minutes available for work, starting at `day_start`.
    pub budget_minutes: u32,
    pub day_start: NaiveTime,
    /// Allow every task to be split, not only those flagged `splittable`.
    pub allow_split: bool,
    /// Deadlines further away than this many days get no urgency boost.
    pub urgency_window_days: u32,
}

impl ScheduleOptions {
    /// Build options from the user-facing parameters.
    ///
    /// An explicit `budget_minutes` wins over `hours`. `hours` is converted to
    /// whole minutes, truncating any remainder.
    pub fn from_params(date: NaiveDate, params: &ScheduleParams) -> Result<Self, ValidationError> {
        let budget_minutes = match params.budget_minutes {
            Some(0) => return Err(ValidationError::InvalidHours(0.0)),
            Some(minutes) => minutes,
            None => {
                let hours = params.hours.unwrap_or(DEFAULT_HOURS);
                if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
                    return Err(ValidationError::InvalidHours(hours));
                }
                (hours * 60.0) as u32
            }
        };

        let start_raw = params.start.as_deref().unwrap_or(DEFAULT_START);
        let day_start = parse_time(start_raw)?;
        let start_minute = day_start.hour() * 60 + day_start.minute();
        // The last slot must end on the same day, so the day ends before midnight.
        if start_minute + budget_minutes >= MINUTES_PER_DAY {
            return Err(ValidationError::DayOverflow {
                start: day_start.format(TIME_FORMAT).to_string(),
                budget_minutes,
            });
        }

        let urgency_window_days = params
            .urgency_window
            .unwrap_or(DEFAULT_URGENCY_WINDOW_DAYS);
        if urgency_window_days == 0 {
            return Err(ValidationError::InvalidUrgencyWindow);
        }

        Ok(Self {
            date,
            budget_minutes,
            day_start,
            allow_split: params.allow_split.unwrap_or(false),
            urgency_window_days,
        })
    }
}

/// Check a multi-day planning horizon.
pub fn validate_plan_days(days: u32) -> Result<u32, ValidationError> {
    if days == 0 || days > MAX_PLAN_DAYS {
        return Err(ValidationError::InvalidDays {
            got: days,
            max: MAX_PLAN_DAYS,
        });
    }
    Ok(days)
}

/// Scheduling parameters as the user supplies them. Missing values fall back
/// to the defaults above (or the configured defaults, see [`crate::config`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub hours: Option<f64>,
    /// Exact budget in minutes. Takes precedence over `hours`.
    pub budget_minutes: Option<u32>,
    /// `HH:MM`
    pub start: Option<String>,
    pub allow_split: Option<bool>,
    pub urgency_window: Option<u32>,
}

impl ScheduleParams {
    /// Fill unset fields from `defaults`.
    pub fn or(self, defaults: &ScheduleParams) -> Self {
        Self {
            hours: self.hours.or(defaults.hours),
            budget_minutes: self.budget_minutes.or(defaults.budget_minutes),
            start: self.start.or_else(|| defaults.start.clone()),
            allow_split: self.allow_split.or(defaults.allow_split),
            urgency_window: self.urgency_window.or(defaults.urgency_window),
        }
    }
}

/// A time-boxed plan for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: NaiveDate,
    pub day_start: NaiveTime,
    pub budget_minutes: u32,
    /// Allocated blocks in start-time order.
    pub slots: Vec<ScheduledSlot>,
    /// Tasks that were left out, in priority order.
    pub unscheduled: Vec<UnscheduledTask>,
    pub allocated_minutes: u32,
    /// `allocated_minutes / budget_minutes`, in `[0, 1]`.
    pub utilization: f64,
}

impl Schedule {
    pub fn empty(options: &ScheduleOptions) -> Self {
        Self {
            date: options.date,
            day_start: options.day_start,
            budget_minutes: options.budget_minutes,
            slots: Vec::new(),
            unscheduled: Vec::new(),
            allocated_minutes: 0,
            utilization: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn utilization_percent(&self) -> f64 {
        self.utilization * 100.0
    }
}

/// One contiguous block of work inside a [`Schedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub task_id: Uuid,
    pub title: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub minutes: u32,
    pub impact: f64,
    pub deadline: Option<NaiveDate>,
    pub score: f64,
    /// Slice number when the task was split, starting at 1.
    pub part: Option<u32>,
}

impl ScheduledSlot {
    /// Display title, marking split slices.
    pub fn label(&self) -> String {
        match self.part {
            Some(n) => format!("{} (part {})", self.title, n),
            None => self.title.clone(),
        }
    }
}

/// A task, or what is left of one, that did not get time today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledTask {
    pub task_id: Uuid,
    pub title: String,
    /// Minutes still to be scheduled.
    pub minutes: u32,
    pub score: f64,
    pub reason: UnscheduledReason,
}

/// Why a task was left out of the day.
///
/// - `DoesNotFit`: Longer than the time left and not splittable
/// - `BudgetExhausted`: No time was left at all when its turn came
/// - `SplitRemainder`: Part of it was scheduled; this is the rest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    DoesNotFit,
    BudgetExhausted,
    SplitRemainder,
}

impl UnscheduledReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::DoesNotFit => "does not fit in the remaining time",
            Self::BudgetExhausted => "no time left today",
            Self::SplitRemainder => "remainder carried over",
        }
    }
}
