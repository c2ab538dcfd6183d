use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    parse_deadline, validate_impact, validate_minutes, validate_title, ValidationError,
};

/// A piece of work the user wants to fit into their day.
///
/// Tasks are **persistent**: they are stored in the task file and only change
/// when the user adds, edits or removes them. Everything the scheduler needs is
/// here; schedules are derived from tasks and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// Estimated duration in minutes. Always positive.
    pub minutes: u32,
    /// User-assigned weight. Higher means more valuable. Never negative.
    pub impact: f64,
    /// Calendar day the task is due. May be in the past.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    /// Whether the scheduler may cut this task into several slices even when
    /// splitting is off for the whole plan.
    #[serde(default)]
    pub splittable: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a task from raw input, rejecting anything the scheduler can't use.
    pub fn from_input(input: CreateTaskInput) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: validate_title(&input.title)?,
            minutes: validate_minutes(input.minutes)?,
            impact: validate_impact(input.impact)?,
            deadline: parse_deadline(input.deadline.as_deref())?,
            notes: input.notes.unwrap_or_default().trim().to_string(),
            splittable: input.splittable,
            created_at: Utc::now(),
        })
    }

    /// Re-check a task that came from storage rather than from user input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_minutes(i64::from(self.minutes))?;
        validate_impact(self.impact)?;
        Ok(())
    }

    /// Apply a partial update. Nothing is changed if any field is invalid.
    pub fn apply(&mut self, input: UpdateTaskInput) -> Result<(), ValidationError> {
        let title = input.title.as_deref().map(validate_title).transpose()?;
        let minutes = input.minutes.map(validate_minutes).transpose()?;
        let impact = input.impact.map(validate_impact).transpose()?;
        let deadline = match input.deadline.as_deref() {
            Some(raw) => Some(parse_deadline(Some(raw))?),
            None => None,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(minutes) = minutes {
            self.minutes = minutes;
        }
        if let Some(impact) = impact {
            self.impact = impact;
        }
        if let Some(deadline) = deadline {
            self.deadline = deadline;
        }
        if let Some(notes) = input.notes {
            self.notes = notes.trim().to_string();
        }
        if let Some(splittable) = input.splittable {
            self.splittable = splittable;
        }
        Ok(())
    }
}

/// Input for creating a new task.
///
/// `minutes` is signed and `deadline` is a plain string so that bad values reach
/// validation and produce a readable message instead of a deserializer error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    pub minutes: i64,
    pub impact: f64,
    /// `YYYY-MM-DD`. Blank or missing means no deadline.
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub splittable: bool,
}

/// Input for updating a task. All fields are optional for partial updates.
///
/// An empty `deadline` string clears the deadline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub minutes: Option<i64>,
    pub impact: Option<f64>,
    pub deadline: Option<String>,
    pub notes: Option<String>,
    pub splittable: Option<bool>,
}

/// On-disk layout of the task file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<Task>,
}
