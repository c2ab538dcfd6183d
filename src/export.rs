//! CSV downloads for the task list and a day's schedule.

use anyhow::{Context, Result};

use crate::models::{Schedule, Task, DATE_FORMAT, TIME_FORMAT};

pub const TASKS_FILE_NAME: &str = "tasks_export.csv";

/// `schedule_<date>.csv`
pub fn schedule_file_name(schedule: &Schedule) -> String {
    format!("schedule_{}.csv", schedule.date.format(DATE_FORMAT))
}

/// One row per allocated slot, in start-time order.
pub fn schedule_csv(schedule: &Schedule) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["start", "end", "title", "minutes", "impact", "deadline"])?;

    for slot in &schedule.slots {
        writer.write_record([
            slot.start.format(TIME_FORMAT).to_string(),
            slot.end.format(TIME_FORMAT).to_string(),
            slot.label(),
            slot.minutes.to_string(),
            slot.impact.to_string(),
            format_deadline(slot.deadline),
        ])?;
    }

    finish(writer)
}

/// A multi-day plan as one table, each row prefixed with its day.
pub fn schedules_csv(schedules: &[Schedule]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "start", "end", "title", "minutes", "impact", "deadline"])?;

    for schedule in schedules {
        let date = schedule.date.format(DATE_FORMAT).to_string();
        for slot in &schedule.slots {
            writer.write_record([
                date.clone(),
                slot.start.format(TIME_FORMAT).to_string(),
                slot.end.format(TIME_FORMAT).to_string(),
                slot.label(),
                slot.minutes.to_string(),
                slot.impact.to_string(),
                format_deadline(slot.deadline),
            ])?;
        }
    }

    finish(writer)
}

pub fn tasks_csv(tasks: &[Task]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "title", "minutes", "impact", "deadline", "notes"])?;

    for task in tasks {
        writer.write_record([
            task.id.to_string(),
            task.title.clone(),
            task.minutes.to_string(),
            task.impact.to_string(),
            format_deadline(task.deadline),
            task.notes.clone(),
        ])?;
    }

    finish(writer)
}

fn format_deadline(deadline: Option<chrono::NaiveDate>) -> String {
    deadline
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}
