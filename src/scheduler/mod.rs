//! Scoring and day planning.
//!
//! Every task gets a priority score:
//!
//! ```text
//! score   = (impact / minutes) * urgency
//! urgency = 1 + max(0, (window - days_left) / window)
//! ```
//!
//! so urgency runs from 1.0 (no deadline, or due beyond the window) to 2.0
//! (due today or overdue). Tasks are then ranked by score and packed greedily
//! into the day's time budget, back to back from the start time.
//!
//! Everything here is a pure function of its arguments. "Today" comes in
//! through [`ScheduleOptions::date`], never from the clock, so the same input
//! always produces the same plan.

use std::cmp::Ordering;

use chrono::{Days, Duration, NaiveDate};

use crate::models::{
    Schedule, ScheduleOptions, ScheduledSlot, Task, UnscheduledReason, UnscheduledTask,
};

/// Deadline urgency multiplier in `[1, 2]`.
pub fn urgency(deadline: Option<NaiveDate>, today: NaiveDate, window_days: u32) -> f64 {
    let Some(deadline) = deadline else {
        return 1.0;
    };
    let window = f64::from(window_days.max(1));
    let days_left = (deadline - today).num_days().max(0) as f64;
    1.0 + ((window - days_left) / window).max(0.0)
}

/// Urgency-weighted impact per minute.
pub fn score(task: &Task, today: NaiveDate, window_days: u32) -> f64 {
    let minutes = f64::from(task.minutes.max(1));
    (task.impact / minutes) * urgency(task.deadline, today, window_days)
}

/// A task together with its score, in ranked order.
#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a> {
    pub task: &'a Task,
    pub score: f64,
}

/// Order tasks by score, highest first.
///
/// Ties go to the earlier deadline (undated last), then the shorter task, then
/// whichever came first in `tasks`.
pub fn rank<'a>(tasks: &'a [Task], options: &ScheduleOptions) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<_> = tasks
        .iter()
        .map(|task| Ranked {
            task,
            score: score(task, options.date, options.urgency_window_days),
        })
        .collect();
    ranked.sort_by(|a, b| {
        compare(
            (a.score, a.task.deadline, a.task.minutes),
            (b.score, b.task.deadline, b.task.minutes),
        )
    });
    ranked
}

fn compare(
    (a_score, a_deadline, a_minutes): (f64, Option<NaiveDate>, u32),
    (b_score, b_deadline, b_minutes): (f64, Option<NaiveDate>, u32),
) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| match (a_deadline, b_deadline) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a_minutes.cmp(&b_minutes))
}

/// Plan a single day.
///
/// Tasks that don't fit are listed in [`Schedule::unscheduled`] with the
/// reason. A task that may be split fills whatever time is left and its
/// remainder is reported as [`UnscheduledReason::SplitRemainder`].
pub fn schedule_day(tasks: &[Task], options: &ScheduleOptions) -> Schedule {
    let pending = tasks.iter().map(Pending::new).collect();
    plan_day(pending, options).0
}

/// Plan `days` consecutive days starting at `options.date`.
///
/// Whatever one day leaves over (split remainders and tasks that didn't fit)
/// is offered again the next day, re-scored against that day's date. With a
/// long enough horizon the slices of a split task add up to its full duration.
pub fn schedule_days(tasks: &[Task], options: &ScheduleOptions, days: u32) -> Vec<Schedule> {
    let mut pending: Vec<Pending> = tasks.iter().map(Pending::new).collect();
    let mut plans = Vec::with_capacity(days as usize);

    for offset in 0..days {
        let Some(date) = options.date.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        let day_options = ScheduleOptions {
            date,
            ..options.clone()
        };
        let (schedule, carried) = plan_day(pending, &day_options);
        plans.push(schedule);
        pending = carried;
    }

    plans
}

/// Work still waiting for time: a task plus how much of it is left.
#[derive(Debug, Clone)]
struct Pending<'a> {
    task: &'a Task,
    remaining: u32,
    /// Slices already placed on earlier days.
    parts_done: u32,
}

impl<'a> Pending<'a> {
    fn new(task: &'a Task) -> Self {
        Self {
            task,
            remaining: task.minutes,
            parts_done: 0,
        }
    }

    fn part(&self, splitting_now: bool) -> Option<u32> {
        (splitting_now || self.parts_done > 0).then_some(self.parts_done + 1)
    }
}

fn plan_day<'a>(pending: Vec<Pending<'a>>, options: &ScheduleOptions) -> (Schedule, Vec<Pending<'a>>) {
    let mut schedule = Schedule::empty(options);
    let mut carried = Vec::new();

    let mut ranked: Vec<(Pending<'a>, f64)> = pending
        .into_iter()
        .map(|p| {
            let s = score(p.task, options.date, options.urgency_window_days);
            (p, s)
        })
        .collect();
    ranked.sort_by(|(a, a_score), (b, b_score)| {
        compare(
            (*a_score, a.task.deadline, a.remaining),
            (*b_score, b.task.deadline, b.remaining),
        )
    });

    let budget = options.budget_minutes;
    let mut used = 0u32;

    for (mut work, priority) in ranked {
        let left = budget - used;
        let task = work.task;

        let (minutes, reason) = if left == 0 {
            (0, Some(UnscheduledReason::BudgetExhausted))
        } else if work.remaining <= left {
            (work.remaining, None)
        } else if options.allow_split || task.splittable {
            (left, Some(UnscheduledReason::SplitRemainder))
        } else {
            (0, Some(UnscheduledReason::DoesNotFit))
        };

        if minutes > 0 {
            let start = options.day_start + Duration::minutes(i64::from(used));
            let splitting_now = reason == Some(UnscheduledReason::SplitRemainder);
            schedule.slots.push(ScheduledSlot {
                task_id: task.id,
                title: task.title.clone(),
                start,
                end: start + Duration::minutes(i64::from(minutes)),
                minutes,
                impact: task.impact,
                deadline: task.deadline,
                score: priority,
                part: work.part(splitting_now),
            });
            used += minutes;
            work.remaining -= minutes;
            work.parts_done += 1;
        }

        if let Some(reason) = reason {
            schedule.unscheduled.push(UnscheduledTask {
                task_id: task.id,
                title: task.title.clone(),
                minutes: work.remaining,
                score: priority,
                reason,
            });
            carried.push(work);
        }
    }

    schedule.allocated_minutes = used;
    schedule.utilization = if budget == 0 {
        0.0
    } else {
        f64::from(used) / f64::from(budget)
    };

    (schedule, carried)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn task(title: &str, minutes: u32, impact: f64, due_in: Option<i64>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            minutes,
            impact,
            deadline: due_in.map(|d| today() + Duration::days(d)),
            notes: String::new(),
            splittable: false,
            created_at: Utc::now(),
        }
    }

    fn options(budget_minutes: u32) -> ScheduleOptions {
        ScheduleOptions {
            date: today(),
            budget_minutes,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            allow_split: false,
            urgency_window_days: 7,
        }
    }

    #[test]
    fn urgency_is_two_when_due_today_or_overdue() {
        assert_eq!(urgency(Some(today()), today(), 7), 2.0);
        assert_eq!(urgency(Some(today() - Duration::days(3)), today(), 7), 2.0);
    }

    #[test]
    fn urgency_is_one_without_deadline_or_beyond_window() {
        assert_eq!(urgency(None, today(), 7), 1.0);
        assert_eq!(urgency(Some(today() + Duration::days(7)), today(), 7), 1.0);
        assert_eq!(urgency(Some(today() + Duration::days(30)), today(), 7), 1.0);
    }

    #[test]
    fn urgency_scales_linearly_inside_window() {
        let u = urgency(Some(today() + Duration::days(2)), today(), 4);
        assert!((u - 1.5).abs() < 1e-12);
    }

    #[test]
    fn score_weights_impact_per_minute() {
        let t = task("A", 60, 8.0, Some(0));
        let s = score(&t, today(), 7);
        assert!((s - 8.0 / 60.0 * 2.0).abs() < 1e-12);
    }

    #[test]
    fn rank_breaks_ties_by_deadline_then_duration() {
        // All three score exactly 0.1 (no urgency boost beyond the window).
        let late = task("late", 30, 3.0, Some(20));
        let long = task("long", 60, 6.0, Some(10));
        let short = task("short", 30, 3.0, Some(10));
        let tasks = vec![late, long, short];

        let order: Vec<_> = rank(&tasks, &options(480))
            .into_iter()
            .map(|r| r.task.title.as_str())
            .collect();
        assert_eq!(order, vec!["short", "long", "late"]);
    }

    #[test]
    fn rank_puts_undated_after_dated_on_equal_score() {
        let undated = task("undated", 30, 3.0, None);
        let dated = task("dated", 30, 3.0, Some(60));
        let tasks = vec![undated, dated];

        let ranked = rank(&tasks, &options(480));
        assert_eq!(ranked[0].task.title, "dated");
    }

    #[test]
    fn slots_are_back_to_back_from_day_start() {
        let tasks = vec![task("A", 60, 8.0, Some(0)), task("B", 30, 4.0, Some(5))];
        let plan = schedule_day(&tasks, &options(90));

        assert_eq!(plan.slots.len(), 2);
        assert_eq!(plan.slots[0].start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(plan.slots[0].end, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(plan.slots[1].start, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(plan.slots[1].end, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn skipped_task_does_not_stop_smaller_ones() {
        let tasks = vec![
            task("big", 120, 100.0, Some(0)),
            task("medium", 60, 1.0, None),
            task("small", 20, 0.5, None),
        ];
        let plan = schedule_day(&tasks, &options(90));

        let titles: Vec<_> = plan.slots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["small", "medium"]);
        assert_eq!(plan.unscheduled[0].title, "big");
        assert_eq!(plan.unscheduled[0].reason, UnscheduledReason::DoesNotFit);
    }

    #[test]
    fn exhausted_budget_marks_the_rest() {
        let tasks = vec![task("A", 60, 6.0, None), task("B", 30, 1.0, None)];
        let plan = schedule_day(&tasks, &options(60));

        assert_eq!(plan.unscheduled.len(), 1);
        assert_eq!(plan.unscheduled[0].reason, UnscheduledReason::BudgetExhausted);
        assert_eq!(plan.utilization, 1.0);
    }

    #[test]
    fn task_flag_enables_split_without_global_switch() {
        let mut big = task("big", 120, 100.0, None);
        big.splittable = true;
        let plan = schedule_day(&[big], &options(45));

        assert_eq!(plan.slots.len(), 1);
        assert_eq!(plan.slots[0].minutes, 45);
        assert_eq!(plan.slots[0].part, Some(1));
        assert_eq!(plan.unscheduled[0].minutes, 75);
        assert_eq!(plan.unscheduled[0].reason, UnscheduledReason::SplitRemainder);
    }

    #[test]
    fn zero_budget_gives_zero_utilization() {
        let plan = schedule_day(&[task("A", 10, 1.0, None)], &options(0));
        assert!(plan.slots.is_empty());
        assert_eq!(plan.utilization, 0.0);
    }

    #[test]
    fn multi_day_slices_add_up() {
        let mut big = task("big", 200, 10.0, Some(3));
        big.splittable = true;
        let plans = schedule_days(&[big.clone()], &options(90), 3);

        assert_eq!(plans.len(), 3);
        let slices: Vec<_> = plans
            .iter()
            .flat_map(|p| p.slots.iter())
            .filter(|s| s.task_id == big.id)
            .collect();
        let parts: Vec<_> = slices.iter().map(|s| s.part).collect();
        assert_eq!(parts, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(slices.iter().map(|s| s.minutes).sum::<u32>(), 200);
        assert_eq!(plans[1].date, today() + Duration::days(1));
        assert!(plans[2].unscheduled.is_empty());
    }
}
