use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use dayplan::models::*;
use dayplan::scheduler::{schedule_day, schedule_days};
use speculate2::speculate;
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

fn options(hours: f64, allow_split: bool) -> ScheduleOptions {
    ScheduleOptions::from_params(
        today(),
        &ScheduleParams {
            hours: Some(hours),
            budget_minutes: None,
            start: Some("09:00".to_string()),
            allow_split: Some(allow_split),
            urgency_window: Some(7),
        },
    )
    .expect("Invalid options")
}

/// A spread of task sets used for the invariant checks below.
fn task_sets() -> Vec<Vec<Task>> {
    let mut sets = vec![Vec::new()];
    for n in 1..=12u32 {
        let set = (0..n)
            .map(|i| {
                let minutes = 15 + (i * 37) % 140;
                let impact = f64::from((i * 7) % 11);
                let due = if i % 3 == 0 { None } else { Some(i64::from(i % 9) - 2) };
                let mut t = task(&format!("t{}", i), minutes, impact, due);
                t.splittable = i % 4 == 1;
                t
            })
            .collect();
        sets.push(set);
    }
    sets
}

speculate! {
    describe "schedule_day" {
        it "plans a due-today task before a later, lower-value one" {
            let a = task("A", 60, 8.0, Some(0));
            let b = task("B", 30, 4.0, Some(5));
            let plan = schedule_day(&[b.clone(), a.clone()], &options(1.5, false));

            let ids: Vec<_> = plan.slots.iter().map(|s| s.task_id).collect();
            assert_eq!(ids, vec![a.id, b.id]);
            assert_eq!(plan.allocated_minutes, 90);
            assert_eq!(plan.utilization, 1.0);
            assert!(plan.unscheduled.is_empty());
        }

        it "flags what doesn't fit when splitting is off" {
            let tasks = vec![
                task("high", 60, 9.0, Some(1)),
                task("mid", 50, 3.0, Some(4)),
                task("low", 40, 1.0, None),
            ];
            let plan = schedule_day(&tasks, &options(1.5, false));

            assert!(plan.allocated_minutes <= 90);
            assert!(plan.utilization <= 1.0);
            let left_out: Vec<_> = plan.unscheduled.iter().map(|u| u.title.as_str()).collect();
            assert!(left_out.contains(&"mid"));
            assert!(plan.unscheduled.iter().all(|u| u.reason != UnscheduledReason::SplitRemainder));
            assert_eq!(plan.slots[0].title, "high");
        }

        it "returns an empty schedule for no tasks" {
            let plan = schedule_day(&[], &options(8.0, false));
            assert!(plan.is_empty());
            assert!(plan.unscheduled.is_empty());
            assert_eq!(plan.utilization, 0.0);
            assert_eq!(plan.date, today());
        }

        it "fills the remaining time with a slice when splitting is on" {
            let tasks = vec![task("first", 60, 6.0, None), task("long", 120, 10.0, None)];
            let plan = schedule_day(&tasks, &options(2.0, true));

            assert_eq!(plan.allocated_minutes, 120);
            assert_eq!(plan.slots[0].title, "first");
            assert_eq!(plan.slots[0].part, None);
            assert_eq!(plan.slots[1].title, "long");
            assert_eq!(plan.slots[1].minutes, 60);
            assert_eq!(plan.slots[1].part, Some(1));

            assert_eq!(plan.unscheduled.len(), 1);
            assert_eq!(plan.unscheduled[0].title, "long");
            assert_eq!(plan.unscheduled[0].minutes, 60);
            assert_eq!(plan.unscheduled[0].reason, UnscheduledReason::SplitRemainder);
        }

        it "starts at the configured time" {
            let params = ScheduleParams {
                start: Some("13:15".to_string()),
                ..Default::default()
            };
            let opts = ScheduleOptions::from_params(today(), &params).unwrap();
            let plan = schedule_day(&[task("A", 45, 1.0, None)], &opts);

            assert_eq!(plan.slots[0].start, NaiveTime::from_hms_opt(13, 15, 0).unwrap());
            assert_eq!(plan.slots[0].end, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        }
    }

    describe "invariants" {
        it "never allocates more than the budget" {
            for tasks in task_sets() {
                for hours in [0.5, 1.0, 2.5, 8.0] {
                    for split in [false, true] {
                        let opts = options(hours, split);
                        let plan = schedule_day(&tasks, &opts);
                        let total: u32 = plan.slots.iter().map(|s| s.minutes).sum();
                        assert!(total <= opts.budget_minutes);
                        assert_eq!(total, plan.allocated_minutes);
                        assert!(plan.utilization >= 0.0 && plan.utilization <= 1.0);
                    }
                }
            }
        }

        it "lists every task exactly once per day without splitting" {
            for mut tasks in task_sets() {
                tasks.iter_mut().for_each(|t| t.splittable = false);
                let plan = schedule_day(&tasks, &options(2.0, false));
                let mut seen: Vec<_> = plan.slots.iter().map(|s| s.task_id)
                    .chain(plan.unscheduled.iter().map(|u| u.task_id))
                    .collect();
                seen.sort();
                let mut expected: Vec<_> = tasks.iter().map(|t| t.id).collect();
                expected.sort();
                assert_eq!(seen, expected);
            }
        }

        it "is idempotent" {
            for tasks in task_sets() {
                let opts = options(3.0, true);
                assert_eq!(schedule_day(&tasks, &opts), schedule_day(&tasks, &opts));
            }
        }

        it "keeps slots back to back" {
            for tasks in task_sets() {
                let plan = schedule_day(&tasks, &options(4.0, true));
                for pair in plan.slots.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
            }
        }
    }

    describe "schedule_days" {
        it "carries tasks that didn't fit into the next day" {
            let tasks = vec![task("today", 60, 8.0, Some(0)), task("tomorrow", 60, 1.0, None)];
            let plans = schedule_days(&tasks, &options(1.0, false), 2);

            assert_eq!(plans[0].slots[0].title, "today");
            assert_eq!(plans[0].unscheduled[0].title, "tomorrow");
            assert_eq!(plans[1].date, today() + Duration::days(1));
            assert_eq!(plans[1].slots[0].title, "tomorrow");
            assert!(plans[1].unscheduled.is_empty());
        }

        it "spreads a split task across days until it is done" {
            let tasks = vec![task("thesis", 300, 20.0, Some(10))];
            let plans = schedule_days(&tasks, &options(2.0, true), 4);

            let minutes: Vec<_> = plans.iter().map(|p| p.allocated_minutes).collect();
            assert_eq!(minutes, vec![120, 120, 60, 0]);
            let total: u32 = plans.iter().flat_map(|p| &p.slots).map(|s| s.minutes).sum();
            assert_eq!(total, 300);
        }

        it "returns nothing for zero days" {
            assert!(schedule_days(&[task("A", 10, 1.0, None)], &options(1.0, false), 0).is_empty());
        }
    }
}
