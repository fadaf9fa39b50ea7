//! Importance scoring used to order task listings.

use std::cmp::Reverse;

use tasksync_proto::task::{DAY_MILLIS, Task, TaskStatus, Timestamp};

/// Tags that mark a task as blocking other work.
const BOOST_TAGS: [&str; 3] = ["blocker", "critical", "urgent"];

/// Importance score of `task` at time `now`; higher is more important.
///
/// | factor                          | points |
/// |---------------------------------|--------|
/// | priority weight                 | ×10    |
/// | overdue                         | +30    |
/// | due today                       | +20    |
/// | due within 2 days               | +15    |
/// | due within 7 days               | +10    |
/// | done                            | −50    |
/// | in review                       | −15    |
/// | tagged blocker/critical/urgent  | +8     |
/// | updated within the last day     | +5     |
#[must_use]
pub fn score(task: &Task, now: Timestamp) -> i64 {
    let mut score = i64::from(task.priority.weight()) * 10;

    if let Some(due) = task.due_date {
        score += match whole_days(now, due) {
            d if d < 0 => 30,
            0 => 20,
            1..=2 => 15,
            3..=7 => 10,
            _ => 0,
        };
    }

    score -= match task.status {
        TaskStatus::Done => 50,
        TaskStatus::Review => 15,
        TaskStatus::Todo | TaskStatus::InProgress => 0,
    };

    if BOOST_TAGS.iter().any(|tag| task.tags.contains(tag)) {
        score += 8;
    }

    if whole_days(task.updated_at, now) < 1 {
        score += 5;
    }

    score
}

/// Sorts `tasks` so the most important come first; ties keep their order.
pub fn sort_by_importance(tasks: &mut [Task], now: Timestamp) {
    tasks.sort_by_cached_key(|task| Reverse(score(task, now)));
}

/// The `limit` most important tasks.
#[must_use]
pub fn top_priority(tasks: impl IntoIterator<Item = Task>, now: Timestamp, limit: usize) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.into_iter().collect();
    sort_by_importance(&mut tasks, now);
    tasks.truncate(limit);
    tasks
}

/// Whole days from `from` to `to`, rounded towards negative infinity.
fn whole_days(from: Timestamp, to: Timestamp) -> i64 {
    let diff = i128::from(to.as_millis()) - i128::from(from.as_millis());
    let days = diff.div_euclid(i128::from(DAY_MILLIS));
    i64::try_from(days).unwrap_or(i64::MAX)
}
