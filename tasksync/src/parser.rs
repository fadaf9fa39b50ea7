//! Quick-add parser: builds a task from one line of free text.
//!
//! ```text
//! Buy milk @shopping !2 #tomorrow
//! Finish report !urgent #friday @work
//! ```
//!
//! After the first word, whitespace-separated markers are recognised:
//! `!N`/`!name` sets the priority, `@tag` adds a tag and `#when` sets the
//! due date. Markers are removed from the title; everything else is kept.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tasksync_proto::task::{MAX_TASK_TITLE_LENGTH, TagSet, Task, TaskPriority, Timestamp};
use thiserror::Error;

/// Errors produced while parsing quick-add text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but markers and whitespace.
    #[error("task title is empty")]
    EmptyTitle,

    /// The title exceeds [`MAX_TASK_TITLE_LENGTH`] characters.
    #[error("task title is {len} characters, maximum is {max}")]
    TitleTooLong { len: usize, max: usize },
}

/// Parse `text` into a new task created at `now`.
///
/// Relative dates (`#tomorrow`, `#friday`, ...) are resolved against
/// `today`. Due dates are midnight UTC.
///
/// # Errors
///
/// Returns [`ParseError::EmptyTitle`] if no title text remains after the
/// markers are removed, or [`ParseError::TitleTooLong`] if it is too long.
pub fn parse_task(text: &str, now: Timestamp, today: NaiveDate) -> Result<Task, ParseError> {
    let mut words: Vec<&str> = Vec::new();
    let mut priority: Option<TaskPriority> = None;
    let mut due_date: Option<Timestamp> = None;
    let mut tags = TagSet::new();

    let mut tokens = text.split_whitespace();
    if let Some(first) = tokens.next() {
        words.push(first);
    }

    for token in tokens {
        let marker = token.chars().next().map(|c| (c, &token[c.len_utf8()..]));
        match marker {
            Some(('!', rest)) => {
                let (word, tail) = split_word(rest, false);
                match word.parse::<TaskPriority>() {
                    Ok(p) => {
                        priority.get_or_insert(p);
                        push_nonempty(&mut words, tail);
                    }
                    Err(_) => words.push(token),
                }
            }
            Some(('@', rest)) => {
                let (word, tail) = split_word(rest, false);
                if word.is_empty() {
                    words.push(token);
                } else {
                    tags.insert(word);
                    push_nonempty(&mut words, tail);
                }
            }
            Some(('#', rest)) => {
                let (word, tail) = split_word(rest, true);
                if word.is_empty() {
                    words.push(token);
                } else {
                    if due_date.is_none() {
                        due_date = resolve_date(word, today);
                    }
                    push_nonempty(&mut words, tail);
                }
            }
            _ => words.push(token),
        }
    }

    let title = words.join(" ");
    if title.is_empty() {
        return Err(ParseError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TASK_TITLE_LENGTH {
        return Err(ParseError::TitleTooLong {
            len,
            max: MAX_TASK_TITLE_LENGTH,
        });
    }

    let mut task = Task::new(title, now);
    task.priority = priority.unwrap_or_default();
    task.due_date = due_date;
    task.tags = tags;
    Ok(task)
}

/// Splits the leading run of word characters off `s`.
///
/// Dates may also contain `-`.
fn split_word(s: &str, allow_dash: bool) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || (allow_dash && c == '-')))
        .map_or(s.len(), |(i, _)| i);
    s.split_at(end)
}

fn push_nonempty<'a>(words: &mut Vec<&'a str>, tail: &'a str) {
    if !tail.is_empty() {
        words.push(tail);
    }
}

fn resolve_date(word: &str, today: NaiveDate) -> Option<Timestamp> {
    let word = word.to_lowercase();
    let date = match word.as_str() {
        "today" | "now" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "next_week" | "nextweek" => today.checked_add_days(Days::new(7)),
        other => match weekday_from_name(other) {
            Some(weekday) => next_weekday(today, weekday),
            None => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
        },
    }?;
    midnight_utc(date)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Dates before the epoch are not representable and yield `None`.
fn midnight_utc(date: NaiveDate) -> Option<Timestamp> {
    let millis = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
    u64::try_from(millis).ok().map(Timestamp::from_millis)
}
