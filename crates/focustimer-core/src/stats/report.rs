//! Daily, weekly and all-time aggregates over recorded session events.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::streak::streaks;
use crate::timer::SessionKind;

/// Whether a row marks a session being started or finishing naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEvent {
    Started,
    Completed,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionEvent::Started => "started",
            SessionEvent::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(SessionEvent::Started),
            "completed" => Some(SessionEvent::Completed),
            _ => None,
        }
    }
}

/// One recorded event, dated in local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub kind: SessionKind,
    pub event: SessionEvent,
    pub duration_min: u32,
    pub local_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub focus_minutes: u64,
    pub break_minutes: u64,
    /// Sessions started.
    pub sessions: u64,
    pub completed_sessions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// ISO week, `YYYY-Www`.
    pub week: String,
    pub total_focus_minutes: u64,
    pub total_break_minutes: u64,
    pub total_sessions: u64,
    pub completed_sessions: u64,
    /// Distinct days in the week with at least one completed session.
    pub active_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllTimeStats {
    pub total_focus_minutes: u64,
    pub total_break_minutes: u64,
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub first_use_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    focus_minutes: u64,
    break_minutes: u64,
    started: u64,
    completed: u64,
}

impl Totals {
    fn of<'a>(rows: impl IntoIterator<Item = &'a SessionRow>) -> Self {
        let mut t = Totals::default();
        for row in rows {
            match row.event {
                SessionEvent::Started => t.started += 1,
                SessionEvent::Completed => {
                    t.completed += 1;
                    let minutes = u64::from(row.duration_min);
                    if row.kind.is_break() {
                        t.break_minutes += minutes;
                    } else {
                        t.focus_minutes += minutes;
                    }
                }
            }
        }
        t
    }
}

/// ISO-8601 week label for `date`, e.g. `2026-W07`.
pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn active_days<'a>(rows: impl IntoIterator<Item = &'a SessionRow>) -> BTreeSet<NaiveDate> {
    rows.into_iter()
        .filter(|r| r.event == SessionEvent::Completed)
        .map(|r| r.local_date)
        .collect()
}

pub fn daily(rows: &[SessionRow], date: NaiveDate) -> DailyStats {
    let t = Totals::of(rows.iter().filter(|r| r.local_date == date));
    DailyStats {
        date,
        focus_minutes: t.focus_minutes,
        break_minutes: t.break_minutes,
        sessions: t.started,
        completed_sessions: t.completed,
    }
}

/// Stats for the ISO week containing `date`.
pub fn weekly(rows: &[SessionRow], date: NaiveDate) -> WeeklyStats {
    let target = date.iso_week();
    let in_week: Vec<&SessionRow> = rows
        .iter()
        .filter(|r| r.local_date.iso_week() == target)
        .collect();
    let t = Totals::of(in_week.iter().copied());
    WeeklyStats {
        week: iso_week_label(date),
        total_focus_minutes: t.focus_minutes,
        total_break_minutes: t.break_minutes,
        total_sessions: t.started,
        completed_sessions: t.completed,
        active_days: active_days(in_week.iter().copied()).len() as u32,
    }
}

pub fn all_time(rows: &[SessionRow], today: NaiveDate) -> AllTimeStats {
    let t = Totals::of(rows);
    let (current_streak, longest_streak) = streaks(&active_days(rows), today);
    AllTimeStats {
        total_focus_minutes: t.focus_minutes,
        total_break_minutes: t.break_minutes,
        total_sessions: t.started,
        completed_sessions: t.completed,
        current_streak,
        longest_streak,
        first_use_date: rows.iter().map(|r| r.local_date).min().unwrap_or(today),
    }
}

/// `1h 5m` style rendering of a minute count.
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// The shareable plain-text summary.
pub fn share_text(day: &DailyStats, week: &WeeklyStats, all: &AllTimeStats) -> String {
    format!(
        "🎯 My FocusTimer Stats:\n\n\
         📅 Today: {} ({} sessions)\n\
         📊 This Week: {} ({} sessions)\n\
         🔥 Current Streak: {} days\n\
         🏆 Total Focus Time: {}\n\n\
         Stay focused! 💪 #FocusTimer",
        format_minutes(day.focus_minutes),
        day.completed_sessions,
        format_minutes(week.total_focus_minutes),
        week.completed_sessions,
        all.current_streak,
        format_minutes(all.total_focus_minutes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(kind: SessionKind, event: SessionEvent, minutes: u32, date: &str) -> SessionRow {
        SessionRow {
            kind,
            event,
            duration_min: minutes,
            local_date: d(date),
        }
    }

    fn sample() -> Vec<SessionRow> {
        use SessionEvent::*;
        use SessionKind::*;
        vec![
            // Monday 2026-03-09 and Tuesday 2026-03-10 are in ISO week 11.
            row(Focus, Started, 0, "2026-03-09"),
            row(Focus, Completed, 25, "2026-03-09"),
            row(Break, Started, 0, "2026-03-09"),
            row(Break, Completed, 5, "2026-03-09"),
            row(Focus, Started, 0, "2026-03-10"),
            row(Focus, Completed, 25, "2026-03-10"),
            row(Focus, Started, 0, "2026-03-10"),
            row(Focus, Completed, 30, "2026-03-10"),
            row(LongBreak, Completed, 15, "2026-03-10"),
            // Sunday of the previous week, started but never finished.
            row(Focus, Started, 0, "2026-03-08"),
        ]
    }

    #[test]
    fn daily_splits_focus_and_break_minutes() {
        let day = daily(&sample(), d("2026-03-10"));
        assert_eq!(day.focus_minutes, 55);
        assert_eq!(day.break_minutes, 15);
        assert_eq!(day.sessions, 2);
        assert_eq!(day.completed_sessions, 3);
    }

    #[test]
    fn weekly_counts_distinct_active_days() {
        let week = weekly(&sample(), d("2026-03-10"));
        assert_eq!(week.week, "2026-W11");
        assert_eq!(week.total_focus_minutes, 80);
        assert_eq!(week.total_break_minutes, 20);
        assert_eq!(week.total_sessions, 4);
        assert_eq!(week.completed_sessions, 5);
        assert_eq!(week.active_days, 2);
    }

    #[test]
    fn started_only_day_is_not_active() {
        let week = weekly(&sample(), d("2026-03-08"));
        assert_eq!(week.week, "2026-W10");
        assert_eq!(week.total_sessions, 1);
        assert_eq!(week.active_days, 0);
    }

    #[test]
    fn all_time_includes_streaks_and_first_use() {
        let all = all_time(&sample(), d("2026-03-11"));
        assert_eq!(all.total_focus_minutes, 80);
        assert_eq!(all.completed_sessions, 5);
        assert_eq!(all.total_sessions, 5);
        assert_eq!(all.current_streak, 2);
        assert_eq!(all.longest_streak, 2);
        assert_eq!(all.first_use_date, d("2026-03-08"));
    }

    #[test]
    fn empty_history_uses_today() {
        let all = all_time(&[], d("2026-03-11"));
        assert_eq!(all.first_use_date, d("2026-03-11"));
        assert_eq!(all.current_streak, 0);
    }

    #[test]
    fn minutes_format() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(125), "2h 5m");
    }

    #[test]
    fn share_text_mentions_each_figure() {
        let rows = sample();
        let today = d("2026-03-10");
        let text = share_text(&daily(&rows, today), &weekly(&rows, today), &all_time(&rows, today));
        assert!(text.contains("Today: 55m (3 sessions)"));
        assert!(text.contains("This Week: 1h 20m (5 sessions)"));
        assert!(text.contains("Current Streak: 2 days"));
        assert!(text.contains("Total Focus Time: 1h 20m"));
    }
}
