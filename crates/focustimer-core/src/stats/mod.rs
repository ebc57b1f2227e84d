//! Session statistics.
//!
//! Recorded rows are aggregated into today's, this week's and all-time
//! figures, including streaks of consecutive active days. Storage lives in
//! [`Database`](crate::storage::Database); everything here is pure.

mod report;
mod streak;

pub use report::{
    all_time, daily, format_minutes, iso_week_label, share_text, weekly, AllTimeStats,
    DailyStats, SessionEvent, SessionRow, WeeklyStats,
};
pub use streak::streaks;
