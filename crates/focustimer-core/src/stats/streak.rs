//! Streaks of consecutive active days.

use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

/// Current and longest runs of consecutive days in `active`.
///
/// The current streak is the run ending today, or yesterday when nothing has
/// been completed yet today; any older run leaves it at zero.
pub fn streaks(active: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in active {
        run = match prev {
            Some(p) if p.checked_add_days(Days::new(1)) == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let yesterday = today.checked_sub_days(Days::new(1));
    let anchor = if active.contains(&today) {
        Some(today)
    } else {
        yesterday.filter(|d| active.contains(d))
    };

    let mut current = 0u32;
    let mut cursor = anchor;
    while let Some(day) = cursor {
        if !active.contains(&day) {
            break;
        }
        current += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }

    (current, longest)
}
