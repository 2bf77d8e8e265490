use std::fmt;

use crate::autofilter::{DateGroupItem, Granularity};

/// Render a date-group bucket the way Excel-era tooling printed it.
///
/// Components are written without zero padding (`2022-1-10 14:00:00`), and the
/// time part is only present from `Hour` granularity on. Components finer than
/// the granularity are replaced by a literal `00`.
pub fn format_date_group(item: &DateGroupItem) -> String {
    let year = item.year;
    let month = item.month.unwrap_or(0);
    let day = item.day.unwrap_or(0);
    let hour = item.hour.unwrap_or(0);
    let minute = item.minute.unwrap_or(0);
    let second = item.second.unwrap_or(0);

    match item.granularity {
        Granularity::Year => year.to_string(),
        Granularity::Month => format!("{year}-{month}"),
        Granularity::Day => format!("{year}-{month}-{day}"),
        Granularity::Hour => format!("{year}-{month}-{day} {hour}:00:00"),
        Granularity::Minute => format!("{year}-{month}-{day} {hour}:{minute}:00"),
        Granularity::Second => format!("{year}-{month}-{day} {hour}:{minute}:{second}"),
    }
}

impl fmt::Display for DateGroupItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_date_group(self))
    }
}
