use chrono::{Datelike, Days, NaiveDate};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sept", "Oct", "Nov", "Dec",
];

/// Add calendar months, keeping the day number and letting any excess
/// days spill into the following month (31 Jan + 1 month = 3 Mar, or 2 Mar
/// in a leap year). Returns `None` only if the result leaves chrono's range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let zero_based = date.month0() + months;
    let year = date.year().checked_add(i32::try_from(zero_based / 12).ok()?)?;
    let month = zero_based % 12 + 1;

    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    first_of_month.checked_add_days(Days::new(u64::from(date.day() - 1)))
}

/// en-GB short date, e.g. `15 Jan 2025`.
pub fn format_display_date(date: &NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTH_ABBREVIATIONS[date.month0() as usize],
        date.year()
    )
}
