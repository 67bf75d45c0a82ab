use anyhow::{Context, Result, bail};
use time::format_description;
use time::macros::datetime;

const MONTH_FORMS: [&str; 4] = ["02", "February", "Feb", "2"];
const DAY_FORMS: [&str; 2] = ["03", "3"];

/// Checks that a display format shows year, month and day, in that order.
///
/// The format is applied to 2001-02-03 04:05:06 UTC and the rendered text
/// must contain the year, then the month, then the day.
pub fn parse_format(value: &str) -> Result<()> {
    let items = format_description::parse_owned::<1>(value)?;
    let sample = datetime!(2001-02-03 04:05:06 UTC)
        .format(&items)
        .context("date_format cannot be applied to a calendar date")?;

    let Some(year_at) = sample.find("2001") else {
        bail!("date_format must contain a [year] component");
    };
    let after_year = &sample[year_at + 4..];

    let Some(after_month) = find_first(after_year, &MONTH_FORMS) else {
        bail!("date_format must contain a [month] component after the year");
    };
    if find_first(&after_year[after_month..], &DAY_FORMS).is_none() {
        bail!("date_format must contain a [day] component after the month");
    }
    Ok(())
}

/// Byte offset just past the earliest match of any of `forms`.
fn find_first(haystack: &str, forms: &[&str]) -> Option<usize> {
    forms
        .iter()
        .filter_map(|form| haystack.find(form).map(|at| (at, at + form.len())))
        .min_by_key(|&(at, end)| (at, std::cmp::Reverse(end)))
        .map(|(_, end)| end)
}
