//! Calendar arithmetic for `DifferenceWithinRange`: the delta between two
//! `WbTime` values expressed in years, days, or seconds depending on which
//! unit the constraint's bound declares.
//!
//! Proleptic-Gregorian only: `WbTime::calendar` (Julian vs. Gregorian) is
//! not modeled here, matching the filtered original source, which never
//! surfaced calendar-aware subtraction either.

use axiom_core::WbTime;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Wikidata's unit ids for year/day/second, as used on `P2312`/`P2313`
/// bounds for `DifferenceWithinRange`.
pub const UNIT_YEAR: &str = "Q577";
pub const UNIT_DAY: &str = "Q573";
pub const UNIT_SECOND: &str = "Q11574";

/// `this - other`, in whole years, subtracting one if `this`'s (month, day)
/// falls before `other`'s — i.e. "completed years" rather than calendar-year
/// subtraction.
pub fn year_delta(this: &WbTime, other: &WbTime) -> i64 {
    let mut delta = this.year - other.year;
    if (this.month, this.day) < (other.month, other.day) {
        delta -= 1;
    }
    delta
}

/// `this - other` in whole days, or `None` if either time's (year, month,
/// day) does not form a valid Gregorian date (month/day of `0`, used by
/// low-precision Wikibase times, is treated as the 1st).
pub fn day_delta(this: &WbTime, other: &WbTime) -> Option<i64> {
    let a = to_naive_date(this)?;
    let b = to_naive_date(other)?;
    Some((a - b).num_days())
}

/// `this - other` in whole seconds, same validity caveat as [`day_delta`].
pub fn second_delta(this: &WbTime, other: &WbTime) -> Option<i64> {
    let a = to_naive_date(this)?.and_hms_opt(this.hour as u32, this.minute as u32, this.second as u32)?;
    let b = to_naive_date(other)?.and_hms_opt(other.hour as u32, other.minute as u32, other.second as u32)?;
    Some((a - b).num_seconds())
}

fn to_naive_date(t: &WbTime) -> Option<NaiveDate> {
    let year = i32::try_from(t.year).ok()?;
    let month = if t.month == 0 { 1 } else { t.month as u32 };
    let day = if t.day == 0 { 1 } else { t.day as u32 };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Compute the delta between `this` and `other` in whichever unit `unit`
/// names, as an exact `Decimal`. Returns `None` for an unrecognized unit or
/// an unrepresentable date.
pub fn delta_in_unit(this: &WbTime, other: &WbTime, unit: &str) -> Option<Decimal> {
    match unit {
        UNIT_YEAR => Some(Decimal::from(year_delta(this, other))),
        UNIT_DAY => day_delta(this, other).map(Decimal::from),
        UNIT_SECOND => second_delta(this, other).map(Decimal::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(year: i64, month: u8, day: u8) -> WbTime {
        WbTime {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            precision: 11,
            calendar: None,
        }
    }

    #[test]
    fn year_delta_subtracts_one_before_anniversary() {
        let birth = time(1990, 6, 15);
        let reference = time(2000, 3, 1);
        assert_eq!(year_delta(&reference, &birth), 9);
    }

    #[test]
    fn year_delta_full_years_after_anniversary() {
        let birth = time(1990, 6, 15);
        let reference = time(2000, 8, 1);
        assert_eq!(year_delta(&reference, &birth), 10);
    }

    #[test]
    fn day_delta_counts_whole_days() {
        let a = time(2000, 1, 10);
        let b = time(2000, 1, 1);
        assert_eq!(day_delta(&a, &b), Some(9));
    }
}
