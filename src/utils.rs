//! Proleptic Gregorian date arithmetic on epoch days and seconds.

pub(crate) const SECONDS_PER_DAY: i64 = 86_400;

pub(crate) const fn is_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub(crate) const fn iso_days_in_month(year: i32, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days before the first day of `month` (1-based) in a year.
pub(crate) const fn month_to_day(month: u8, is_leap: bool) -> u16 {
    const CUMULATIVE: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let days = CUMULATIVE[(month - 1) as usize];
    if is_leap && month > 2 {
        days + 1
    } else {
        days
    }
}

/// Days since 1970-01-01 for a Gregorian date.
pub(crate) const fn epoch_days_from_gregorian_date(year: i32, month: u8, day: u8) -> i64 {
    let year = year as i64 - (month <= 2) as i64;
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month_from_march = (month as i64 + 9) % 12;
    let day_of_year = (153 * month_from_march + 2) / 5 + day as i64 - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

pub(crate) const fn epoch_days_for_year(year: i32) -> i64 {
    epoch_days_from_gregorian_date(year, 1, 1)
}

/// The Gregorian (year, month, day) of an epoch day.
pub(crate) const fn ymd_from_epoch_days(epoch_days: i64) -> (i32, u8, u8) {
    let days = epoch_days + 719_468;
    let era = days.div_euclid(146_097);
    let day_of_era = days - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_from_march = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * month_from_march + 2) / 5 + 1) as u8;
    let month = (if month_from_march < 10 {
        month_from_march + 3
    } else {
        month_from_march - 9
    }) as u8;
    let year = year_of_era + era * 400 + (month <= 2) as i64;
    (year as i32, month, day)
}

/// Day of the week for an epoch day, 0 = Sunday.
pub(crate) const fn epoch_days_to_day_of_week(epoch_days: i64) -> u8 {
    // 1970-01-01 was a Thursday.
    (epoch_days + 4).rem_euclid(7) as u8
}

pub(crate) const fn epoch_seconds_to_iso_year(epoch_seconds: i64) -> i32 {
    ymd_from_epoch_days(epoch_seconds.div_euclid(SECONDS_PER_DAY)).0
}
