//! The parsed time zone object handed back by a lookup.

use core::fmt;

use combine::Parser;

use tzif::data::{
    posix::{DstTransitionInfo, PosixTzString, TimeZoneVariantInfo, TransitionDate, TransitionDay},
    time::Seconds,
    tzif::{DataBlock, LocalTimeTypeRecord, TzifData, TzifHeader},
};

use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TzifError {
    /// The bytes are not a well formed TZif file.
    Parse { name: String, message: String },
    /// A transition or the footer refers to a local time type that does not exist.
    InvalidLocalTimeType { name: String, index: usize },
}

impl fmt::Display for TzifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { name, message } => write!(f, "illformed TZif data for {name}: {message}"),
            Self::InvalidLocalTimeType { name, index } => {
                write!(f, "{name} has no local time type {index}")
            }
        }
    }
}

impl std::error::Error for TzifError {}

/// Seconds east of UTC: add to a UTC instant to get local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct UtcOffsetSeconds(pub i64);

impl From<&TimeZoneVariantInfo> for UtcOffsetSeconds {
    fn from(value: &TimeZoneVariantInfo) -> Self {
        // POSIX offsets count seconds west of UTC.
        Self(-value.offset.0)
    }
}

impl From<LocalTimeTypeRecord> for UtcOffsetSeconds {
    fn from(value: LocalTimeTypeRecord) -> Self {
        Self(value.utoff.0)
    }
}

impl fmt::Display for UtcOffsetSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        let (hours, minutes, seconds) = (abs / 3600, abs / 60 % 60, abs % 60);
        write!(f, "{sign}{hours:02}:{minutes:02}")?;
        if seconds != 0 {
            write!(f, ":{seconds:02}")?;
        }
        Ok(())
    }
}

/// A zone parsed from the Time Zone Information Format, as laid out by
/// [RFC 8536][rfc8536] and the [tzfile manual][tzif-manual].
///
/// Holds the parsed data from the [`tzif` crate][tzif-crate] together with
/// the canonical key it was loaded under.
///
/// [rfc8536]: https://datatracker.ietf.org/doc/html/rfc8536
/// [tzif-manual]: https://man7.org/linux/man-pages/man5/tzfile.5.html
/// [tzif-crate]: https://docs.rs/tzif/latest/tzif/
#[derive(Debug, Clone)]
pub struct Tzif {
    pub name: String,
    pub header1: TzifHeader,
    pub data_block1: DataBlock,
    pub header2: Option<TzifHeader>,
    pub data_block2: Option<DataBlock>,
    pub footer: Option<PosixTzString>,
}

impl Tzif {
    fn from_data(name: &str, value: TzifData) -> Self {
        let TzifData {
            header1,
            data_block1,
            header2,
            data_block2,
            footer,
        } = value;

        Self {
            name: name.to_owned(),
            header1,
            data_block1,
            header2,
            data_block2,
            footer,
        }
    }

    /// Parses raw TZif bytes.
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self, TzifError> {
        match tzif::parse::tzif::tzif().parse(data) {
            Ok((parse_result, _)) => Ok(Self::from_data(name, parse_result)),
            Err(err) => Err(TzifError::Parse {
                name: name.to_owned(),
                message: err.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn posix_tz_string(&self) -> Option<&PosixTzString> {
        self.footer.as_ref()
    }

    /// The 64-bit data block of a v2+ file, otherwise the v1 block.
    pub fn data_block(&self) -> &DataBlock {
        self.data_block2.as_ref().unwrap_or(&self.data_block1)
    }

    /// Returns the UTC offset in effect at `epoch_seconds`.
    pub fn offset_for_epoch_seconds(
        &self,
        epoch_seconds: i64,
    ) -> Result<UtcOffsetSeconds, TzifError> {
        let db = self.data_block();
        let seconds = Seconds(epoch_seconds);

        match db.transition_times.binary_search(&seconds) {
            // A transition applies from its own instant onwards.
            Ok(idx) => self.local_record(db, idx).map(Into::into),
            // RFC 8536 3.2: without transitions the footer applies, then type 0.
            Err(_) if db.transition_times.is_empty() => match self.posix_tz_string() {
                Some(posix) => Ok(resolve_posix_tz_string_for_epoch_seconds(
                    posix,
                    epoch_seconds,
                )),
                None => self.local_time_type(db, 0).map(Into::into),
            },
            Err(0) => self.local_time_type(db, 0).map(Into::into),
            Err(idx) if idx >= db.transition_times.len() => {
                // Beyond the last transition the footer describes the zone.
                match self.posix_tz_string() {
                    Some(posix) => Ok(resolve_posix_tz_string_for_epoch_seconds(posix, epoch_seconds)),
                    None => self.local_record(db, idx - 1).map(Into::into),
                }
            }
            Err(idx) => self.local_record(db, idx - 1).map(Into::into),
        }
    }

    /// Renders `epoch_seconds` as a local date and time in this zone.
    pub fn local_time(&self, epoch_seconds: i64) -> Result<ZonedTime, TzifError> {
        let offset = self.offset_for_epoch_seconds(epoch_seconds)?;
        Ok(ZonedTime::from_epoch_seconds(epoch_seconds, offset))
    }

    fn local_record(
        &self,
        db: &DataBlock,
        transition_idx: usize,
    ) -> Result<LocalTimeTypeRecord, TzifError> {
        // Files without transition types use local time type 0 throughout.
        let type_idx = db.transition_types.get(transition_idx).copied().unwrap_or(0);
        self.local_time_type(db, type_idx)
    }

    fn local_time_type(
        &self,
        db: &DataBlock,
        index: usize,
    ) -> Result<LocalTimeTypeRecord, TzifError> {
        db.local_time_type_records
            .get(index)
            .copied()
            .ok_or_else(|| TzifError::InvalidLocalTimeType {
                name: self.name.clone(),
                index,
            })
    }
}

/// Stores the information about DST transitions for a given year
struct DstTransitionInfoForYear {
    dst_start_seconds: i64,
    dst_end_seconds: i64,
    std_offset: UtcOffsetSeconds,
    dst_offset: UtcOffsetSeconds,
}

impl DstTransitionInfoForYear {
    fn compute(posix_tz_string: &PosixTzString, dst_variant: &DstTransitionInfo, year: i32) -> Self {
        let std_offset = UtcOffsetSeconds::from(&posix_tz_string.std_info);
        let dst_offset = UtcOffsetSeconds::from(&dst_variant.variant_info);
        // The start is written in standard time, the end in daylight time.
        let dst_start_seconds =
            calculate_transition_seconds_for_year(year, dst_variant.start_date, std_offset);
        let dst_end_seconds =
            calculate_transition_seconds_for_year(year, dst_variant.end_date, dst_offset);
        Self {
            dst_start_seconds,
            dst_end_seconds,
            std_offset,
            dst_offset,
        }
    }
}

fn resolve_posix_tz_string_for_epoch_seconds(
    posix_tz_string: &PosixTzString,
    epoch_seconds: i64,
) -> UtcOffsetSeconds {
    let Some(dst_variant) = &posix_tz_string.dst_info else {
        // No DST rule: standard time all year.
        return UtcOffsetSeconds::from(&posix_tz_string.std_info);
    };

    let year = utils::epoch_seconds_to_iso_year(epoch_seconds);
    let info = DstTransitionInfoForYear::compute(posix_tz_string, dst_variant, year);

    // Northern hemisphere: STD -> DST -> STD
    // Southern hemisphere: DST -> STD -> DST
    let is_dst = if info.dst_start_seconds <= info.dst_end_seconds {
        (info.dst_start_seconds..info.dst_end_seconds).contains(&epoch_seconds)
    } else {
        !(info.dst_end_seconds..info.dst_start_seconds).contains(&epoch_seconds)
    };

    if is_dst {
        info.dst_offset
    } else {
        info.std_offset
    }
}

/// Epoch seconds at which `transition_date` happens in `year`, given the
/// offset in effect just before it.
fn calculate_transition_seconds_for_year(
    year: i32,
    transition_date: TransitionDate,
    offset: UtcOffsetSeconds,
) -> i64 {
    let year_epoch_days = utils::epoch_days_for_year(year);
    let is_leap = utils::is_leap(year);

    // Zero-indexed day of the year.
    let days = match transition_date.day {
        // Jn: 1 <= n <= 365, February 29th is never counted.
        TransitionDay::NoLeap(day) if day > 59 => i64::from(day) - 1 + i64::from(is_leap),
        TransitionDay::NoLeap(day) => i64::from(day) - 1,
        // n: 0 <= n <= 365, February 29th is counted in leap years.
        TransitionDay::WithLeap(day) => i64::from(day),
        // Mm.w.d: day d (0 = Sunday) of week w (5 = last) of month m.
        TransitionDay::Mwd(month, week, day) => {
            let month = month.clamp(1, 12) as u8;
            let days_to_month = i64::from(utils::month_to_day(month, is_leap));
            let days_in_month = i64::from(utils::iso_days_in_month(year, month));
            let first_day_of_week =
                i64::from(utils::epoch_days_to_day_of_week(year_epoch_days + days_to_month));
            let first_match = (i64::from(day) - first_day_of_week).rem_euclid(7);
            let mut day_of_month = first_match + (i64::from(week.max(1)) - 1) * 7;
            // Week 5 means the last such weekday, which may be the fourth.
            while day_of_month >= days_in_month {
                day_of_month -= 7;
            }
            days_to_month + day_of_month
        }
    };

    // The rule's time is local wall time.
    (year_epoch_days + days) * utils::SECONDS_PER_DAY + transition_date.time.0 - offset.0
}

/// A wall clock date and time with the offset it was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub offset: UtcOffsetSeconds,
}

impl ZonedTime {
    pub fn from_epoch_seconds(epoch_seconds: i64, offset: UtcOffsetSeconds) -> Self {
        let local = epoch_seconds + offset.0;
        let (year, month, day) =
            utils::ymd_from_epoch_days(local.div_euclid(utils::SECONDS_PER_DAY));
        let seconds_in_day = local.rem_euclid(utils::SECONDS_PER_DAY);
        Self {
            year,
            month,
            day,
            hour: (seconds_in_day / 3600) as u8,
            minute: (seconds_in_day / 60 % 60) as u8,
            second: (seconds_in_day % 60) as u8,
            offset,
        }
    }
}

impl fmt::Display for ZonedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.offset
        )
    }
}
