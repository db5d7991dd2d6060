/*!
Calendar date and time types.

The central type here is [`CalendarDateTime`]: a Gregorian calendar value
with millisecond precision and a [`Tag`] that records which time line the
value lives on. A tag of [`Tag::Absolute`] means the value is a presentation
of a UTC instant, [`Tag::Wall`] means it was read off a clock in some zone
determined by context, and [`Tag::Unspecified`] means it should be
interpreted in whatever zone is currently under consideration.
*/

use crate::{
    error::{err, Error},
    instant::{
        Instant, MAX_DAYS, MAX_TICKS, TICKS_PER_DAY, TICKS_PER_HOUR,
        TICKS_PER_MILLISECOND, TICKS_PER_MINUTE, TICKS_PER_SECOND,
    },
};

/// Which time line a [`CalendarDateTime`] lives on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tag {
    /// The value is a calendar presentation of a UTC instant.
    Absolute,
    /// The value is a wall clock reading in some zone. Which zone is
    /// determined by the context the value is used in.
    Wall,
    /// The value carries no designation and is interpreted in whatever zone
    /// is under consideration.
    Unspecified,
}

/// A Gregorian calendar date and time with millisecond precision.
///
/// A `CalendarDateTime` is stored as a count of 100-nanosecond ticks since
/// 0001-01-01T00:00:00 together with a [`Tag`]. The supported range is year
/// 1 through year 9999, matching [`Instant`].
///
/// Values tagged [`Tag::Wall`] additionally carry a disambiguation bit: when
/// a conversion out of UTC lands on a wall time that is ambiguous (it occurs
/// twice because a clock was set backwards), the bit records which of the
/// two occurrences the conversion meant. The bit is only meaningful on
/// `Wall` values produced by a conversion and is ignored everywhere else.
#[derive(Clone, Copy)]
pub struct CalendarDateTime {
    ticks: i64,
    tag: Tag,
    dst_if_ambiguous: bool,
}

impl CalendarDateTime {
    /// The first representable calendar date time, 0001-01-01T00:00:00.000,
    /// with an unspecified tag.
    pub const MIN: CalendarDateTime = CalendarDateTime {
        ticks: 0,
        tag: Tag::Unspecified,
        dst_if_ambiguous: false,
    };

    /// The last representable calendar date time,
    /// 9999-12-31T23:59:59.9999999, with an unspecified tag.
    pub const MAX: CalendarDateTime = CalendarDateTime {
        ticks: MAX_TICKS,
        tag: Tag::Unspecified,
        dst_if_ambiguous: false,
    };

    /// Creates a calendar date time from its Gregorian fields.
    ///
    /// `month` is 1-based, `day` is 1-based and must exist in the given
    /// month, and `millisecond` is in `0..=999`.
    pub fn new(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
        millisecond: i16,
        tag: Tag,
    ) -> Result<CalendarDateTime, Error> {
        if !(1 <= year && year <= 9999) {
            return Err(err!(InvalidZone, "year {year} is not in 1..=9999"));
        }
        if !(1 <= month && month <= 12) {
            return Err(err!(InvalidZone, "month {month} is not in 1..=12"));
        }
        let last = days_in_month(year as i32, month as i32);
        if !(1 <= day && (day as i32) <= last) {
            return Err(err!(
                InvalidZone,
                "day {day} is not in 1..={last} for {year:04}-{month:02}",
            ));
        }
        if !(0 <= hour && hour <= 23) {
            return Err(err!(InvalidZone, "hour {hour} is not in 0..=23"));
        }
        if !(0 <= minute && minute <= 59) {
            return Err(err!(InvalidZone, "minute {minute} is not in 0..=59"));
        }
        if !(0 <= second && second <= 59) {
            return Err(err!(InvalidZone, "second {second} is not in 0..=59"));
        }
        if !(0 <= millisecond && millisecond <= 999) {
            return Err(err!(
                InvalidZone,
                "millisecond {millisecond} is not in 0..=999",
            ));
        }
        let days =
            days_from_civil(year as i32, month as i32, day as i32);
        let ticks = days * TICKS_PER_DAY
            + (hour as i64) * TICKS_PER_HOUR
            + (minute as i64) * TICKS_PER_MINUTE
            + (second as i64) * TICKS_PER_SECOND
            + (millisecond as i64) * TICKS_PER_MILLISECOND;
        Ok(CalendarDateTime { ticks, tag, dst_if_ambiguous: false })
    }

    /// Creates a calendar date time in a `const` context.
    ///
    /// # Panics
    ///
    /// When any field is out of range.
    pub const fn constant(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
        millisecond: i16,
        tag: Tag,
    ) -> CalendarDateTime {
        assert!(1 <= year && year <= 9999);
        assert!(1 <= month && month <= 12);
        assert!(1 <= day && day as i32 <= days_in_month(year as i32, month as i32));
        assert!(0 <= hour && hour <= 23);
        assert!(0 <= minute && minute <= 59);
        assert!(0 <= second && second <= 59);
        assert!(0 <= millisecond && millisecond <= 999);
        let days = days_from_civil(year as i32, month as i32, day as i32);
        let ticks = days * TICKS_PER_DAY
            + (hour as i64) * TICKS_PER_HOUR
            + (minute as i64) * TICKS_PER_MINUTE
            + (second as i64) * TICKS_PER_SECOND
            + (millisecond as i64) * TICKS_PER_MILLISECOND;
        CalendarDateTime { ticks, tag, dst_if_ambiguous: false }
    }

    /// Creates a calendar date time from a raw tick count.
    pub fn from_ticks(ticks: i64, tag: Tag) -> Result<CalendarDateTime, Error> {
        if !(0 <= ticks && ticks <= MAX_TICKS) {
            return Err(err!(
                InvalidZone,
                "tick count {ticks} is outside the supported calendar range",
            ));
        }
        Ok(CalendarDateTime { ticks, tag, dst_if_ambiguous: false })
    }

    /// Returns the calendar presentation of the given instant, with the
    /// given tag.
    pub fn from_instant(instant: Instant, tag: Tag) -> CalendarDateTime {
        CalendarDateTime {
            ticks: instant.ticks(),
            tag,
            dst_if_ambiguous: false,
        }
    }

    /// Reinterprets an `Absolute` tagged value as the UTC instant it
    /// presents.
    ///
    /// This returns an error for `Wall` and `Unspecified` values, since
    /// those do not identify a point on the UTC time line without a zone.
    pub fn to_instant(self) -> Result<Instant, Error> {
        if self.tag != Tag::Absolute {
            return Err(err!(
                TagMismatch,
                "only a time tagged as absolute identifies an instant \
                 without a zone, but this one is tagged {:?}",
                self.tag,
            ));
        }
        Instant::from_ticks(self.ticks)
    }

    /// Returns the raw tick count of this value.
    pub fn ticks(self) -> i64 {
        self.ticks
    }

    /// Returns the tag of this value.
    pub fn tag(self) -> Tag {
        self.tag
    }

    /// Returns this value with the given tag. The disambiguation bit is
    /// cleared.
    pub fn with_tag(self, tag: Tag) -> CalendarDateTime {
        CalendarDateTime { ticks: self.ticks, tag, dst_if_ambiguous: false }
    }

    /// Returns this value with the disambiguation bit set as given.
    pub(crate) fn with_dst_if_ambiguous(
        self,
        dst_if_ambiguous: bool,
    ) -> CalendarDateTime {
        CalendarDateTime { dst_if_ambiguous, ..self }
    }

    /// Returns the recorded disambiguation bit. Only meaningful on `Wall`
    /// values produced by a conversion.
    pub fn is_dst_if_ambiguous(self) -> bool {
        self.dst_if_ambiguous
    }

    /// Returns the year, in `1..=9999`.
    pub fn year(self) -> i16 {
        self.civil().0
    }

    /// Returns the month, in `1..=12`.
    pub fn month(self) -> i8 {
        self.civil().1
    }

    /// Returns the day of the month, in `1..=31`.
    pub fn day(self) -> i8 {
        self.civil().2
    }

    /// Returns the hour, in `0..=23`.
    pub fn hour(self) -> i8 {
        ((self.ticks % TICKS_PER_DAY) / TICKS_PER_HOUR) as i8
    }

    /// Returns the minute, in `0..=59`.
    pub fn minute(self) -> i8 {
        ((self.ticks % TICKS_PER_HOUR) / TICKS_PER_MINUTE) as i8
    }

    /// Returns the second, in `0..=59`.
    pub fn second(self) -> i8 {
        ((self.ticks % TICKS_PER_MINUTE) / TICKS_PER_SECOND) as i8
    }

    /// Returns the millisecond, in `0..=999`.
    pub fn millisecond(self) -> i16 {
        ((self.ticks % TICKS_PER_SECOND) / TICKS_PER_MILLISECOND) as i16
    }

    /// Returns the day of the week, with `0` corresponding to Sunday.
    pub fn day_of_week(self) -> i8 {
        // 0001-01-01 was a Monday.
        ((self.ticks / TICKS_PER_DAY + 1) % 7) as i8
    }

    /// Returns this value truncated to midnight, keeping the tag.
    pub fn date(self) -> CalendarDateTime {
        CalendarDateTime {
            ticks: self.ticks - self.ticks % TICKS_PER_DAY,
            tag: self.tag,
            dst_if_ambiguous: false,
        }
    }

    /// Returns the ticks elapsed since midnight of this value's day.
    pub fn time_of_day_ticks(self) -> i64 {
        self.ticks % TICKS_PER_DAY
    }

    /// Adds the given number of ticks, returning an error when the result
    /// falls outside the supported range. The tag is preserved.
    pub fn checked_add_ticks(
        self,
        ticks: i64,
    ) -> Result<CalendarDateTime, Error> {
        let sum = self.ticks.checked_add(ticks).ok_or_else(|| {
            err!(InvalidZone, "tick arithmetic overflowed i64")
        })?;
        let mut dt = CalendarDateTime::from_ticks(sum, self.tag)?;
        dt.dst_if_ambiguous = self.dst_if_ambiguous;
        Ok(dt)
    }

    /// Adds the given number of ticks, clamping the result to the supported
    /// range. The tag is preserved.
    pub fn saturating_add_ticks(self, ticks: i64) -> CalendarDateTime {
        let sum = self.ticks.saturating_add(ticks).clamp(0, MAX_TICKS);
        CalendarDateTime {
            ticks: sum,
            tag: self.tag,
            dst_if_ambiguous: self.dst_if_ambiguous,
        }
    }

    /// Adds the given number of years, keeping month, day and time of day.
    /// February 29 clamps to February 28 in a non-leap target year.
    pub fn add_years(self, years: i32) -> Result<CalendarDateTime, Error> {
        let (year, month, day) = self.civil();
        let year = (year as i32) + years;
        if !(1 <= year && year <= 9999) {
            return Err(err!(
                InvalidZone,
                "year {year} is not in 1..=9999 after adding {years} years",
            ));
        }
        let day = (day as i32).min(days_in_month(year, month as i32));
        let days = days_from_civil(year, month as i32, day);
        Ok(CalendarDateTime {
            ticks: days * TICKS_PER_DAY + self.time_of_day_ticks(),
            tag: self.tag,
            dst_if_ambiguous: self.dst_if_ambiguous,
        })
    }

    fn civil(self) -> (i16, i8, i8) {
        civil_from_days(self.ticks / TICKS_PER_DAY)
    }
}

/// Equality and ordering compare the tick count only. The tag is a
/// designation, not part of the value's position on its time line.
impl Eq for CalendarDateTime {}

impl PartialEq for CalendarDateTime {
    fn eq(&self, rhs: &CalendarDateTime) -> bool {
        self.ticks == rhs.ticks
    }
}

impl Ord for CalendarDateTime {
    fn cmp(&self, rhs: &CalendarDateTime) -> core::cmp::Ordering {
        self.ticks.cmp(&rhs.ticks)
    }
}

impl PartialOrd for CalendarDateTime {
    fn partial_cmp(
        &self,
        rhs: &CalendarDateTime,
    ) -> Option<core::cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}

impl core::hash::Hash for CalendarDateTime {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.ticks.hash(state);
    }
}

impl core::fmt::Debug for CalendarDateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let (year, month, day) = self.civil();
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second(),
        )?;
        let sub = self.ticks % TICKS_PER_SECOND;
        if sub != 0 {
            write!(f, ".{sub:07}")?;
        }
        Ok(())
    }
}

/// Returns true when the given year is a leap year in the proleptic
/// Gregorian calendar.
pub(crate) const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns the number of days in the given month of the given year.
pub(crate) const fn days_in_month(year: i32, month: i32) -> i32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// Returns the number of days from 0001-01-01 to the given date.
///
/// This is the classic era-based conversion: years are shifted so they start
/// in March, making the leap day the last day of the shifted year.
pub(crate) const fn days_from_civil(year: i32, month: i32, day: i32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year.rem_euclid(400);
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    // The era math above is relative to 0000-03-01; shift to 0001-01-01.
    (era as i64) * 146_097 + (doe as i64) - 306
}

/// The inverse of [`days_from_civil`].
pub(crate) fn civil_from_days(days: i64) -> (i16, i8, i8) {
    debug_assert!((0..MAX_DAYS).contains(&days));
    let days = days + 306;
    let era = days.div_euclid(146_097);
    let doe = days.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year as i16, month as i8, day as i8)
}

#[cfg(test)]
impl quickcheck::Arbitrary for CalendarDateTime {
    fn arbitrary(g: &mut quickcheck::Gen) -> CalendarDateTime {
        let year = i16::arbitrary(g).rem_euclid(9999) + 1;
        let month = i8::arbitrary(g).rem_euclid(12) + 1;
        let last = days_in_month(year as i32, month as i32) as i8;
        let day = i8::arbitrary(g).rem_euclid(last) + 1;
        let hour = i8::arbitrary(g).rem_euclid(24);
        let minute = i8::arbitrary(g).rem_euclid(60);
        let second = i8::arbitrary(g).rem_euclid(60);
        let millisecond = i16::arbitrary(g).rem_euclid(1000);
        CalendarDateTime::new(
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
            Tag::Unspecified,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use crate::instant::DAYS_TO_UNIX_EPOCH;

    use super::*;

    #[test]
    fn epoch_days() {
        assert_eq!(days_from_civil(1, 1, 1), 0);
        assert_eq!(days_from_civil(1, 1, 2), 1);
        assert_eq!(days_from_civil(2, 1, 1), 365);
        assert_eq!(days_from_civil(1970, 1, 1), DAYS_TO_UNIX_EPOCH);
        assert_eq!(days_from_civil(9999, 12, 31), MAX_DAYS - 1);
    }

    #[test]
    fn civil_round_trip_samples() {
        for &(y, m, d) in &[
            (1i16, 1i8, 1i8),
            (1600, 2, 29),
            (1900, 2, 28),
            (1970, 1, 1),
            (2000, 2, 29),
            (2007, 3, 11),
            (2024, 12, 31),
            (9999, 12, 31),
        ] {
            let days = days_from_civil(y as i32, m as i32, d as i32);
            assert_eq!(civil_from_days(days), (y, m, d), "{y}-{m}-{d}");
        }
    }

    #[test]
    fn weekday() {
        // 0001-01-01 was a Monday.
        assert_eq!(CalendarDateTime::MIN.day_of_week(), 1);
        // 2024-03-10 was a Sunday.
        let dt = CalendarDateTime::constant(
            2024,
            3,
            10,
            0,
            0,
            0,
            0,
            Tag::Unspecified,
        );
        assert_eq!(dt.day_of_week(), 0);
        // 2007-11-04 was a Sunday.
        let dt = CalendarDateTime::constant(
            2007,
            11,
            4,
            12,
            0,
            0,
            0,
            Tag::Unspecified,
        );
        assert_eq!(dt.day_of_week(), 0);
    }

    #[test]
    fn accessors() {
        let dt = CalendarDateTime::new(
            2024,
            3,
            10,
            2,
            30,
            15,
            250,
            Tag::Wall,
        )
        .unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 10);
        assert_eq!(dt.hour(), 2);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 15);
        assert_eq!(dt.millisecond(), 250);
        assert_eq!(dt.tag(), Tag::Wall);
    }

    #[test]
    fn new_rejects_bad_fields() {
        assert!(CalendarDateTime::new(0, 1, 1, 0, 0, 0, 0, Tag::Wall)
            .is_err());
        assert!(CalendarDateTime::new(2023, 2, 29, 0, 0, 0, 0, Tag::Wall)
            .is_err());
        assert!(CalendarDateTime::new(2023, 13, 1, 0, 0, 0, 0, Tag::Wall)
            .is_err());
        assert!(CalendarDateTime::new(2023, 1, 1, 24, 0, 0, 0, Tag::Wall)
            .is_err());
    }

    #[test]
    fn add_years_clamps_leap_day() {
        let dt = CalendarDateTime::constant(
            2024,
            2,
            29,
            12,
            0,
            0,
            0,
            Tag::Unspecified,
        );
        let shifted = dt.add_years(1).unwrap();
        assert_eq!(
            (shifted.year(), shifted.month(), shifted.day()),
            (2025, 2, 28)
        );
        assert_eq!(shifted.hour(), 12);
    }

    #[test]
    fn date_truncates() {
        let dt = CalendarDateTime::constant(
            2024,
            6,
            1,
            23,
            59,
            59,
            999,
            Tag::Unspecified,
        );
        let date = dt.date();
        assert_eq!(date.time_of_day_ticks(), 0);
        assert_eq!((date.year(), date.month(), date.day()), (2024, 6, 1));
    }

    quickcheck::quickcheck! {
        fn prop_ticks_round_trip(dt: CalendarDateTime) -> bool {
            let rebuilt = CalendarDateTime::new(
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.millisecond(),
                dt.tag(),
            ).unwrap();
            rebuilt.ticks() == dt.ticks()
        }

        fn prop_civil_inverse(days: u32) -> bool {
            let days = i64::from(days) % MAX_DAYS;
            let (y, m, d) = civil_from_days(days);
            days_from_civil(y as i32, m as i32, d as i32) == days
        }
    }
}
