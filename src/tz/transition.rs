use crate::{
    civil::{days_in_month, CalendarDateTime, Tag},
    error::{err, Error},
    instant::{TICKS_PER_DAY, TICKS_PER_MILLISECOND},
};

/// One boundary of a yearly daylight saving window.
///
/// A transition time comes in two shapes. A *fixed date* rule names a month
/// and a day of the month ("April 1"). A *floating* rule names a month, a
/// week ordinal and a weekday ("the second Sunday of March"), where week `5`
/// means "the last occurrence of that weekday in the month." Both carry a
/// time of day with millisecond precision.
///
/// A transition time is a yearly pattern, not a point in time; rule
/// evaluation materializes it against a concrete year.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct TransitionTime {
    time_of_day: CalendarDateTime,
    month: i8,
    week: i8,
    day: i8,
    day_of_week: i8,
    is_fixed_date: bool,
}

impl TransitionTime {
    /// Creates a fixed date transition.
    ///
    /// `time_of_day` must have its date at 0001-01-01 and carry nothing
    /// finer than milliseconds. `month` is `1..=12` and `day` is `1..=31`;
    /// when a year's month is shorter than `day`, materialization clamps to
    /// the last day of that month.
    pub fn fixed(
        time_of_day: CalendarDateTime,
        month: i8,
        day: i8,
    ) -> Result<TransitionTime, Error> {
        validate_time_of_day(time_of_day)?;
        if !(1 <= month && month <= 12) {
            return Err(err!(
                InvalidZone,
                "transition month {month} is not in 1..=12",
            ));
        }
        if !(1 <= day && day <= 31) {
            return Err(err!(
                InvalidZone,
                "transition day {day} is not in 1..=31",
            ));
        }
        Ok(TransitionTime {
            time_of_day,
            month,
            week: 1,
            day,
            day_of_week: 0,
            is_fixed_date: true,
        })
    }

    /// Creates a floating (weekday-of-week-of-month) transition.
    ///
    /// `week` is `1..=5` with `5` meaning "last occurrence," and
    /// `day_of_week` is `0..=6` with `0` corresponding to Sunday.
    pub fn floating(
        time_of_day: CalendarDateTime,
        month: i8,
        week: i8,
        day_of_week: i8,
    ) -> Result<TransitionTime, Error> {
        validate_time_of_day(time_of_day)?;
        if !(1 <= month && month <= 12) {
            return Err(err!(
                InvalidZone,
                "transition month {month} is not in 1..=12",
            ));
        }
        if !(1 <= week && week <= 5) {
            return Err(err!(
                InvalidZone,
                "transition week {week} is not in 1..=5",
            ));
        }
        if !(0 <= day_of_week && day_of_week <= 6) {
            return Err(err!(
                InvalidZone,
                "transition weekday {day_of_week} is not in 0..=6",
            ));
        }
        Ok(TransitionTime {
            time_of_day,
            month,
            week,
            day: 1,
            day_of_week,
            is_fixed_date: false,
        })
    }

    /// The carried-but-unused start transition of a rule that has no yearly
    /// transitions: midnight, January 1.
    pub(crate) fn unused_start() -> TransitionTime {
        TransitionTime {
            time_of_day: CalendarDateTime::MIN,
            month: 1,
            week: 1,
            day: 1,
            day_of_week: 0,
            is_fixed_date: true,
        }
    }

    /// The carried-but-unused end transition of a rule that has no yearly
    /// transitions: 00:00:00.001, January 1. The one millisecond is what
    /// distinguishes an unused end from an unused start in the
    /// daylight-saving predicate.
    pub(crate) fn unused_end() -> TransitionTime {
        TransitionTime {
            time_of_day: CalendarDateTime::MIN
                .saturating_add_ticks(TICKS_PER_MILLISECOND),
            month: 1,
            week: 1,
            day: 1,
            day_of_week: 0,
            is_fixed_date: true,
        }
    }

    /// A start transition of 00:00:00.002, January 1, carried by
    /// daylight-typed rules without yearly transitions so that the
    /// daylight-saving predicate stays true even when the daylight delta is
    /// zero. The two milliseconds keep it distinct from both unused shapes.
    pub(crate) fn dst_sentinel() -> TransitionTime {
        TransitionTime {
            time_of_day: CalendarDateTime::MIN
                .saturating_add_ticks(2 * TICKS_PER_MILLISECOND),
            month: 1,
            week: 1,
            day: 1,
            day_of_week: 0,
            is_fixed_date: true,
        }
    }

    /// Returns the time of day of this transition. Its date fields are
    /// always 0001-01-01.
    pub fn time_of_day(&self) -> CalendarDateTime {
        self.time_of_day
    }

    /// Returns the month this transition occurs in, `1..=12`.
    pub fn month(&self) -> i8 {
        self.month
    }

    /// Returns the week ordinal for a floating transition, `1..=5`.
    pub fn week(&self) -> i8 {
        self.week
    }

    /// Returns the day of the month for a fixed date transition, `1..=31`.
    pub fn day(&self) -> i8 {
        self.day
    }

    /// Returns the weekday for a floating transition, `0..=6` with `0`
    /// corresponding to Sunday.
    pub fn day_of_week(&self) -> i8 {
        self.day_of_week
    }

    /// Returns true for a fixed date transition and false for a floating
    /// one.
    pub fn is_fixed_date(&self) -> bool {
        self.is_fixed_date
    }

    /// Materializes this transition for the given year, as an untagged wall
    /// clock value.
    ///
    /// For a fixed date rule the day clamps to the length of the month in
    /// that year. For a floating rule with week `1..=4`, the result is the
    /// `week`th occurrence of the weekday counted from the start of the
    /// month; week `5` walks backward from the last day of the month to the
    /// last occurrence.
    pub(crate) fn to_wall(&self, year: i32) -> CalendarDateTime {
        let month = self.month as i32;
        let last = days_in_month(year, month);
        let day = if self.is_fixed_date {
            (self.day as i32).min(last)
        } else if self.week <= 4 {
            let first = wall_date(year, month, 1);
            let mut delta = (self.day_of_week - first.day_of_week()) as i32;
            if delta < 0 {
                delta += 7;
            }
            delta += 7 * (self.week as i32 - 1);
            // The fifth-and-beyond occurrence of a weekday does not exist in
            // every month; weeks 1..=4 always do.
            1 + delta
        } else {
            let last_day = wall_date(year, month, last);
            let mut delta = (last_day.day_of_week() - self.day_of_week) as i32;
            if delta < 0 {
                delta += 7;
            }
            last - delta
        };
        wall_date(year, month, day)
            .saturating_add_ticks(self.time_of_day_ticks())
    }

    /// The time of day as ticks since midnight.
    ///
    /// The time-of-day value of a transition parsed from an extended-future
    /// string may sit on January 2 rather than January 1 (the day-overflow
    /// sentinel); the extra day is part of the materialized result.
    fn time_of_day_ticks(&self) -> i64 {
        self.time_of_day.ticks()
    }
}

impl core::fmt::Debug for TransitionTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.is_fixed_date {
            write!(
                f,
                "TransitionTime(month={}, day={}, at {:?})",
                self.month, self.day, self.time_of_day,
            )
        } else {
            write!(
                f,
                "TransitionTime(month={}, week={}, weekday={}, at {:?})",
                self.month, self.week, self.day_of_week, self.time_of_day,
            )
        }
    }
}

fn validate_time_of_day(time_of_day: CalendarDateTime) -> Result<(), Error> {
    // The date portion may extend one day past 0001-01-01 to leave room for
    // the day-overflow sentinel of extended-future rules.
    if time_of_day.ticks() >= 2 * TICKS_PER_DAY {
        return Err(err!(
            InvalidZone,
            "transition time of day must have its date at 0001-01-01, \
             but got {time_of_day:?}",
        ));
    }
    if time_of_day.ticks() % TICKS_PER_MILLISECOND != 0 {
        return Err(err!(
            InvalidZone,
            "transition time of day must have no precision finer than \
             milliseconds, but got {time_of_day:?}",
        ));
    }
    Ok(())
}

fn wall_date(year: i32, month: i32, day: i32) -> CalendarDateTime {
    CalendarDateTime::new(
        year as i16,
        month as i8,
        day as i8,
        0,
        0,
        0,
        0,
        Tag::Unspecified,
    )
    .expect("materialized transition date is always in range")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: i8, minute: i8) -> CalendarDateTime {
        CalendarDateTime::new(1, 1, 1, hour, minute, 0, 0, Tag::Unspecified)
            .unwrap()
    }

    #[test]
    fn floating_second_sunday_of_march() {
        // United States DST start: second Sunday in March at 02:00.
        let tt = TransitionTime::floating(at(2, 0), 3, 2, 0).unwrap();
        let wall = tt.to_wall(2007);
        assert_eq!(
            (wall.year(), wall.month(), wall.day(), wall.hour()),
            (2007, 3, 11, 2)
        );
        let wall = tt.to_wall(2024);
        assert_eq!((wall.month(), wall.day()), (3, 10));
    }

    #[test]
    fn floating_first_sunday_of_november() {
        let tt = TransitionTime::floating(at(2, 0), 11, 1, 0).unwrap();
        let wall = tt.to_wall(2007);
        assert_eq!((wall.month(), wall.day()), (11, 4));
    }

    #[test]
    fn floating_last_sunday_of_october() {
        // European DST end: last Sunday in October.
        let tt = TransitionTime::floating(at(3, 0), 10, 5, 0).unwrap();
        let wall = tt.to_wall(2024);
        assert_eq!((wall.month(), wall.day()), (10, 27));
        let wall = tt.to_wall(2021);
        assert_eq!((wall.month(), wall.day()), (10, 31));
    }

    #[test]
    fn fixed_day_clamps_to_month_length() {
        let tt = TransitionTime::fixed(at(0, 0), 2, 30).unwrap();
        let wall = tt.to_wall(2023);
        assert_eq!((wall.month(), wall.day()), (2, 28));
        let wall = tt.to_wall(2024);
        assert_eq!((wall.month(), wall.day()), (2, 29));
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(TransitionTime::fixed(at(0, 0), 13, 1).is_err());
        assert!(TransitionTime::fixed(at(0, 0), 0, 1).is_err());
        assert!(TransitionTime::floating(at(0, 0), 3, 6, 0).is_err());
        assert!(TransitionTime::floating(at(0, 0), 3, 1, 7).is_err());
        // A time of day on the wrong date is rejected.
        let not_day_one = CalendarDateTime::new(
            2024,
            1,
            1,
            2,
            0,
            0,
            0,
            Tag::Unspecified,
        )
        .unwrap();
        assert!(TransitionTime::floating(not_day_one, 3, 1, 0).is_err());
    }

    #[test]
    fn sentinels_are_distinct() {
        assert_ne!(TransitionTime::unused_start(), TransitionTime::unused_end());
        assert_ne!(TransitionTime::unused_start(), TransitionTime::dst_sentinel());
        assert_ne!(TransitionTime::unused_end(), TransitionTime::dst_sentinel());
    }
}
