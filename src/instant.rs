use crate::error::{err, Error};

/// The number of 100-nanosecond ticks in one millisecond.
pub(crate) const TICKS_PER_MILLISECOND: i64 = 10_000;
/// The number of 100-nanosecond ticks in one second.
pub(crate) const TICKS_PER_SECOND: i64 = 10_000_000;
/// The number of 100-nanosecond ticks in one minute.
pub(crate) const TICKS_PER_MINUTE: i64 = 600_000_000;
/// The number of 100-nanosecond ticks in one hour.
pub(crate) const TICKS_PER_HOUR: i64 = 36_000_000_000;
/// The number of 100-nanosecond ticks in one day.
pub(crate) const TICKS_PER_DAY: i64 = 864_000_000_000;

/// The number of days from 0001-01-01 to 1970-01-01.
pub(crate) const DAYS_TO_UNIX_EPOCH: i64 = 719_162;

/// The number of whole days in the supported range, 0001-01-01 through
/// 9999-12-31.
pub(crate) const MAX_DAYS: i64 = 3_652_059;

/// The tick count of the last representable instant,
/// 9999-12-31T23:59:59.9999999.
pub(crate) const MAX_TICKS: i64 = MAX_DAYS * TICKS_PER_DAY - 1;

/// An absolute point on the UTC time line.
///
/// An instant is represented as a signed count of 100-nanosecond ticks since
/// 0001-01-01T00:00:00 UTC. The supported range is
/// `0001-01-01T00:00:00.0000000` through `9999-12-31T23:59:59.9999999`,
/// i.e. [`Instant::MIN`] through [`Instant::MAX`].
///
/// Instants are totally ordered and cheap to copy. An instant knows nothing
/// about calendars or time zones; use
/// [`CalendarDateTime`](crate::civil::CalendarDateTime) for the calendar
/// presentation of an instant and [`Zone`](crate::tz::Zone) to map between
/// the two.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    ticks: i64,
}

impl Instant {
    /// The first representable instant: 0001-01-01T00:00:00 UTC.
    pub const MIN: Instant = Instant { ticks: 0 };

    /// The last representable instant: 9999-12-31T23:59:59.9999999 UTC.
    pub const MAX: Instant = Instant { ticks: MAX_TICKS };

    /// Creates an instant from a raw tick count.
    ///
    /// This returns an error when the tick count is outside the supported
    /// range.
    pub fn from_ticks(ticks: i64) -> Result<Instant, Error> {
        if !(0 <= ticks && ticks <= MAX_TICKS) {
            return Err(err!(
                InvalidZone,
                "tick count {ticks} is outside the supported range \
                 0..={MAX_TICKS}",
            ));
        }
        Ok(Instant { ticks })
    }

    /// Creates an instant from a raw tick count in a `const` context.
    ///
    /// # Panics
    ///
    /// When the tick count is outside the supported range.
    pub const fn constant(ticks: i64) -> Instant {
        assert!(0 <= ticks && ticks <= MAX_TICKS);
        Instant { ticks }
    }

    /// Returns the current instant.
    ///
    /// # Panics
    ///
    /// This panics if the system clock reports a time before the Unix epoch
    /// or after year 9999. It is reasonable to expect the system clock to be
    /// set to a somewhat sane value.
    pub fn now() -> Instant {
        use std::time::{SystemTime, UNIX_EPOCH};

        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is set before the Unix epoch");
        let ticks = DAYS_TO_UNIX_EPOCH * TICKS_PER_DAY
            + (dur.as_secs() as i64) * TICKS_PER_SECOND
            + (dur.subsec_nanos() as i64) / 100;
        Instant::from_ticks(ticks)
            .expect("system clock reports a supported year")
    }

    /// Returns the raw tick count of this instant.
    pub fn ticks(self) -> i64 {
        self.ticks
    }

    /// Adds the given number of ticks, returning `None` on overflow of the
    /// supported range.
    pub fn checked_add_ticks(self, ticks: i64) -> Option<Instant> {
        let sum = self.ticks.checked_add(ticks)?;
        Instant::from_ticks(sum).ok()
    }

    /// Adds the given number of ticks, clamping the result to the supported
    /// range.
    pub fn saturating_add_ticks(self, ticks: i64) -> Instant {
        let sum = self.ticks.saturating_add(ticks);
        Instant { ticks: sum.clamp(0, MAX_TICKS) }
    }
}

impl core::fmt::Debug for Instant {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use crate::civil::{CalendarDateTime, Tag};

        let dt = CalendarDateTime::from_ticks(self.ticks, Tag::Absolute)
            .expect("instant ticks are in range for a calendar date time");
        write!(f, "{dt:?}Z")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_constants() {
        assert_eq!(Instant::MIN.ticks(), 0);
        assert_eq!(Instant::MAX.ticks(), 3_155_378_975_999_999_999);
    }

    #[test]
    fn from_ticks_rejects_out_of_range() {
        assert!(Instant::from_ticks(-1).is_err());
        assert!(Instant::from_ticks(MAX_TICKS + 1).is_err());
        assert!(Instant::from_ticks(MAX_TICKS).is_ok());
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(Instant::MAX.saturating_add_ticks(1), Instant::MAX);
        assert_eq!(Instant::MIN.saturating_add_ticks(-1), Instant::MIN);
        assert_eq!(
            Instant::MIN.saturating_add_ticks(TICKS_PER_DAY).ticks(),
            TICKS_PER_DAY
        );
    }

    #[test]
    fn unix_epoch_offset() {
        let epoch = DAYS_TO_UNIX_EPOCH * TICKS_PER_DAY;
        let inst = Instant::from_ticks(epoch).unwrap();
        assert_eq!(format!("{inst:?}"), "1970-01-01T00:00:00Z");
        assert_eq!(format!("{:?}", Instant::MIN), "0001-01-01T00:00:00Z");
        assert_eq!(
            format!("{:?}", Instant::MAX),
            "9999-12-31T23:59:59.9999999Z"
        );
    }
}
