use crate::{
    error::{err, Error},
    instant::TICKS_PER_MINUTE,
};

/// An enum indicating whether a particular datetime or instant is in DST or
/// not.
///
/// DST stands for "daylight saving time." It is a label applied to points in
/// time as a way to contrast them with "standard time." DST is usually, but
/// not always, one hour ahead of standard time, and when it takes effect is
/// determined by the rule set of the zone in question.
///
/// This type has a `From<bool>` trait implementation, where the bool is
/// interpreted as being `true` when DST is active.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Dst {
    /// DST is not in effect. In other words, standard time is in effect.
    No,
    /// DST is in effect.
    Yes,
}

impl Dst {
    /// Returns true when this value is equal to `Dst::Yes`.
    pub fn is_dst(self) -> bool {
        matches!(self, Dst::Yes)
    }

    /// Returns true when this value is equal to `Dst::No`.
    pub fn is_std(self) -> bool {
        matches!(self, Dst::No)
    }
}

impl From<bool> for Dst {
    fn from(is_dst: bool) -> Dst {
        if is_dst {
            Dst::Yes
        } else {
            Dst::No
        }
    }
}

/// A time zone offset, as a signed whole number of minutes from UTC.
///
/// Negative offsets correspond to time zones west of the prime meridian,
/// while positive offsets correspond to time zones east of the prime
/// meridian. Equivalently, in all cases, `wall-time - offset = UTC`.
///
/// The type itself admits any whole-minute value in `-23:59..=23:59` so
/// that rule deltas can be composed freely; a zone's *base* offset is
/// restricted to `-14:00..=14:00` when the zone is constructed. Seconds are
/// unrepresentable by design: second-level history must be reduced to whole
/// minutes with [`Offset::from_seconds_truncated`].
///
/// # Display format
///
/// This type implements the `std::fmt::Display` trait. It renders offsets
/// in the form `{sign}{hours}:{minutes}`, e.g. `-08:00` and `+05:30`.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Offset {
    minutes: i32,
}

impl Offset {
    /// The minimum possible offset value, `-23:59`.
    pub const MIN: Offset = Offset { minutes: -(24 * 60 - 1) };

    /// The maximum possible offset value, `+23:59`.
    pub const MAX: Offset = Offset { minutes: 24 * 60 - 1 };

    /// The offset corresponding to UTC. That is, no offset at all.
    pub const UTC: Offset = Offset { minutes: 0 };

    /// The offset corresponding to no offset at all.
    ///
    /// This is always equivalent to `Offset::UTC`, but it is semantically
    /// distinct: use it when expressing "no adjustment," e.g. as the
    /// identity when summing deltas.
    pub const ZERO: Offset = Offset { minutes: 0 };

    /// The largest magnitude allowed for a zone's base offset, `14:00`.
    pub(crate) const BASE_MAX_MINUTES: i32 = 14 * 60;

    /// Creates a new offset in a `const` context from a given number of
    /// hours.
    ///
    /// # Panics
    ///
    /// When the given number of hours is out of range. `hours` must be in
    /// the range `-23..=23`.
    pub const fn constant(hours: i32) -> Offset {
        assert!(-23 <= hours && hours <= 23);
        Offset { minutes: hours * 60 }
    }

    /// Creates a new offset from a number of minutes.
    pub fn from_minutes(minutes: i32) -> Result<Offset, Error> {
        if !(Offset::MIN.minutes <= minutes && minutes <= Offset::MAX.minutes)
        {
            return Err(err!(
                InvalidZone,
                "offset of {minutes} minutes is not in \
                 {min}..={max}",
                min = Offset::MIN.minutes,
                max = Offset::MAX.minutes,
            ));
        }
        Ok(Offset { minutes })
    }

    /// Creates a new offset from a number of minutes in a `const` context.
    ///
    /// # Panics
    ///
    /// When the given number of minutes is out of range.
    pub const fn constant_minutes(minutes: i32) -> Offset {
        assert!(
            Offset::MIN.minutes <= minutes && minutes <= Offset::MAX.minutes
        );
        Offset { minutes }
    }

    /// Creates a new offset from a number of seconds, discarding the
    /// seconds component.
    ///
    /// Both rule decoders use this to reduce second-level history (for
    /// example pre-standardization local mean time) to the whole minutes
    /// this crate works in. Truncation is toward zero: `-3601` seconds
    /// becomes `-01:00`.
    pub fn from_seconds_truncated(seconds: i64) -> Result<Offset, Error> {
        let minutes = seconds / 60;
        let minutes = i32::try_from(minutes).map_err(|_| {
            err!(InvalidZone, "offset of {seconds} seconds overflows minutes")
        })?;
        Offset::from_minutes(minutes)
    }

    /// Returns this offset as a signed number of minutes.
    pub fn minutes(self) -> i32 {
        self.minutes
    }

    /// Returns this offset as a signed number of 100-nanosecond ticks.
    pub fn ticks(self) -> i64 {
        (self.minutes as i64) * TICKS_PER_MINUTE
    }

    /// Returns true when this offset is zero.
    pub fn is_zero(self) -> bool {
        self.minutes == 0
    }

    /// Returns true when this offset is strictly positive.
    pub fn is_positive(self) -> bool {
        self.minutes > 0
    }

    /// Returns true when this offset is strictly negative.
    pub fn is_negative(self) -> bool {
        self.minutes < 0
    }

    /// Returns the negation of this offset.
    pub fn negate(self) -> Offset {
        Offset { minutes: -self.minutes }
    }

    /// Returns true when this value is a legal base offset for a zone:
    /// within `-14:00..=14:00`.
    pub(crate) fn is_valid_base(self) -> bool {
        -Offset::BASE_MAX_MINUTES <= self.minutes
            && self.minutes <= Offset::BASE_MAX_MINUTES
    }

    /// Sums offsets without range checking. Rule evaluation composes a base
    /// offset with up to two deltas; the arithmetic range of `i32` minutes
    /// is far wider than anything that composition can produce.
    pub(crate) fn unchecked_add(self, rhs: Offset) -> Offset {
        Offset { minutes: self.minutes + rhs.minutes }
    }

    pub(crate) fn unchecked_sub(self, rhs: Offset) -> Offset {
        Offset { minutes: self.minutes - rhs.minutes }
    }
}

impl core::fmt::Display for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let minutes = self.minutes.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

impl core::fmt::Debug for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Offset({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Offset::constant(-8).to_string(), "-08:00");
        assert_eq!(Offset::constant_minutes(330).to_string(), "+05:30");
        assert_eq!(Offset::UTC.to_string(), "+00:00");
        assert_eq!(Offset::MIN.to_string(), "-23:59");
        assert_eq!(Offset::MAX.to_string(), "+23:59");
    }

    #[test]
    fn from_minutes_range() {
        assert!(Offset::from_minutes(24 * 60).is_err());
        assert!(Offset::from_minutes(-(24 * 60)).is_err());
        assert!(Offset::from_minutes(24 * 60 - 1).is_ok());
    }

    #[test]
    fn seconds_truncate_toward_zero() {
        // Amsterdam's pre-1937 local mean time was +00:19:32.
        let off = Offset::from_seconds_truncated(19 * 60 + 32).unwrap();
        assert_eq!(off.minutes(), 19);
        let off = Offset::from_seconds_truncated(-(19 * 60 + 32)).unwrap();
        assert_eq!(off.minutes(), -19);
        let off = Offset::from_seconds_truncated(-3601).unwrap();
        assert_eq!(off.minutes(), -60);
    }

    #[test]
    fn base_validity() {
        assert!(Offset::constant(14).is_valid_base());
        assert!(Offset::constant(-14).is_valid_base());
        assert!(!Offset::constant_minutes(14 * 60 + 1).is_valid_base());
    }

    #[test]
    fn dst_from_bool() {
        assert!(Dst::from(true).is_dst());
        assert!(Dst::from(false).is_std());
    }
}
