/*!
A parser for the extended-future string found at the end of version 2 and 3
binary zone files.

The string uses the POSIX `TZ` rule syntax:

```text
std offset [dst [offset] [,start[/time],end[/time]]]
```

and describes how the zone behaves after its last recorded transition. The
parser produces a single tail [`AdjustmentRule`] covering everything from
that transition to the end of representable time.
*/

use crate::{
    civil::{CalendarDateTime, Tag},
    error::{err, Error},
    instant::{TICKS_PER_DAY, TICKS_PER_SECOND},
    tz::{AdjustmentRule, Offset, TransitionTime},
    util::escape::{Byte, Bytes},
};

/// Parses the extended-future string into the tail rule of a zone.
///
/// `start_date` is the instant of the zone's last recorded transition and
/// becomes the start of the produced rule's window. `zone_base` is the
/// zone's base offset; the rule's deltas are expressed relative to it.
pub(crate) fn parse_tail_rule(
    bytes: &[u8],
    start_date: CalendarDateTime,
    zone_base: Offset,
) -> Result<AdjustmentRule, Error> {
    let parser = Parser::new(bytes);
    let tz = parser.parse()?;
    tz.into_rule(start_date, zone_base)
}

/// The parsed pieces of an extended-future string.
#[derive(Debug)]
struct PosixTz {
    #[allow(dead_code)] // names are display-only and currently unused
    std_name: String,
    /// Seconds east of UTC, sign already flipped from POSIX convention.
    std_offset_seconds: i64,
    dst: Option<PosixDst>,
}

#[derive(Debug)]
struct PosixDst {
    #[allow(dead_code)]
    name: String,
    /// Seconds east of UTC, sign already flipped; `None` when the string
    /// leaves the daylight offset implicit (one hour ahead of standard).
    offset_seconds: Option<i64>,
    rule: Option<(PosixDayTime, PosixDayTime)>,
}

/// One `Mm.w.d[/time]` boundary of the daylight rule.
#[derive(Debug)]
struct PosixDayTime {
    month: i8,
    week: i8,
    weekday: i8,
    /// Seconds past midnight; may be negative or span days. `None` means
    /// the POSIX default of 02:00.
    time_seconds: Option<i64>,
}

impl PosixTz {
    fn into_rule(
        self,
        start_date: CalendarDateTime,
        zone_base: Offset,
    ) -> Result<AdjustmentRule, Error> {
        let base_seconds = i64::from(zone_base.minutes()) * 60;
        let base_delta = Offset::from_seconds_truncated(
            self.std_offset_seconds - base_seconds,
        )?;
        let Some(dst) = self.dst else {
            return AdjustmentRule::new_no_transitions(
                start_date,
                CalendarDateTime::MAX.with_tag(Tag::Absolute),
                Offset::ZERO,
                base_delta,
            );
        };
        let Some((start, end)) = dst.rule else {
            return Err(err!(
                InvalidZone,
                "extended-future rule names daylight time but carries no \
                 transition dates",
            ));
        };
        let daylight_delta = match dst.offset_seconds {
            // The daylight offset defaults to one hour ahead of standard.
            None => Offset::constant(1),
            Some(seconds) => {
                let total =
                    Offset::from_seconds_truncated(seconds - base_seconds)?;
                total.unchecked_sub(base_delta)
            }
        };
        AdjustmentRule::new(
            start_date,
            CalendarDateTime::MAX.with_tag(Tag::Absolute),
            daylight_delta,
            start.into_transition()?,
            end.into_transition()?,
            base_delta,
        )
    }
}

impl PosixDayTime {
    fn into_transition(self) -> Result<TransitionTime, Error> {
        let time_of_day = match self.time_seconds {
            // POSIX defaults a missing transition time to 02:00.
            None => CalendarDateTime::new(
                1,
                1,
                1,
                2,
                0,
                0,
                0,
                Tag::Unspecified,
            )
            .expect("02:00 on the epoch date is valid"),
            Some(seconds) => {
                // Strip whole days, keeping only the hour-of-day part. A
                // negative remainder is folded in from a January 2 anchor
                // instead of January 1; the materializer relies on that
                // distinction.
                let seconds = seconds % 86_400;
                let ticks = if seconds < 0 {
                    TICKS_PER_DAY + seconds * TICKS_PER_SECOND
                } else {
                    seconds * TICKS_PER_SECOND
                };
                CalendarDateTime::from_ticks(ticks, Tag::Unspecified)
                    .expect("an hour-of-day tick count is always in range")
            }
        };
        TransitionTime::floating(
            time_of_day,
            self.month,
            self.week,
            self.weekday,
        )
    }
}

/// A cursor over the bytes of an extended-future string.
#[derive(Debug)]
struct Parser<'s> {
    tz: &'s [u8],
    pos: core::cell::Cell<usize>,
}

impl<'s> Parser<'s> {
    fn new(tz: &'s [u8]) -> Parser<'s> {
        Parser { tz, pos: core::cell::Cell::new(0) }
    }

    fn parse(&self) -> Result<PosixTz, Error> {
        let tz = self.parse_posix_tz()?;
        if !self.is_done() {
            return Err(err!(
                InvalidZone,
                "expected entire string to be a single extended-future \
                 rule, but found `{}` after it",
                Bytes(self.remaining()),
            ));
        }
        Ok(tz)
    }

    fn parse_posix_tz(&self) -> Result<PosixTz, Error> {
        let std_name = self.parse_name()?;
        if std_name.is_empty() {
            return Err(err!(
                InvalidZone,
                "extended-future rule must begin with a standard name",
            ));
        }
        if self.is_done() {
            return Err(err!(
                InvalidZone,
                "expected standard offset after name `{std_name}`, but \
                 found end of string",
            ));
        }
        let std_offset_seconds = self.parse_offset()?;
        let mut dst = None;
        if !self.is_done() && self.byte() != b',' {
            dst = Some(self.parse_dst()?);
        }
        Ok(PosixTz { std_name, std_offset_seconds, dst })
    }

    fn parse_dst(&self) -> Result<PosixDst, Error> {
        let name = self.parse_name()?;
        if name.is_empty() {
            return Err(err!(
                InvalidZone,
                "expected daylight name, but found `{}`",
                Byte(self.byte()),
            ));
        }
        let mut dst = PosixDst { name, offset_seconds: None, rule: None };
        if self.is_done() {
            return Ok(dst);
        }
        if self.byte() != b',' {
            dst.offset_seconds = Some(self.parse_offset()?);
            if self.is_done() {
                return Ok(dst);
            }
        }
        if self.byte() != b',' {
            return Err(err!(
                InvalidZone,
                "expected ',' before daylight transition dates, but found \
                 `{}`",
                Byte(self.byte()),
            ));
        }
        if !self.bump() {
            return Err(err!(
                InvalidZone,
                "expected daylight transition dates after trailing ','",
            ));
        }
        let start = self.parse_day_time()?;
        if self.maybe_byte() != Some(b',') || !self.bump() {
            return Err(err!(
                InvalidZone,
                "expected ',' between the start and end transition dates",
            ));
        }
        let end = self.parse_day_time()?;
        dst.rule = Some((start, end));
        Ok(dst)
    }

    /// Parses a zone name: a run of bytes other than digits, `+`, `-` and
    /// `,`.
    fn parse_name(&self) -> Result<String, Error> {
        let start = self.pos();
        while !self.is_done() {
            let byte = self.byte();
            if byte.is_ascii_digit()
                || byte == b'+'
                || byte == b'-'
                || byte == b','
            {
                break;
            }
            self.bump();
        }
        let name = &self.tz[start..self.pos()];
        core::str::from_utf8(name).map(String::from).map_err(|_| {
            err!(
                InvalidZone,
                "zone name `{}` is not valid UTF-8",
                Bytes(name),
            )
        })
    }

    /// Parses an offset of the form `[+|-]H[:M[:S]]`, in seconds, with the
    /// POSIX sign flipped so that east of UTC is positive.
    fn parse_offset(&self) -> Result<i64, Error> {
        let sign = self.parse_optional_sign();
        let hour = self.parse_number_with_upto_n_digits(3)?;
        let (mut minute, mut second) = (0, 0);
        if self.maybe_byte() == Some(b':') {
            if !self.bump() {
                return Err(err!(
                    InvalidZone,
                    "incomplete offset: missing minutes after ':'",
                ));
            }
            minute = self.parse_number_with_upto_n_digits(2)?;
            if !(0 <= minute && minute <= 59) {
                return Err(err!(
                    InvalidZone,
                    "offset minute {minute} is not in 0..=59",
                ));
            }
            if self.maybe_byte() == Some(b':') {
                if !self.bump() {
                    return Err(err!(
                        InvalidZone,
                        "incomplete offset: missing seconds after ':'",
                    ));
                }
                second = self.parse_number_with_upto_n_digits(2)?;
                if !(0 <= second && second <= 59) {
                    return Err(err!(
                        InvalidZone,
                        "offset second {second} is not in 0..=59",
                    ));
                }
            }
        }
        let seconds = hour * 3600 + minute * 60 + second;
        // Flip the sign: POSIX counts west of UTC as positive, so `EST5`
        // means -05:00.
        Ok(-sign * seconds)
    }

    /// Parses a transition day, rejecting the Julian-day forms.
    fn parse_day_time(&self) -> Result<PosixDayTime, Error> {
        match self.maybe_byte() {
            Some(b'M') => {}
            Some(b'J') | Some(b'0'..=b'9') => {
                return Err(err!(
                    InvalidZone,
                    "Julian-day transition dates are not supported; only \
                     the `Mm.w.d` form is",
                ));
            }
            Some(byte) => {
                return Err(err!(
                    InvalidZone,
                    "expected `M` at the start of a transition date, but \
                     found `{}`",
                    Byte(byte),
                ));
            }
            None => {
                return Err(err!(
                    InvalidZone,
                    "expected a transition date, but found end of string",
                ));
            }
        }
        if !self.bump() {
            return Err(err!(
                InvalidZone,
                "expected month after `M`, but found end of string",
            ));
        }
        let month = self.parse_bounded("month", 2, 1, 12)?;
        self.expect_dot("month")?;
        let week = self.parse_bounded("week", 1, 1, 5)?;
        self.expect_dot("week")?;
        let weekday = self.parse_bounded("weekday", 1, 0, 6)?;
        let mut time_seconds = None;
        if self.maybe_byte() == Some(b'/') {
            if !self.bump() {
                return Err(err!(
                    InvalidZone,
                    "expected transition time after '/', but found end of \
                     string",
                ));
            }
            let sign = self.parse_optional_sign();
            let hour = self.parse_number_with_upto_n_digits(3)?;
            let (mut minute, mut second) = (0, 0);
            if self.maybe_byte() == Some(b':') {
                if !self.bump() {
                    return Err(err!(
                        InvalidZone,
                        "incomplete transition time: missing minutes",
                    ));
                }
                minute = self.parse_number_with_upto_n_digits(2)?;
                if self.maybe_byte() == Some(b':') {
                    if !self.bump() {
                        return Err(err!(
                            InvalidZone,
                            "incomplete transition time: missing seconds",
                        ));
                    }
                    second = self.parse_number_with_upto_n_digits(2)?;
                }
            }
            time_seconds = Some(sign * (hour * 3600 + minute * 60 + second));
        }
        Ok(PosixDayTime { month, week, weekday, time_seconds })
    }

    fn parse_bounded(
        &self,
        what: &'static str,
        max_digits: usize,
        min: i64,
        max: i64,
    ) -> Result<i8, Error> {
        let number = self.parse_number_with_upto_n_digits(max_digits)?;
        if !(min <= number && number <= max) {
            return Err(err!(
                InvalidZone,
                "transition {what} {number} is not in {min}..={max}",
            ));
        }
        Ok(number as i8)
    }

    fn expect_dot(&self, after: &'static str) -> Result<(), Error> {
        if self.maybe_byte() != Some(b'.') || !self.bump() {
            return Err(err!(
                InvalidZone,
                "expected '.' after transition {after}",
            ));
        }
        Ok(())
    }

    fn parse_optional_sign(&self) -> i64 {
        match self.maybe_byte() {
            Some(b'-') => {
                self.bump();
                -1
            }
            Some(b'+') => {
                self.bump();
                1
            }
            _ => 1,
        }
    }

    fn parse_number_with_upto_n_digits(
        &self,
        max_digits: usize,
    ) -> Result<i64, Error> {
        let mut number: i64 = 0;
        let mut digits = 0;
        while digits < max_digits
            && self.maybe_byte().is_some_and(|b| b.is_ascii_digit())
        {
            number = number * 10 + i64::from(self.byte() - b'0');
            digits += 1;
            self.bump();
        }
        if digits == 0 {
            return Err(err!(
                InvalidZone,
                "expected a number, but found `{}`",
                self.maybe_byte().map(Byte).map_or_else(
                    || "end of string".to_string(),
                    |b| b.to_string(),
                ),
            ));
        }
        Ok(number)
    }

    fn pos(&self) -> usize {
        self.pos.get()
    }

    fn is_done(&self) -> bool {
        self.pos() >= self.tz.len()
    }

    fn byte(&self) -> u8 {
        self.tz[self.pos()]
    }

    fn maybe_byte(&self) -> Option<u8> {
        self.tz.get(self.pos()).copied()
    }

    /// Advances to the next byte. Returns false when the input is
    /// exhausted afterwards.
    fn bump(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.pos.set(self.pos() + 1);
        !self.is_done()
    }

    fn remaining(&self) -> &'s [u8] {
        &self.tz[self.pos()..]
    }
}
