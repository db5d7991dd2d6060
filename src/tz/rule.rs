use crate::{
    civil::{CalendarDateTime, Tag},
    error::{err, Error},
    instant::TICKS_PER_MILLISECOND,
    tz::{Offset, TransitionTime},
};

/// One contiguous window of a zone's rule history.
///
/// An adjustment rule pairs a validity window (`date_start..=date_end`) with
/// the daylight saving behavior inside that window. Rules come in two
/// shapes:
///
/// * A *transitioning* rule oscillates yearly: its two [`TransitionTime`]s
///   identify where daylight saving begins and ends within each year of the
///   window.
/// * A *no-transition* rule fixes a single offset over its entire duration.
///   Its window endpoints are absolute instants, and it expresses either a
///   plain base-offset correction or (when its daylight delta is non-zero,
///   or it carries the daylight start sentinel) a stretch that counts as
///   daylight time throughout.
///
/// Windows of consecutive rules in a zone never touch:
/// `rules[i].date_start() > rules[i - 1].date_end()` always holds.
#[derive(Clone, Eq, PartialEq)]
pub struct AdjustmentRule {
    date_start: CalendarDateTime,
    date_end: CalendarDateTime,
    daylight_delta: Offset,
    daylight_transition_start: TransitionTime,
    daylight_transition_end: TransitionTime,
    base_utc_offset_delta: Offset,
    no_daylight_transitions: bool,
}

/// The smallest legal daylight delta, `-23:00`, in minutes.
const DAYLIGHT_DELTA_MIN: i32 = -23 * 60;
/// The largest legal daylight delta, `+14:00`, in minutes.
const DAYLIGHT_DELTA_MAX: i32 = 14 * 60;

impl AdjustmentRule {
    /// Creates a transitioning adjustment rule.
    ///
    /// `date_start` and `date_end` must be tagged `Unspecified` (with a
    /// midnight time of day) or `Absolute`, in chronological order. The
    /// daylight delta must be a whole number of minutes in
    /// `-23:00..=+14:00`, and the two transitions must differ.
    pub fn new(
        date_start: CalendarDateTime,
        date_end: CalendarDateTime,
        daylight_delta: Offset,
        daylight_transition_start: TransitionTime,
        daylight_transition_end: TransitionTime,
        base_utc_offset_delta: Offset,
    ) -> Result<AdjustmentRule, Error> {
        let rule = AdjustmentRule {
            date_start,
            date_end,
            daylight_delta,
            daylight_transition_start,
            daylight_transition_end,
            base_utc_offset_delta,
            no_daylight_transitions: false,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Creates a no-transition adjustment rule: one fixed offset over the
    /// whole window.
    ///
    /// `date_start` and `date_end` must be `Absolute` instants. A non-zero
    /// `daylight_delta` means the entire window counts as daylight time.
    pub fn new_no_transitions(
        date_start: CalendarDateTime,
        date_end: CalendarDateTime,
        daylight_delta: Offset,
        base_utc_offset_delta: Offset,
    ) -> Result<AdjustmentRule, Error> {
        AdjustmentRule::new_no_transitions_with(
            date_start,
            date_end,
            daylight_delta,
            base_utc_offset_delta,
            TransitionTime::unused_start(),
        )
    }

    /// Like `new_no_transitions`, but with an explicit start transition.
    /// The TZif decoder passes the daylight sentinel here for rules built
    /// from daylight-typed records.
    pub(crate) fn new_no_transitions_with(
        date_start: CalendarDateTime,
        date_end: CalendarDateTime,
        daylight_delta: Offset,
        base_utc_offset_delta: Offset,
        daylight_transition_start: TransitionTime,
    ) -> Result<AdjustmentRule, Error> {
        let rule = AdjustmentRule {
            date_start,
            date_end,
            daylight_delta,
            daylight_transition_start,
            daylight_transition_end: TransitionTime::unused_end(),
            base_utc_offset_delta,
            no_daylight_transitions: true,
        };
        rule.validate()?;
        Ok(rule)
    }

    fn validate(&self) -> Result<(), Error> {
        for (what, endpoint) in [
            ("start", &self.date_start),
            ("end", &self.date_end),
        ] {
            match endpoint.tag() {
                Tag::Wall => {
                    return Err(err!(
                        InvalidZone,
                        "rule {what} endpoint must be absolute or \
                         unspecified, not wall",
                    ));
                }
                Tag::Unspecified => {
                    if endpoint.time_of_day_ticks() != 0 {
                        return Err(err!(
                            InvalidZone,
                            "unspecified rule {what} endpoint must be a \
                             bare date, but got {endpoint:?}",
                        ));
                    }
                }
                Tag::Absolute => {}
            }
        }
        if self.no_daylight_transitions {
            if self.date_start.tag() != Tag::Absolute
                || self.date_end.tag() != Tag::Absolute
            {
                return Err(err!(
                    InvalidZone,
                    "a rule without yearly transitions must have absolute \
                     endpoints",
                ));
            }
        }
        if self.date_start > self.date_end {
            return Err(err!(
                InvalidZone,
                "rule window is not chronological: {:?} > {:?}",
                self.date_start,
                self.date_end,
            ));
        }
        let delta = self.daylight_delta.minutes();
        if !(DAYLIGHT_DELTA_MIN <= delta && delta <= DAYLIGHT_DELTA_MAX) {
            return Err(err!(
                InvalidZone,
                "daylight delta {} is not in -23:00..=+14:00",
                self.daylight_delta,
            ));
        }
        if !self.no_daylight_transitions
            && self.daylight_transition_start == self.daylight_transition_end
        {
            return Err(err!(
                InvalidZone,
                "rule transition times are identical: {:?}",
                self.daylight_transition_start,
            ));
        }
        Ok(())
    }

    /// Returns the first calendar date time covered by this rule.
    pub fn date_start(&self) -> CalendarDateTime {
        self.date_start
    }

    /// Returns the last calendar date time covered by this rule.
    pub fn date_end(&self) -> CalendarDateTime {
        self.date_end
    }

    /// Returns the difference between this rule's daylight offset and its
    /// standard offset.
    pub fn daylight_delta(&self) -> Offset {
        self.daylight_delta
    }

    /// Returns where daylight saving begins within each year of the window.
    /// Unused when [`AdjustmentRule::no_daylight_transitions`] is true.
    pub fn daylight_transition_start(&self) -> TransitionTime {
        self.daylight_transition_start
    }

    /// Returns where daylight saving ends within each year of the window.
    /// Unused when [`AdjustmentRule::no_daylight_transitions`] is true.
    pub fn daylight_transition_end(&self) -> TransitionTime {
        self.daylight_transition_end
    }

    /// Returns the correction added to the zone's base offset while this
    /// rule is in effect.
    pub fn base_utc_offset_delta(&self) -> Offset {
        self.base_utc_offset_delta
    }

    /// Returns true when this rule fixes a single offset over its whole
    /// window instead of oscillating yearly.
    pub fn no_daylight_transitions(&self) -> bool {
        self.no_daylight_transitions
    }

    /// Returns true when any part of this rule's window counts as daylight
    /// time.
    ///
    /// Besides a non-zero delta, a rule whose transitions differ from the
    /// unused placeholders is daylight saving: the TZif decoder emits a
    /// start-transition sentinel for daylight-typed records whose delta
    /// happens to collapse to zero, and this predicate is what that
    /// sentinel keeps alive.
    pub fn has_daylight_saving(&self) -> bool {
        !self.daylight_delta.is_zero()
            || self.daylight_transition_start.time_of_day().ticks() != 0
            || self.daylight_transition_end.time_of_day().ticks()
                != TICKS_PER_MILLISECOND
    }

    /// Returns true when this rule's daylight window opens at the very
    /// first instant of the year: the start transition sits at January 1
    /// midnight and the rule covers a single year. Such a marker means "the
    /// year begins inside daylight time" and is not an intra-year boundary.
    pub(crate) fn is_start_marker_for_year_start(&self) -> bool {
        !self.no_daylight_transitions
            && self.daylight_transition_start.month() == 1
            && self.daylight_transition_start.day() == 1
            && self.daylight_transition_start.time_of_day().hour() == 0
            && self.daylight_transition_start.time_of_day().minute() == 0
            && self.daylight_transition_start.time_of_day().second() == 0
            && self.date_start.year() == self.date_end.year()
    }

    /// The counterpart of
    /// [`AdjustmentRule::is_start_marker_for_year_start`]: the daylight
    /// window closes at the very last instant of the year.
    pub(crate) fn is_end_marker_for_year_end(&self) -> bool {
        !self.no_daylight_transitions
            && self.daylight_transition_end.month() == 1
            && self.daylight_transition_end.day() == 1
            && self.daylight_transition_end.time_of_day().hour() == 0
            && self.daylight_transition_end.time_of_day().minute() == 0
            && self.daylight_transition_end.time_of_day().second() == 0
            && self.date_start.year() == self.date_end.year()
    }
}

impl core::fmt::Debug for AdjustmentRule {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut d = f.debug_struct("AdjustmentRule");
        d.field("date_start", &self.date_start)
            .field("date_end", &self.date_end)
            .field("daylight_delta", &self.daylight_delta);
        if self.no_daylight_transitions {
            d.field("no_daylight_transitions", &true);
        } else {
            d.field("start", &self.daylight_transition_start)
                .field("end", &self.daylight_transition_end);
        }
        if !self.base_utc_offset_delta.is_zero() {
            d.field("base_utc_offset_delta", &self.base_utc_offset_delta);
        }
        d.finish()
    }
}
