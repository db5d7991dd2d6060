use std::sync::{Arc, OnceLock};

use crate::{
    civil::{days_from_civil, CalendarDateTime, Tag},
    error::{err, Error},
    instant::{Instant, MAX_DAYS, MAX_TICKS, TICKS_PER_DAY},
    tz::{AdjustmentRule, Dst, Offset},
};

/// The last date-only value, 9999-12-31T00:00:00, in ticks. Instants past
/// this cannot have the base offset added without leaving the supported
/// range, so rule selection clamps to the last representable time.
const MAX_DATE_ONLY_TICKS: i64 = (MAX_DAYS - 1) * TICKS_PER_DAY;

/// The first date-only value with room below it, 0001-01-02T00:00:00, in
/// ticks. The mirror image of `MAX_DATE_ONLY_TICKS` for western offsets.
const MIN_DATE_ONLY_TICKS: i64 = TICKS_PER_DAY;

/// Options for [`Zone::convert`].
///
/// The only recognized member so far is `no_throw_on_invalid_time`. It
/// defaults to `false`: converting a wall time that falls inside the invalid
/// window of a daylight transition is an error. The offset query paths set
/// it, so that formatting a malformed wall time degrades instead of
/// failing.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertOptions {
    no_throw_on_invalid_time: bool,
}

impl ConvertOptions {
    /// Returns the default options.
    pub fn new() -> ConvertOptions {
        ConvertOptions::default()
    }

    /// Sets whether a wall time inside an invalid window converts by
    /// pretending it is standard time rather than failing.
    pub fn no_throw_on_invalid_time(self, yes: bool) -> ConvertOptions {
        ConvertOptions { no_throw_on_invalid_time: yes }
    }
}

/// The result of resolving a zone's offset at one UTC instant.
#[derive(Clone, Copy, Debug)]
pub struct OffsetInfo {
    offset: Offset,
    dst: Dst,
    ambiguous_dst: bool,
}

impl OffsetInfo {
    /// The total offset from UTC in effect at the queried instant,
    /// including any daylight saving delta.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Whether the queried instant is in daylight saving time.
    pub fn dst(&self) -> Dst {
        self.dst
    }

    /// True when the wall time this instant maps to is ambiguous and this
    /// instant is on the daylight side of the fold. Conversions record this
    /// bit on the wall value they produce so the reverse conversion can
    /// pick the same occurrence.
    pub fn is_ambiguous_dst(&self) -> bool {
        self.ambiguous_dst
    }
}

/// The wall-clock daylight saving window of one rule for one year.
#[derive(Clone, Copy, Debug)]
struct DaylightWindow {
    start: CalendarDateTime,
    end: CalendarDateTime,
    delta: Offset,
}

/// A named civil time zone: a base offset from UTC plus an ordered sequence
/// of [`AdjustmentRule`]s describing how the offset has changed and will
/// change.
///
/// A zone is immutable once constructed and cheap to clone (clones share
/// the rule array). Any number of threads may query a zone concurrently.
///
/// Zones are constructed by one of the decoders ([`Zone::from_tzif`],
/// [`Zone::from_registry`], [`Zone::from_serialized`]) or directly with
/// [`Zone::new`]. Two zones compare equal when their identifiers match
/// case-insensitively and their base offsets and rule arrays are
/// structurally equal; display names never participate in equality.
#[derive(Clone)]
pub struct Zone {
    inner: Arc<ZoneInner>,
}

struct ZoneInner {
    id: String,
    display_name: String,
    standard_name: String,
    daylight_name: String,
    base_utc_offset: Offset,
    rules: Option<Vec<AdjustmentRule>>,
    supports_dst: bool,
}

impl Zone {
    /// Creates a zone from its parts.
    ///
    /// `rules` may be `None` ("no daylight saving, ever") or an ordered
    /// array of non-overlapping rules. The base offset must be within
    /// `-14:00..=14:00`, the identifier must be non-empty and free of NUL,
    /// and every rule's total offset (base plus rule delta plus daylight
    /// delta where applicable) must stay within `-14:00..=14:00`.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        standard_name: impl Into<String>,
        daylight_name: impl Into<String>,
        base_utc_offset: Offset,
        rules: Option<Vec<AdjustmentRule>>,
    ) -> Result<Zone, Error> {
        let id = id.into();
        if id.is_empty() {
            return Err(err!(InvalidZone, "zone id must be non-empty"));
        }
        if id.contains('\0') {
            return Err(err!(InvalidZone, "zone id must not contain NUL"));
        }
        if !base_utc_offset.is_valid_base() {
            return Err(err!(
                InvalidZone,
                "base offset {base_utc_offset} of zone `{id}` is not in \
                 -14:00..=+14:00",
            ));
        }
        if let Some(ref rules) = rules {
            for (i, rule) in rules.iter().enumerate() {
                if i > 0 && rule.date_start() <= rules[i - 1].date_end() {
                    return Err(err!(
                        InvalidZone,
                        "adjustment rules of zone `{id}` are out of order \
                         or overlapping at index {i}",
                    ));
                }
                let total = total_offset(base_utc_offset, rule);
                if !total.is_valid_base() {
                    return Err(err!(
                        InvalidZone,
                        "total offset {total} of rule {i} in zone `{id}` \
                         is not in -14:00..=+14:00",
                    ));
                }
            }
        }
        // An empty rule array and no rule array at all mean the same
        // thing; normalize so equality and round-trips agree.
        let rules = rules.filter(|rules| !rules.is_empty());
        let supports_dst = rules
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(AdjustmentRule::has_daylight_saving);
        Ok(Zone {
            inner: Arc::new(ZoneInner {
                id,
                display_name: display_name.into(),
                standard_name: standard_name.into(),
                daylight_name: daylight_name.into(),
                base_utc_offset,
                rules,
                supports_dst,
            }),
        })
    }

    /// Creates a zone with a fixed offset and no rule history. The given
    /// identifier doubles as every display name.
    pub fn fixed(id: impl Into<String>, offset: Offset) -> Result<Zone, Error> {
        let id = id.into();
        Zone::new(id.clone(), id.clone(), id.clone(), id, offset, None)
    }

    /// Returns the UTC zone sentinel.
    ///
    /// This is a process-wide singleton; every call returns a clone sharing
    /// the same allocation.
    pub fn utc() -> Zone {
        static UTC: OnceLock<Zone> = OnceLock::new();
        UTC.get_or_init(|| {
            Zone::fixed("UTC", Offset::UTC)
                .expect("the UTC sentinel is always a valid zone")
        })
        .clone()
    }

    /// Returns the identifier of this zone.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns the general display name of this zone. Display names are
    /// presentation only and never participate in comparisons.
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// Returns the display name of this zone's standard time.
    pub fn standard_name(&self) -> &str {
        &self.inner.standard_name
    }

    /// Returns the display name of this zone's daylight time.
    pub fn daylight_name(&self) -> &str {
        &self.inner.daylight_name
    }

    /// Returns the base offset from UTC, exclusive of any adjustment rule.
    pub fn base_utc_offset(&self) -> Offset {
        self.inner.base_utc_offset
    }

    /// Returns the ordered adjustment rules, or `None` when this zone has
    /// no rule history at all.
    pub fn adjustment_rules(&self) -> Option<&[AdjustmentRule]> {
        self.inner.rules.as_deref()
    }

    /// Returns true when any rule of this zone has daylight saving.
    pub fn supports_daylight_saving_time(&self) -> bool {
        self.inner.supports_dst
    }

    /// Returns true when this zone is the UTC sentinel (or structurally
    /// indistinguishable from it).
    pub fn is_utc(&self) -> bool {
        *self == Zone::utc()
    }

    /// Returns the offset from UTC in effect at the given instant. This
    /// includes the daylight saving delta when the instant is in DST.
    pub fn to_offset(&self, instant: Instant) -> Offset {
        self.to_offset_info(instant).offset()
    }

    /// Returns the offset in effect at the given instant, along with
    /// whether the instant is in DST and whether its wall presentation is
    /// ambiguous.
    pub fn to_offset_info(&self, instant: Instant) -> OffsetInfo {
        self.inner.offset_info_from_utc(instant.ticks())
    }

    /// Returns the offset from UTC for the given calendar date time.
    ///
    /// An `Absolute` value is resolved on the UTC time line; `Wall` and
    /// `Unspecified` values are interpreted as wall clock readings in this
    /// zone. Wall readings inside an invalid window resolve as standard
    /// time rather than failing, so this is safe to use on a formatting
    /// path.
    pub fn offset_at(&self, dt: CalendarDateTime) -> Offset {
        match dt.tag() {
            Tag::Absolute => self.inner.offset_info_from_utc(dt.ticks()).offset,
            Tag::Wall | Tag::Unspecified => self.inner.offset_from_wall(dt),
        }
    }

    /// Returns true when the given calendar date time is in daylight saving
    /// time in this zone.
    pub fn is_daylight_saving_time(&self, dt: CalendarDateTime) -> bool {
        match dt.tag() {
            Tag::Absolute => {
                self.inner.offset_info_from_utc(dt.ticks()).dst.is_dst()
            }
            Tag::Wall | Tag::Unspecified => {
                let inner = &*self.inner;
                let Some((index, rule)) = inner.rule_for_wall(dt) else {
                    return false;
                };
                if !rule.has_daylight_saving() {
                    return false;
                }
                let window =
                    inner.daylight_window(dt.year() as i32, index, rule);
                inner.is_daylight_savings_wall(dt, rule, &window)
            }
        }
    }

    /// Returns true when the given calendar date time occurs twice in this
    /// zone because a clock was set backwards through it.
    pub fn is_ambiguous(&self, dt: CalendarDateTime) -> bool {
        let inner = &*self.inner;
        if !inner.supports_dst {
            return false;
        }
        let adjusted = self.to_wall_of(dt);
        let Some((index, rule)) = inner.rule_for_wall(adjusted) else {
            return false;
        };
        if !rule.has_daylight_saving() {
            return false;
        }
        let window = inner.daylight_window(adjusted.year() as i32, index, rule);
        inner.is_ambiguous_wall(adjusted, rule, &window)
    }

    /// Returns true when the given calendar date time does not exist in
    /// this zone because a clock jumped forward over it.
    ///
    /// An `Absolute` value always exists on the UTC time line and is never
    /// invalid.
    pub fn is_invalid(&self, dt: CalendarDateTime) -> bool {
        if dt.tag() == Tag::Absolute {
            return false;
        }
        let inner = &*self.inner;
        if !inner.supports_dst {
            return false;
        }
        let Some((index, rule)) = inner.rule_for_wall(dt) else {
            return false;
        };
        if !rule.has_daylight_saving() {
            return false;
        }
        let window = inner.daylight_window(dt.year() as i32, index, rule);
        inner.is_invalid_wall(dt, rule, &window)
    }

    /// Returns the two offsets an ambiguous calendar date time can resolve
    /// to, in ascending order. Their difference is the magnitude of the
    /// rule's daylight delta.
    ///
    /// This fails when the zone has no daylight saving at all or when the
    /// given time is not ambiguous.
    pub fn ambiguous_offsets(
        &self,
        dt: CalendarDateTime,
    ) -> Result<[Offset; 2], Error> {
        let inner = &*self.inner;
        if !inner.supports_dst {
            return Err(err!(
                NotAmbiguous,
                "zone `{}` has no daylight saving, so no time in it is \
                 ambiguous",
                inner.id,
            ));
        }
        let adjusted = self.to_wall_of(dt);
        let ambiguous_rule = inner.rule_for_wall(adjusted).filter(
            |(index, rule)| {
                rule.has_daylight_saving() && {
                    let window = inner.daylight_window(
                        adjusted.year() as i32,
                        *index,
                        rule,
                    );
                    inner.is_ambiguous_wall(adjusted, rule, &window)
                }
            },
        );
        let Some((_, rule)) = ambiguous_rule else {
            return Err(err!(
                NotAmbiguous,
                "{adjusted:?} is not ambiguous in zone `{}`",
                inner.id,
            ));
        };
        let standard = inner
            .base_utc_offset
            .unchecked_add(rule.base_utc_offset_delta());
        let daylight = standard.unchecked_add(rule.daylight_delta());
        Ok(if rule.daylight_delta().is_positive() {
            [standard, daylight]
        } else {
            [daylight, standard]
        })
    }

    /// Converts a calendar date time from one zone to another.
    ///
    /// The tag of `dt` must agree with the source zone: `Absolute` values
    /// only convert out of the UTC zone and `Wall` values only out of a
    /// non-UTC zone. `Unspecified` values convert out of anything.
    ///
    /// Unless `options.no_throw_on_invalid_time` is set, a wall time inside
    /// an invalid window fails with an invalid-time error.
    ///
    /// The result carries the destination's tag: `Absolute` when the
    /// destination is UTC, otherwise `Wall` with the disambiguation bit
    /// recorded.
    pub fn convert(
        dt: CalendarDateTime,
        source: &Zone,
        destination: &Zone,
        options: ConvertOptions,
    ) -> Result<CalendarDateTime, Error> {
        match dt.tag() {
            Tag::Absolute if !source.is_utc() => {
                return Err(err!(
                    TagMismatch,
                    "{dt:?} is tagged absolute, but the source zone `{}` \
                     is not UTC",
                    source.id(),
                ));
            }
            Tag::Wall if source.is_utc() => {
                return Err(err!(
                    TagMismatch,
                    "{dt:?} is tagged wall, but the source zone is UTC",
                ));
            }
            _ => {}
        }

        let src = &*source.inner;
        let mut source_offset = src.base_utc_offset;
        if let Some((index, rule)) = src.rule_for_wall(dt) {
            source_offset =
                source_offset.unchecked_add(rule.base_utc_offset_delta());
            if rule.has_daylight_saving() {
                let window =
                    src.daylight_window(dt.year() as i32, index, rule);
                if !options.no_throw_on_invalid_time
                    && src.is_invalid_wall(dt, rule, &window)
                {
                    return Err(err!(
                        InvalidTime,
                        "{dt:?} does not exist in zone `{}`: it falls in \
                         the gap of a daylight saving transition",
                        src.id,
                    ));
                }
                if src.is_daylight_savings_wall(dt, rule, &window) {
                    source_offset =
                        source_offset.unchecked_add(rule.daylight_delta());
                }
            }
        }

        // Converting a designated time between equal zones is lossless.
        if dt.tag() != Tag::Unspecified && source == destination {
            return Ok(dt);
        }

        let utc_ticks = dt.ticks() - source_offset.ticks();
        let (wall_ticks, info) =
            destination.inner.wall_of_utc_ticks(utc_ticks);
        let tag =
            if destination.is_utc() { Tag::Absolute } else { Tag::Wall };
        Ok(CalendarDateTime::from_ticks(wall_ticks, tag)
            .expect("converted ticks are clamped into range")
            .with_dst_if_ambiguous(info.ambiguous_dst && tag == Tag::Wall))
    }

    /// Interprets the given value as a wall reading in this zone,
    /// converting `Absolute` values first.
    fn to_wall_of(&self, dt: CalendarDateTime) -> CalendarDateTime {
        if dt.tag() != Tag::Absolute {
            return dt;
        }
        let (wall_ticks, info) = self.inner.wall_of_utc_ticks(dt.ticks());
        CalendarDateTime::from_ticks(wall_ticks, Tag::Wall)
            .expect("converted ticks are clamped into range")
            .with_dst_if_ambiguous(info.ambiguous_dst)
    }
}

impl Eq for Zone {}

impl PartialEq for Zone {
    fn eq(&self, rhs: &Zone) -> bool {
        if Arc::ptr_eq(&self.inner, &rhs.inner) {
            return true;
        }
        self.inner.id.eq_ignore_ascii_case(&rhs.inner.id)
            && self.inner.base_utc_offset == rhs.inner.base_utc_offset
            && self.inner.rules == rhs.inner.rules
    }
}

impl core::fmt::Debug for Zone {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.inner.id)
            .field("base_utc_offset", &self.inner.base_utc_offset)
            .field(
                "rules",
                &self.inner.rules.as_deref().map(<[_]>::len),
            )
            .finish()
    }
}

impl ZoneInner {
    fn rules(&self) -> &[AdjustmentRule] {
        self.rules.as_deref().unwrap_or(&[])
    }

    /// Selects the rule in effect for a wall (or unspecified) reading.
    fn rule_for_wall(
        &self,
        dt: CalendarDateTime,
    ) -> Option<(usize, &AdjustmentRule)> {
        self.rule_for(dt, false)
    }

    /// Selects the first rule whose window contains the given value.
    ///
    /// When `dt_is_utc` is set, `dt` sits on the UTC time line: date-only
    /// window endpoints are compared against the zone's wall frame
    /// (`dt + base`), while absolute endpoints compare against `dt`
    /// directly.
    fn rule_for(
        &self,
        dt: CalendarDateTime,
        dt_is_utc: bool,
    ) -> Option<(usize, &AdjustmentRule)> {
        let rules = self.rules();
        if rules.is_empty() {
            return None;
        }
        let date_only = if dt_is_utc {
            dt.saturating_add_ticks(self.base_utc_offset.ticks()).date()
        } else {
            dt.date()
        };
        for (i, rule) in rules.iter().enumerate() {
            if self.rule_contains(rules, i, rule, dt, date_only, dt_is_utc) {
                return Some((i, rule));
            }
        }
        None
    }

    fn rule_contains(
        &self,
        rules: &[AdjustmentRule],
        index: usize,
        rule: &AdjustmentRule,
        dt: CalendarDateTime,
        date_only: CalendarDateTime,
        dt_is_utc: bool,
    ) -> bool {
        let after_start = if rule.date_start().tag() == Tag::Absolute {
            // An absolute start boundary is the instant the previous rule
            // handed over, so a wall reading must be pushed to UTC with the
            // offsets that were in effect before the hand-over.
            let compare = if dt_is_utc {
                dt
            } else {
                let prev = previous_rule(rules, index, rule);
                wall_to_utc(
                    dt,
                    self.base_utc_offset,
                    prev.daylight_delta(),
                    prev.base_utc_offset_delta(),
                )
            };
            compare >= rule.date_start()
        } else {
            date_only >= rule.date_start()
        };
        if !after_start {
            return false;
        }
        if rule.date_end().tag() == Tag::Absolute {
            let compare = if dt_is_utc {
                dt
            } else {
                wall_to_utc(
                    dt,
                    self.base_utc_offset,
                    rule.daylight_delta(),
                    rule.base_utc_offset_delta(),
                )
            };
            compare <= rule.date_end()
        } else {
            date_only <= rule.date_end()
        }
    }

    /// Computes the wall-clock daylight saving window of `rule` for `year`.
    fn daylight_window(
        &self,
        year: i32,
        index: usize,
        rule: &AdjustmentRule,
    ) -> DaylightWindow {
        if rule.no_daylight_transitions() {
            // The window opens the instant the previous rule ends, so the
            // wall presentation of the start uses the previous rule's
            // offsets; the end is presented with this rule's own.
            let rules = self.rules();
            let prev = previous_rule(rules, index, rule);
            let start_offset = self
                .base_utc_offset
                .unchecked_add(prev.base_utc_offset_delta())
                .unchecked_add(prev.daylight_delta());
            let end_offset = self
                .base_utc_offset
                .unchecked_add(rule.base_utc_offset_delta())
                .unchecked_add(rule.daylight_delta());
            DaylightWindow {
                start: rule
                    .date_start()
                    .saturating_add_ticks(start_offset.ticks())
                    .with_tag(Tag::Unspecified),
                end: rule
                    .date_end()
                    .saturating_add_ticks(end_offset.ticks())
                    .with_tag(Tag::Unspecified),
                delta: rule.daylight_delta(),
            }
        } else {
            DaylightWindow {
                start: rule.daylight_transition_start().to_wall(year),
                end: rule.daylight_transition_end().to_wall(year),
                delta: rule.daylight_delta(),
            }
        }
    }

    /// Whether a wall reading falls in the daylight saving portion of its
    /// rule's window.
    ///
    /// The comparison window includes the overlapped (ambiguous) region.
    /// For a wall reading that is in fact ambiguous, the recorded
    /// disambiguation bit decides.
    fn is_daylight_savings_wall(
        &self,
        time: CalendarDateTime,
        rule: &AdjustmentRule,
        window: &DaylightWindow,
    ) -> bool {
        let delta = window.delta;
        let start = if rule.is_start_marker_for_year_start() {
            year_start(window.start.year() as i32)
        } else if delta.is_positive() {
            window.start.saturating_add_ticks(delta.ticks())
        } else {
            window.start
        };
        let end = if rule.is_end_marker_for_year_end() {
            year_end(window.end.year() as i32)
        } else if delta.is_negative() {
            window.end.saturating_add_ticks(-delta.ticks())
        } else {
            window.end
        };
        let mut is_dst = check_is_dst(start, time, end, false, rule);
        if is_dst && time.tag() == Tag::Wall {
            // The wall reading itself cannot say which side of a fold it
            // is on; conversions record that on the value.
            if self.is_ambiguous_wall(time, rule, window) {
                is_dst = time.is_dst_if_ambiguous();
            }
        }
        is_dst
    }

    /// Whether a wall reading is repeated by the fold of its rule's
    /// transition.
    fn is_ambiguous_wall(
        &self,
        time: CalendarDateTime,
        rule: &AdjustmentRule,
        window: &DaylightWindow,
    ) -> bool {
        let delta = window.delta;
        if delta.is_zero() {
            return false;
        }
        let (lo, hi) = if delta.is_positive() {
            // The year closes inside daylight time, so its fall-back hour
            // never happens.
            if rule.is_end_marker_for_year_end() {
                return false;
            }
            (window.end.saturating_add_ticks(-delta.ticks()), window.end)
        } else {
            if rule.is_start_marker_for_year_start() {
                return false;
            }
            (window.start.saturating_add_ticks(delta.ticks()), window.start)
        };
        in_window_with_year_shifts(lo, time, hi)
    }

    /// Whether a wall reading is skipped by the gap of its rule's
    /// transition.
    fn is_invalid_wall(
        &self,
        time: CalendarDateTime,
        rule: &AdjustmentRule,
        window: &DaylightWindow,
    ) -> bool {
        let delta = window.delta;
        if delta.is_zero() {
            return false;
        }
        let (lo, hi) = if delta.is_negative() {
            // The year closes inside daylight time, so its spring-forward
            // hole never happens.
            if rule.is_end_marker_for_year_end() {
                return false;
            }
            (window.end, window.end.saturating_add_ticks(-delta.ticks()))
        } else {
            if rule.is_start_marker_for_year_start() {
                return false;
            }
            (window.start, window.start.saturating_add_ticks(delta.ticks()))
        };
        in_window_with_year_shifts(lo, time, hi)
    }

    /// Resolves the offset of this zone at a UTC tick count, clamping into
    /// the representable range first.
    fn wall_of_utc_ticks(&self, utc_ticks: i64) -> (i64, OffsetInfo) {
        let info = self.offset_info_from_utc(utc_ticks.clamp(0, MAX_TICKS));
        let wall =
            (utc_ticks.saturating_add(info.offset.ticks())).clamp(0, MAX_TICKS);
        (wall, info)
    }

    /// The UTC-side offset query: given a UTC tick count, the offset in
    /// effect, whether that is daylight time, and whether the wall
    /// presentation is ambiguous.
    fn offset_info_from_utc(&self, utc_ticks: i64) -> OffsetInfo {
        let utc_ticks = utc_ticks.clamp(0, MAX_TICKS);
        let time = CalendarDateTime::from_ticks(utc_ticks, Tag::Absolute)
            .expect("clamped ticks are in range");

        // Within a day of either extreme, adding the base offset could
        // leave the representable range, so pin selection to the edge.
        let (selected, year) = if utc_ticks > MAX_DATE_ONLY_TICKS {
            (self.rule_for_wall(CalendarDateTime::MAX), 9999)
        } else if utc_ticks < MIN_DATE_ONLY_TICKS {
            (self.rule_for_wall(CalendarDateTime::MIN), 1)
        } else {
            let target =
                time.saturating_add_ticks(self.base_utc_offset.ticks());
            // The year of the base-adjusted time, not of the instant: near
            // January 1 the base offset shift can cross into the
            // neighboring year, and the rule windows are materialized in
            // the zone's wall frame.
            (self.rule_for(time, true), target.year() as i32)
        };

        let mut offset = self.base_utc_offset;
        if let Some((index, rule)) = selected {
            offset = offset.unchecked_add(rule.base_utc_offset_delta());
            if rule.has_daylight_saving() {
                let (is_dst, ambiguous_dst) = self
                    .is_daylight_savings_from_utc(time, year, index, rule);
                if is_dst {
                    offset = offset.unchecked_add(rule.daylight_delta());
                }
                return OffsetInfo {
                    offset,
                    dst: Dst::from(is_dst),
                    ambiguous_dst,
                };
            }
        }
        OffsetInfo { offset, dst: Dst::No, ambiguous_dst: false }
    }

    /// Whether a UTC instant falls in the daylight saving portion of its
    /// rule, and whether its wall presentation is ambiguous.
    ///
    /// The window endpoints are pushed from the wall frame to UTC with the
    /// anchor offsets: the start with the offsets in effect *before* the
    /// transition, the end with the rule's own daylight offsets. Year-edge
    /// markers splice the window together with the neighboring year's
    /// rule, so a stretch of daylight time that crosses December 31 is
    /// evaluated as one window.
    fn is_daylight_savings_from_utc(
        &self,
        time: CalendarDateTime,
        year: i32,
        index: usize,
        rule: &AdjustmentRule,
    ) -> (bool, bool) {
        let base = self.base_utc_offset;
        let rules = self.rules();
        let window = self.daylight_window(year, index, rule);
        let mut ignore_year_adjustment = false;

        let dst_start_offset = if rule.no_daylight_transitions() {
            let prev = previous_rule(rules, index, rule);
            base.unchecked_add(prev.base_utc_offset_delta())
                .unchecked_add(prev.daylight_delta())
        } else {
            base.unchecked_add(rule.base_utc_offset_delta())
        };
        let start_year = window.start.year() as i32;
        let mut start_time = None;
        if rule.is_start_marker_for_year_start() && start_year > 1 {
            // The year opens inside daylight time. If the previous year
            // closed inside it too, the real start is the previous year's
            // transition.
            let probe = year_december_31(start_year - 1);
            if let Some((prev_index, prev_rule)) = self.rule_for_wall(probe) {
                if prev_rule.is_end_marker_for_year_end() {
                    let prev_window = self.daylight_window(
                        start_year - 1,
                        prev_index,
                        prev_rule,
                    );
                    ignore_year_adjustment = true;
                    start_time = Some(wall_to_utc(
                        prev_window.start,
                        base,
                        Offset::ZERO,
                        prev_rule.base_utc_offset_delta(),
                    ));
                }
            }
        }
        let start_time = start_time.unwrap_or_else(|| {
            if rule.is_start_marker_for_year_start() {
                year_start(start_year)
                    .saturating_add_ticks(-dst_start_offset.ticks())
            } else {
                window.start.saturating_add_ticks(-dst_start_offset.ticks())
            }
        });

        let dst_end_offset = base
            .unchecked_add(rule.base_utc_offset_delta())
            .unchecked_add(rule.daylight_delta());
        let end_year = window.end.year() as i32;
        let mut end_time = None;
        if rule.is_end_marker_for_year_end() && end_year < 9999 {
            let probe = year_start(end_year + 1);
            if let Some((next_index, next_rule)) = self.rule_for_wall(probe) {
                if next_rule.is_start_marker_for_year_start() {
                    ignore_year_adjustment = true;
                    let next_offset = base
                        .unchecked_add(next_rule.base_utc_offset_delta())
                        .unchecked_add(next_rule.daylight_delta());
                    end_time = Some(if next_rule.is_end_marker_for_year_end()
                    {
                        // The next year closes inside daylight time as
                        // well; extend to its end and let its own query
                        // pick up from there.
                        year_december_31(end_year + 1)
                            .saturating_add_ticks(-next_offset.ticks())
                    } else {
                        let next_window = self.daylight_window(
                            end_year + 1,
                            next_index,
                            next_rule,
                        );
                        next_window
                            .end
                            .saturating_add_ticks(-next_offset.ticks())
                    });
                }
            }
        }
        let end_time = end_time.unwrap_or_else(|| {
            if rule.is_end_marker_for_year_end() {
                year_end(end_year)
                    .saturating_add_ticks(-dst_end_offset.ticks())
            } else {
                window.end.saturating_add_ticks(-dst_end_offset.ticks())
            }
        });

        let (ambiguous_lo, ambiguous_hi) = if window.delta.is_positive() {
            (
                end_time.saturating_add_ticks(-window.delta.ticks()),
                end_time,
            )
        } else {
            (
                start_time,
                start_time.saturating_add_ticks(-window.delta.ticks()),
            )
        };

        let is_dst = check_is_dst(
            start_time,
            time,
            end_time,
            ignore_year_adjustment,
            rule,
        );
        let mut ambiguous = false;
        if is_dst {
            ambiguous =
                in_window_with_year_shifts(ambiguous_lo, time, ambiguous_hi);
        }
        (is_dst, ambiguous)
    }

    /// The wall-side offset query.
    fn offset_from_wall(&self, dt: CalendarDateTime) -> Offset {
        let mut offset = self.base_utc_offset;
        if let Some((index, rule)) = self.rule_for_wall(dt) {
            offset = offset.unchecked_add(rule.base_utc_offset_delta());
            if rule.has_daylight_saving() {
                let window =
                    self.daylight_window(dt.year() as i32, index, rule);
                if self.is_daylight_savings_wall(dt, rule, &window) {
                    offset = offset.unchecked_add(rule.daylight_delta());
                }
            }
        }
        offset
    }
}

/// The rule immediately preceding `rule` in the zone's ordered array, or
/// `rule` itself when none exists.
fn previous_rule<'r>(
    rules: &'r [AdjustmentRule],
    index: usize,
    rule: &'r AdjustmentRule,
) -> &'r AdjustmentRule {
    if index > 0 {
        &rules[index - 1]
    } else {
        rule
    }
}

/// The sum of a zone's base offset with everything a rule can add to it.
fn total_offset(base: Offset, rule: &AdjustmentRule) -> Offset {
    let mut total = base.unchecked_add(rule.base_utc_offset_delta());
    if rule.has_daylight_saving() {
        total = total.unchecked_add(rule.daylight_delta());
    }
    total
}

/// Pushes a wall reading to UTC with the given offsets.
fn wall_to_utc(
    dt: CalendarDateTime,
    base: Offset,
    daylight_delta: Offset,
    base_delta: Offset,
) -> CalendarDateTime {
    let total = base.unchecked_add(base_delta).unchecked_add(daylight_delta);
    dt.saturating_add_ticks(-total.ticks())
}

/// January 1, midnight, of the given year.
fn year_start(year: i32) -> CalendarDateTime {
    let year = year.clamp(1, 9999);
    CalendarDateTime::new(year as i16, 1, 1, 0, 0, 0, 0, Tag::Unspecified)
        .expect("January 1 of a clamped year is always valid")
}

/// December 31, midnight, of the given year.
fn year_december_31(year: i32) -> CalendarDateTime {
    let year = year.clamp(1, 9999);
    CalendarDateTime::new(year as i16, 12, 31, 0, 0, 0, 0, Tag::Unspecified)
        .expect("December 31 of a clamped year is always valid")
}

/// The very last tick of the given year.
fn year_end(year: i32) -> CalendarDateTime {
    let year = year.clamp(1, 9999);
    let ticks = days_from_civil(year + 1, 1, 1) * TICKS_PER_DAY - 1;
    CalendarDateTime::from_ticks(ticks.min(MAX_TICKS), Tag::Unspecified)
        .expect("the last tick of a clamped year is always in range")
}

/// The core daylight-or-not comparison shared by the wall and UTC paths.
///
/// When the window's endpoints landed in different years (a base offset
/// shift near January 1 can do that), the end and the probe are first
/// normalized into the start's year. A window whose start is after its end
/// wraps the year boundary: southern-hemisphere daylight time runs across
/// December 31, so the probe matches when it is before the end *or* at or
/// after the start. Rules without yearly transitions are daylight over
/// their entire window, both endpoints inclusive.
fn check_is_dst(
    start: CalendarDateTime,
    mut time: CalendarDateTime,
    mut end: CalendarDateTime,
    ignore_year_adjustment: bool,
    rule: &AdjustmentRule,
) -> bool {
    if !ignore_year_adjustment && !rule.no_daylight_transitions() {
        let start_year = start.year() as i32;
        let end_year = end.year() as i32;
        if start_year != end_year {
            if let Ok(shifted) = end.add_years(start_year - end_year) {
                end = shifted;
            }
        }
        let time_year = time.year() as i32;
        if start_year != time_year {
            if let Ok(shifted) = time.add_years(start_year - time_year) {
                time = shifted;
            }
        }
    }
    if start > end {
        time < end || time >= start
    } else if rule.no_daylight_transitions() {
        start <= time && time <= end
    } else {
        start <= time && time < end
    }
}

/// Half-open window membership, also trying the window shifted one year in
/// either direction when it straddles a year boundary.
fn in_window_with_year_shifts(
    lo: CalendarDateTime,
    time: CalendarDateTime,
    hi: CalendarDateTime,
) -> bool {
    if lo <= time && time < hi {
        return true;
    }
    if lo.year() == hi.year() {
        return false;
    }
    for shift in [1, -1] {
        if let (Ok(lo), Ok(hi)) = (lo.add_years(shift), hi.add_years(shift)) {
            if lo <= time && time < hi {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::tz::TransitionTime;

    use super::*;

    fn date(year: i16, month: i8, day: i8, tag: Tag) -> CalendarDateTime {
        CalendarDateTime::new(year, month, day, 0, 0, 0, 0, tag).unwrap()
    }

    fn wall(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
    ) -> CalendarDateTime {
        CalendarDateTime::new(
            year,
            month,
            day,
            hour,
            minute,
            0,
            0,
            Tag::Unspecified,
        )
        .unwrap()
    }

    fn at(hour: i8, minute: i8) -> CalendarDateTime {
        CalendarDateTime::new(1, 1, 1, hour, minute, 0, 0, Tag::Unspecified)
            .unwrap()
    }

    /// A Pacific-like zone: -08:00 with +1h daylight time between the
    /// second Sunday of March and the first Sunday of November, 02:00.
    fn pacific() -> Zone {
        let rule = AdjustmentRule::new(
            date(1, 1, 1, Tag::Unspecified),
            date(9999, 12, 31, Tag::Unspecified),
            Offset::constant(1),
            TransitionTime::floating(at(2, 0), 3, 2, 0).unwrap(),
            TransitionTime::floating(at(2, 0), 11, 1, 0).unwrap(),
            Offset::ZERO,
        )
        .unwrap();
        Zone::new(
            "Test/Pacific",
            "Pacific Time",
            "PST",
            "PDT",
            Offset::constant(-8),
            Some(vec![rule]),
        )
        .unwrap()
    }

    /// A southern-hemisphere zone: +10:00 with daylight time wrapping the
    /// year boundary, first Sunday of October to first Sunday of April.
    fn southern() -> Zone {
        let rule = AdjustmentRule::new(
            date(1, 1, 1, Tag::Unspecified),
            date(9999, 12, 31, Tag::Unspecified),
            Offset::constant(1),
            TransitionTime::floating(at(2, 0), 10, 1, 0).unwrap(),
            TransitionTime::floating(at(3, 0), 4, 1, 0).unwrap(),
            Offset::ZERO,
        )
        .unwrap();
        Zone::new(
            "Test/Southern",
            "Southern Time",
            "ST",
            "SDT",
            Offset::constant(10),
            Some(vec![rule]),
        )
        .unwrap()
    }

    /// A zone like Moscow across the 2011 permanent-daylight change:
    /// +03:00 base, daylight from the last Sunday of March 2011 straight
    /// through to the last Sunday of October 2012. The 2011 rule ends at
    /// the year-edge marker and the 2012 rule starts at one, so the
    /// daylight stretch crosses December 31 without a transition.
    fn year_spanning() -> Zone {
        let marker_start = TransitionTime::fixed(at(0, 0), 1, 1).unwrap();
        let marker_end = TransitionTime::fixed(
            CalendarDateTime::new(1, 1, 1, 0, 0, 0, 1, Tag::Unspecified)
                .unwrap(),
            1,
            1,
        )
        .unwrap();
        let rule_2011 = AdjustmentRule::new(
            date(2011, 1, 1, Tag::Unspecified),
            date(2011, 12, 31, Tag::Unspecified),
            Offset::constant(1),
            TransitionTime::floating(at(2, 0), 3, 5, 0).unwrap(),
            marker_end,
            Offset::ZERO,
        )
        .unwrap();
        let rule_2012 = AdjustmentRule::new(
            date(2012, 1, 1, Tag::Unspecified),
            date(2012, 12, 31, Tag::Unspecified),
            Offset::constant(1),
            marker_start,
            TransitionTime::floating(at(2, 0), 10, 5, 0).unwrap(),
            Offset::ZERO,
        )
        .unwrap();
        Zone::new(
            "Test/YearSpanning",
            "Year Spanning Time",
            "YST",
            "YDT",
            Offset::constant(3),
            Some(vec![rule_2011, rule_2012]),
        )
        .unwrap()
    }

    fn utc_instant(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
    ) -> Instant {
        let dt = CalendarDateTime::new(
            year,
            month,
            day,
            hour,
            minute,
            0,
            0,
            Tag::Absolute,
        )
        .unwrap();
        dt.to_instant().unwrap()
    }

    #[test]
    fn spring_forward_gap_is_invalid() {
        let zone = pacific();
        let gap = wall(2007, 3, 11, 2, 30);
        assert!(zone.is_invalid(gap));
        assert!(!zone.is_ambiguous(gap));

        let err =
            Zone::convert(gap, &zone, &Zone::utc(), ConvertOptions::new())
                .unwrap_err();
        assert!(err.is_invalid_time());

        let opts = ConvertOptions::new().no_throw_on_invalid_time(true);
        let utc = Zone::convert(gap, &zone, &Zone::utc(), opts).unwrap();
        assert_eq!(utc, date(2007, 3, 11, Tag::Absolute)
            .saturating_add_ticks(10 * crate::instant::TICKS_PER_HOUR
                + 30 * crate::instant::TICKS_PER_MINUTE));
        assert_eq!(utc.tag(), Tag::Absolute);
    }

    #[test]
    fn fall_back_fold_is_ambiguous() {
        let zone = pacific();
        let fold = wall(2007, 11, 4, 1, 30);
        assert!(zone.is_ambiguous(fold));
        assert!(!zone.is_invalid(fold));

        let offsets = zone.ambiguous_offsets(fold).unwrap();
        assert_eq!(offsets[0], Offset::constant(-8));
        assert_eq!(offsets[1], Offset::constant(-7));
    }

    #[test]
    fn ambiguous_offsets_rejects_plain_times(){
        let zone = pacific();
        let err = zone.ambiguous_offsets(wall(2007, 7, 1, 12, 0)).unwrap_err();
        assert!(err.is_not_ambiguous());

        let no_dst = Zone::fixed("Test/Fixed", Offset::constant(3)).unwrap();
        let err =
            no_dst.ambiguous_offsets(wall(2007, 11, 4, 1, 30)).unwrap_err();
        assert!(err.is_not_ambiguous());
    }

    #[test]
    fn plain_summer_and_winter_times() {
        let zone = pacific();
        assert!(zone.is_daylight_saving_time(wall(2007, 7, 1, 12, 0)));
        assert!(!zone.is_daylight_saving_time(wall(2007, 1, 1, 12, 0)));
        assert_eq!(
            zone.offset_at(wall(2007, 7, 1, 12, 0)),
            Offset::constant(-7)
        );
        assert_eq!(
            zone.offset_at(wall(2007, 1, 1, 12, 0)),
            Offset::constant(-8)
        );
    }

    #[test]
    fn southern_hemisphere_wraps_year_boundary() {
        let zone = southern();
        assert!(zone.is_daylight_saving_time(wall(2005, 1, 15, 12, 0)));
        assert!(!zone.is_daylight_saving_time(wall(2005, 7, 15, 12, 0)));
        assert_eq!(
            zone.offset_at(wall(2005, 1, 15, 12, 0)),
            Offset::constant(11)
        );
        assert_eq!(
            zone.offset_at(wall(2005, 7, 15, 12, 0)),
            Offset::constant(10)
        );
    }

    #[test]
    fn year_spanning_daylight_propagates_from_next_year() {
        let zone = year_spanning();
        let instant = utc_instant(2011, 12, 31, 20, 0);
        let info = zone.to_offset_info(instant);
        assert!(info.dst().is_dst());
        assert_eq!(info.offset(), Offset::constant(4));

        // Well inside 2012's daylight stretch.
        let instant = utc_instant(2012, 6, 1, 12, 0);
        assert_eq!(zone.to_offset(instant), Offset::constant(4));
        // After the last Sunday of October 2012.
        let instant = utc_instant(2012, 11, 15, 12, 0);
        assert_eq!(zone.to_offset(instant), Offset::constant(3));
    }

    #[test]
    fn utc_query_around_transitions() {
        let zone = pacific();
        // The 2007 spring transition happened at 2007-03-11T10:00 UTC.
        let before = utc_instant(2007, 3, 11, 9, 59);
        let after = utc_instant(2007, 3, 11, 10, 0);
        assert_eq!(zone.to_offset(before), Offset::constant(-8));
        assert_eq!(zone.to_offset(after), Offset::constant(-7));

        // The fall transition at 2007-11-04T09:00 UTC; the preceding hour
        // of instants maps to ambiguous wall times.
        let folded = utc_instant(2007, 11, 4, 8, 30);
        let info = zone.to_offset_info(folded);
        assert!(info.dst().is_dst());
        assert!(info.is_ambiguous_dst());
        let after_fold = utc_instant(2007, 11, 4, 9, 30);
        let info = zone.to_offset_info(after_fold);
        assert!(info.dst().is_std());
        assert!(!info.is_ambiguous_dst());
    }

    #[test]
    fn round_trip_through_utc_picks_fold_side() {
        let zone = pacific();
        // An instant on the daylight side of the fold.
        let instant = utc_instant(2007, 11, 4, 8, 30);
        let wall_dt = Zone::convert(
            CalendarDateTime::from_instant(instant, Tag::Absolute),
            &Zone::utc(),
            &zone,
            ConvertOptions::new(),
        )
        .unwrap();
        assert_eq!(wall_dt.tag(), Tag::Wall);
        assert!(wall_dt.is_dst_if_ambiguous());
        let back =
            Zone::convert(wall_dt, &zone, &Zone::utc(), ConvertOptions::new())
                .unwrap();
        assert_eq!(back.ticks(), instant.ticks());

        // And one on the standard side mapping to the same wall reading.
        let instant = utc_instant(2007, 11, 4, 9, 30);
        let wall_dt = Zone::convert(
            CalendarDateTime::from_instant(instant, Tag::Absolute),
            &Zone::utc(),
            &zone,
            ConvertOptions::new(),
        )
        .unwrap();
        assert!(!wall_dt.is_dst_if_ambiguous());
        let back =
            Zone::convert(wall_dt, &zone, &Zone::utc(), ConvertOptions::new())
                .unwrap();
        assert_eq!(back.ticks(), instant.ticks());
    }

    #[test]
    fn convert_checks_tags() {
        let zone = pacific();
        let abs = date(2007, 7, 1, Tag::Absolute);
        let err =
            Zone::convert(abs, &zone, &Zone::utc(), ConvertOptions::new())
                .unwrap_err();
        assert!(err.is_tag_mismatch());

        let wall_dt = wall(2007, 7, 1, 12, 0).with_tag(Tag::Wall);
        let err = Zone::convert(
            wall_dt,
            &Zone::utc(),
            &zone,
            ConvertOptions::new(),
        )
        .unwrap_err();
        assert!(err.is_tag_mismatch());
    }

    #[test]
    fn zone_equality_ignores_display_names_and_id_case() {
        let a = pacific();
        let rule = a.adjustment_rules().unwrap().to_vec();
        let b = Zone::new(
            "test/pacific",
            "Some Other Display",
            "Std",
            "Dlt",
            Offset::constant(-8),
            Some(rule),
        )
        .unwrap();
        assert_eq!(a, b);

        let c = Zone::new(
            "Test/Pacific",
            "Pacific Time",
            "PST",
            "PDT",
            Offset::constant(-7),
            a.adjustment_rules().map(<[_]>::to_vec),
        )
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn construction_rejects_bad_zones() {
        assert!(Zone::fixed("", Offset::UTC).is_err());
        assert!(Zone::fixed("bad\0id", Offset::UTC).is_err());
        assert!(Zone::fixed("Too/East", Offset::constant_minutes(15 * 60))
            .is_err());

        // Overlapping rule windows are rejected.
        let mk_rule = |y1: i16, y2: i16| {
            AdjustmentRule::new(
                date(y1, 1, 1, Tag::Unspecified),
                date(y2, 12, 31, Tag::Unspecified),
                Offset::constant(1),
                TransitionTime::floating(at(2, 0), 3, 2, 0).unwrap(),
                TransitionTime::floating(at(2, 0), 11, 1, 0).unwrap(),
                Offset::ZERO,
            )
            .unwrap()
        };
        let result = Zone::new(
            "Test/Overlap",
            "",
            "",
            "",
            Offset::constant(-8),
            Some(vec![mk_rule(2000, 2010), mk_rule(2010, 2020)]),
        );
        assert!(result.unwrap_err().is_invalid_zone());
    }

    #[test]
    fn no_rule_match_falls_back_to_base() {
        let rule = AdjustmentRule::new(
            date(2000, 1, 1, Tag::Unspecified),
            date(2000, 12, 31, Tag::Unspecified),
            Offset::constant(1),
            TransitionTime::floating(at(2, 0), 3, 2, 0).unwrap(),
            TransitionTime::floating(at(2, 0), 11, 1, 0).unwrap(),
            Offset::ZERO,
        )
        .unwrap();
        let zone = Zone::new(
            "Test/Sparse",
            "",
            "",
            "",
            Offset::constant(-8),
            Some(vec![rule]),
        )
        .unwrap();
        assert_eq!(
            zone.offset_at(wall(2024, 7, 1, 12, 0)),
            Offset::constant(-8)
        );
        assert!(!zone.is_daylight_saving_time(wall(2024, 7, 1, 12, 0)));
    }

    #[test]
    fn utc_sentinel() {
        let utc = Zone::utc();
        assert!(utc.is_utc());
        assert!(!utc.supports_daylight_saving_time());
        assert_eq!(utc.to_offset(Instant::MIN), Offset::UTC);
        assert!(!pacific().is_utc());
    }

    #[test]
    fn extreme_instants_resolve() {
        let zone = pacific();
        // Neither query may fall over at the edges of the representable
        // range, where adding the base offset would overflow.
        let _ = zone.to_offset_info(Instant::MIN);
        let _ = zone.to_offset_info(Instant::MAX);
        let east = southern();
        let _ = east.to_offset_info(Instant::MIN);
        let _ = east.to_offset_info(Instant::MAX);
    }

    quickcheck::quickcheck! {
        fn prop_offset_in_range(dt: CalendarDateTime) -> bool {
            for zone in [pacific(), southern(), year_spanning()] {
                let info = zone.inner.offset_info_from_utc(dt.ticks());
                let minutes = info.offset().minutes();
                if !(-14 * 60 <= minutes && minutes <= 14 * 60) {
                    return false;
                }
            }
            true
        }

        fn prop_round_trip_unless_invalid(dt: CalendarDateTime) -> bool {
            // In the first and last representable year the intermediate
            // instant can clamp at the edge of the time line, which loses
            // information by construction.
            if dt.year() == 1 || dt.year() == 9999 {
                return true;
            }
            let utc = Zone::utc();
            for zone in [pacific(), southern(), year_spanning()] {
                if zone.is_invalid(dt) {
                    continue;
                }
                let through = Zone::convert(
                    dt,
                    &zone,
                    &utc,
                    ConvertOptions::new(),
                )
                .and_then(|u| {
                    Zone::convert(u, &utc, &zone, ConvertOptions::new())
                });
                match through {
                    Ok(back) => {
                        if back.ticks() != dt.ticks() {
                            return false;
                        }
                    }
                    Err(_) => return false,
                }
            }
            true
        }

        fn prop_ambiguous_and_invalid_exclusive(
            dt: CalendarDateTime
        ) -> bool {
            for zone in [pacific(), southern(), year_spanning()] {
                if zone.is_ambiguous(dt) && zone.is_invalid(dt) {
                    return false;
                }
            }
            let fixed = Zone::fixed("Test/Plain", Offset::constant(5))
                .unwrap();
            !fixed.is_ambiguous(dt) && !fixed.is_invalid(dt)
        }

        fn prop_ambiguous_offsets_sorted(dt: CalendarDateTime) -> bool {
            for zone in [pacific(), southern()] {
                if !zone.is_ambiguous(dt) {
                    continue;
                }
                let Ok([lo, hi]) = zone.ambiguous_offsets(dt) else {
                    return false;
                };
                if lo >= hi {
                    return false;
                }
                let delta = zone.adjustment_rules().unwrap()[0]
                    .daylight_delta();
                if hi.minutes() - lo.minutes() != delta.minutes().abs() {
                    return false;
                }
            }
            true
        }
    }
}
