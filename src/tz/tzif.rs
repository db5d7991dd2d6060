/*!
Support for compiled binary zone files (versions 1, 2 and 3).

These are the files commonly found under `/usr/share/zoneinfo` on Unix
systems. This module parses the raw sections of such a file and converts
its transition history into the adjustment-rule model: one no-transition
rule per recorded stretch between transitions, plus a tail rule from the
trailing extended-future string when one is present.

Callers may assume that it is safe to pass arbitrary or even untrusted
data to the decoder and count on it not panicking or using resources that
aren't limited to a small constant factor of the size of the data itself.
*/

use crate::{
    civil::{CalendarDateTime, Tag},
    error::{err, err_context, Error},
    instant::{
        Instant, DAYS_TO_UNIX_EPOCH, MAX_TICKS, TICKS_PER_DAY,
        TICKS_PER_SECOND,
    },
    tz::{posix, AdjustmentRule, Offset, TransitionTime, Zone},
    util::escape::Bytes,
};

/// 1970-01-01T00:00:00 UTC in ticks.
const UNIX_EPOCH_TICKS: i64 = DAYS_TO_UNIX_EPOCH * TICKS_PER_DAY;

/// The bounds we accept for a local time type's offset, in seconds. This is
/// `±25:59:59`; no real zone has ever come close to the boundary, so
/// anything outside it is treated as a malformed file rather than clamped.
const TYPE_OFFSET_MIN: i64 = -93_599;
const TYPE_OFFSET_MAX: i64 = 93_599;

/// Does a quick check that returns true if the data might be in the binary
/// zone file format.
///
/// A false positive is allowed, but a false negative is not: this never
/// returns false for data the decoder would accept.
pub(crate) fn is_possibly_tzif(data: &[u8]) -> bool {
    data.starts_with(b"TZif")
}

impl Zone {
    /// Decodes a compiled binary zone file into a zone with the given
    /// identifier.
    ///
    /// Versions 1, 2 and 3 are accepted. For versions 2 and 3 the 64-bit
    /// data block is authoritative and the trailing extended-future string,
    /// when non-empty, becomes the zone's final rule. Display names fall
    /// back to the abbreviations embedded in the file.
    pub fn from_tzif(id: impl Into<String>, bytes: &[u8]) -> Result<Zone, Error> {
        let id = id.into();
        let parsed = Parsed::parse(bytes).map_err(|e| {
            err_context!(e, InvalidZone, "failed to decode zone `{id}`")
        })?;
        parsed.into_zone(id)
    }
}

/// One local time type record: an offset, a daylight flag and a range into
/// the designation string.
#[derive(Debug)]
struct LocalType {
    offset_seconds: i64,
    is_dst: bool,
    designation: core::ops::Range<usize>,
}

/// The raw sections of a binary zone file, before rule conversion.
#[derive(Debug)]
struct Parsed {
    /// Transition times as Unix seconds, ascending.
    transitions: Vec<i64>,
    /// One type index per transition.
    type_indices: Vec<u8>,
    types: Vec<LocalType>,
    /// NUL-delimited abbreviations.
    designations: String,
    /// The extended-future string between the trailing newlines, when
    /// present and non-empty.
    tail: Option<Vec<u8>>,
}

impl Parsed {
    fn parse(bytes: &[u8]) -> Result<Parsed, Error> {
        let header32 = Header::parse(4, bytes)?;
        if header32.version == 0 {
            let (parsed, _) = Parsed::parse_block(&header32, &bytes[44..])?;
            Ok(parsed)
        } else {
            // Skip the 32-bit compatibility payload and re-parse the header
            // right after it; versions 2 and 3 carry their real data in the
            // 64-bit block.
            let rest = &bytes[44..];
            let v1_len = header32.data_block_len()?;
            if v1_len > rest.len() {
                return Err(err!(
                    InvalidZone,
                    "32-bit data block is longer than the file",
                ));
            }
            let rest = &rest[v1_len..];
            let header64 = Header::parse(8, rest)?;
            let (mut parsed, rest) =
                Parsed::parse_block(&header64, &rest[44..])?;
            parsed.parse_footer(rest)?;
            Ok(parsed)
        }
    }

    /// Parses one data block (everything between a header and the next
    /// header or footer), returning the remainder.
    fn parse_block<'b>(
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<(Parsed, &'b [u8]), Error> {
        let mut parsed = Parsed {
            transitions: Vec::with_capacity(header.timecnt),
            type_indices: Vec::with_capacity(header.timecnt),
            types: Vec::with_capacity(header.typecnt),
            designations: String::new(),
            tail: None,
        };
        let rest = parsed.parse_transitions(header, bytes)?;
        let rest = parsed.parse_type_indices(header, rest)?;
        let rest = parsed.parse_types(header, rest)?;
        let rest = parsed.parse_designations(header, rest)?;
        let rest = parsed.parse_leap_seconds(header, rest)?;
        let rest = parsed.parse_indicators(header, rest)?;
        Ok((parsed, rest))
    }

    fn parse_transitions<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (bytes, rest) = try_split_at(
            "transition times",
            bytes,
            header.transition_times_len()?,
        )?;
        for chunk in bytes.chunks_exact(header.time_size) {
            let time = if header.is_32bit() {
                i64::from(from_be_bytes_i32(chunk))
            } else {
                from_be_bytes_i64(chunk)
            };
            if let Some(&prev) = self.transitions.last() {
                if time < prev {
                    return Err(err!(
                        InvalidZone,
                        "transition times are not sorted: {time} follows \
                         {prev}",
                    ));
                }
            }
            self.transitions.push(time);
        }
        Ok(rest)
    }

    fn parse_type_indices<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (bytes, rest) =
            try_split_at("transition types", bytes, header.timecnt)?;
        for &index in bytes {
            if usize::from(index) >= header.typecnt {
                return Err(err!(
                    InvalidZone,
                    "transition type index {index} exceeds the number of \
                     local time types ({count})",
                    count = header.typecnt,
                ));
            }
            self.type_indices.push(index);
        }
        Ok(rest)
    }

    fn parse_types<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (bytes, rest) = try_split_at(
            "local time types",
            bytes,
            header.local_time_types_len()?,
        )?;
        for chunk in bytes.chunks_exact(6) {
            let offset_seconds = i64::from(from_be_bytes_i32(&chunk[..4]));
            if !(TYPE_OFFSET_MIN..=TYPE_OFFSET_MAX).contains(&offset_seconds)
            {
                return Err(err!(
                    InvalidZone,
                    "local time type offset of {offset_seconds} seconds is \
                     out of range",
                ));
            }
            let is_dst = chunk[4] == 1;
            let start = usize::from(chunk[5]);
            self.types.push(LocalType {
                offset_seconds,
                is_dst,
                // The end is resolved once the designations are read.
                designation: start..start,
            });
        }
        Ok(rest)
    }

    fn parse_designations<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (bytes, rest) =
            try_split_at("time zone designations", bytes, header.charcnt)?;
        self.designations =
            String::from_utf8(bytes.to_vec()).map_err(|_| {
                err!(
                    InvalidZone,
                    "time zone designations are not valid UTF-8: `{}`",
                    Bytes(bytes),
                )
            })?;
        for typ in self.types.iter_mut() {
            let start = typ.designation.start;
            let suffix =
                self.designations.get(start..).ok_or_else(|| {
                    err!(
                        InvalidZone,
                        "designation index {start} is out of bounds",
                    )
                })?;
            let len = suffix.find('\x00').ok_or_else(|| {
                err!(
                    InvalidZone,
                    "designation at index {start} has no NUL terminator",
                )
            })?;
            typ.designation = start..start + len;
        }
        Ok(rest)
    }

    /// Leap second records are parsed for their length and otherwise
    /// ignored; leap second resolution is out of scope.
    fn parse_leap_seconds<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (_, rest) =
            try_split_at("leap seconds", bytes, header.leap_second_len()?)?;
        Ok(rest)
    }

    /// The standard/wall and UT/local indicators contribute nothing to rule
    /// evaluation; their sections are length-checked and skipped.
    fn parse_indicators<'b>(
        &mut self,
        header: &Header,
        bytes: &'b [u8],
    ) -> Result<&'b [u8], Error> {
        let (_, rest) = try_split_at(
            "standard/wall indicators",
            bytes,
            header.isstdcnt,
        )?;
        let (_, rest) =
            try_split_at("UT/local indicators", rest, header.isutcnt)?;
        Ok(rest)
    }

    fn parse_footer(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.first() != Some(&b'\n') {
            return Err(err!(
                InvalidZone,
                "expected newline at the start of the footer",
            ));
        }
        let bytes = &bytes[1..];
        // Only scan a bounded prefix for the terminator in case we somehow
        // got handed a huge trailing buffer.
        let toscan = &bytes[..bytes.len().min(1024)];
        let end = toscan.iter().position(|&b| b == b'\n').ok_or_else(|| {
            err!(InvalidZone, "footer has no terminating newline")
        })?;
        if end > 0 {
            self.tail = Some(bytes[..end].to_vec());
        }
        Ok(())
    }

    fn designation(&self, typ: &LocalType) -> &str {
        &self.designations[typ.designation.clone()]
    }

    /// Converts the parsed sections into a zone.
    fn into_zone(self, id: String) -> Result<Zone, Error> {
        let (base, standard_name, daylight_name) = self.select_base();
        debug!(
            "zone `{id}`: base offset {base}, {count} transitions",
            count = self.transitions.len(),
        );
        let rules = self.generate_rules(base).map_err(|e| {
            err_context!(e, InvalidZone, "failed to decode zone `{id}`")
        })?;
        Zone::new(
            id,
            standard_name.clone(),
            standard_name,
            daylight_name,
            base,
            rules,
        )
    }

    /// Chooses the zone's base offset and display names: the most recent
    /// standard-time type among transitions up to the current wall clock,
    /// starting from the first standard-time type (or the first type at
    /// all) as the default.
    fn select_base(&self) -> (Offset, String, String) {
        let default_type = self
            .types
            .iter()
            .find(|t| !t.is_dst)
            .or_else(|| self.types.first())
            .expect("the header guarantees at least one local time type");
        let mut base_seconds = default_type.offset_seconds;
        let mut standard = self.designation(default_type).to_string();
        let mut daylight = None;

        let now_seconds =
            (Instant::now().ticks() - UNIX_EPOCH_TICKS) / TICKS_PER_SECOND;
        for (i, &when) in self.transitions.iter().enumerate() {
            if when > now_seconds {
                break;
            }
            let typ = &self.types[usize::from(self.type_indices[i])];
            if typ.is_dst {
                daylight = Some(self.designation(typ).to_string());
            } else {
                base_seconds = typ.offset_seconds;
                standard = self.designation(typ).to_string();
            }
        }

        // Whole minutes only; second-level history truncates.
        let base = Offset::from_seconds_truncated(base_seconds)
            .unwrap_or(Offset::ZERO);
        let daylight = daylight.unwrap_or_else(|| standard.clone());
        (base, standard, daylight)
    }

    /// Converts the transition history into adjustment rules.
    fn generate_rules(
        &self,
        base: Offset,
    ) -> Result<Option<Vec<AdjustmentRule>>, Error> {
        if self.transitions.is_empty() {
            return Ok(None);
        }
        let dts: Vec<CalendarDateTime> = self
            .transitions
            .iter()
            .map(|&seconds| unix_to_calendar(seconds))
            .collect();
        let mut rules = Vec::new();
        let mut index = 0;

        // Newer files begin with a "big bang" transition before year one.
        // Times that early all collapse onto the first representable
        // instant, and the opening rule below covers them.
        while index < dts.len() && dts[index].ticks() == 0 {
            index += 1;
        }

        if index < dts.len() {
            // The opening rule runs from the first representable instant to
            // the first real transition, under the earliest standard type.
            let typ = self.early_type();
            let (daylight, base_delta) = split_offset(typ, base)?;
            let rule = AdjustmentRule::new_no_transitions(
                CalendarDateTime::MIN.with_tag(Tag::Absolute),
                dts[index].saturating_add_ticks(-1),
                daylight,
                base_delta,
            )?;
            rules.push(clamp_rule_offset(base, rule)?);
            index += 1;
        }

        while index < dts.len() {
            let start = dts[index - 1];
            let end = dts[index].saturating_add_ticks(-1);
            if end < start {
                // Transitions past year 9999 all clamp to the same final
                // tick; there is no window left to describe.
                warn!(
                    "skipping zero-length rule window at transition {index}",
                );
                index += 1;
                continue;
            }
            let typ =
                &self.types[usize::from(self.type_indices[index - 1])];
            let (daylight, base_delta) = split_offset(typ, base)?;
            let dst_start = if typ.is_dst {
                // Keep the daylight classification visible even when the
                // daylight offset has since become the base offset.
                TransitionTime::dst_sentinel()
            } else {
                TransitionTime::unused_start()
            };
            let rule = AdjustmentRule::new_no_transitions_with(
                start,
                end,
                daylight,
                base_delta,
                dst_start,
            )?;
            rules.push(clamp_rule_offset(base, rule)?);
            index += 1;
        }

        // Everything after the final transition: the extended-future rule
        // when the footer carries one, otherwise the final recorded type
        // held forever.
        let start = dts[dts.len() - 1];
        let rule = match self.tail {
            Some(ref tail) => posix::parse_tail_rule(tail, start, base)?,
            None => {
                let typ = &self.types
                    [usize::from(self.type_indices[dts.len() - 1])];
                let (daylight, base_delta) = split_offset(typ, base)?;
                let dst_start = if typ.is_dst {
                    TransitionTime::dst_sentinel()
                } else {
                    TransitionTime::unused_start()
                };
                AdjustmentRule::new_no_transitions_with(
                    start,
                    CalendarDateTime::MAX.with_tag(Tag::Absolute),
                    daylight,
                    base_delta,
                    dst_start,
                )?
            }
        };
        rules.push(clamp_rule_offset(base, rule)?);
        Ok(Some(rules))
    }

    /// The first standard-time type, or the first type when every type is
    /// daylight.
    fn early_type(&self) -> &LocalType {
        self.types
            .iter()
            .find(|t| !t.is_dst)
            .or_else(|| self.types.first())
            .expect("the header guarantees at least one local time type")
    }
}

/// Splits a type's offset relative to the zone base into the rule deltas:
/// daylight types carry it as the daylight delta, standard types as the
/// base offset correction.
fn split_offset(
    typ: &LocalType,
    base: Offset,
) -> Result<(Offset, Offset), Error> {
    let relative = Offset::from_seconds_truncated(
        typ.offset_seconds - i64::from(base.minutes()) * 60,
    )?;
    Ok(if typ.is_dst {
        (relative, Offset::ZERO)
    } else {
        (Offset::ZERO, relative)
    })
}

/// Some zones recorded stretches whose total offset leaves the supported
/// `±14:00` once the base offset snapshot has moved on (island zones that
/// hopped across the date line, for example). Rather than reject the whole
/// file, nudge the rule's base correction by the smallest amount that
/// brings the total back in range.
fn clamp_rule_offset(
    base: Offset,
    rule: AdjustmentRule,
) -> Result<AdjustmentRule, Error> {
    let mut total = base.unchecked_add(rule.base_utc_offset_delta());
    if rule.has_daylight_saving() {
        total = total.unchecked_add(rule.daylight_delta());
    }
    let bound = Offset::BASE_MAX_MINUTES;
    let adjustment = if total.minutes() > bound {
        bound - total.minutes()
    } else if total.minutes() < -bound {
        -bound - total.minutes()
    } else {
        return Ok(rule);
    };
    warn!(
        "adjusting rule base offset correction by {adjustment} minutes to \
         keep the total offset in range",
    );
    let base_delta = Offset::from_minutes(
        rule.base_utc_offset_delta().minutes() + adjustment,
    )?;
    if rule.no_daylight_transitions() {
        AdjustmentRule::new_no_transitions_with(
            rule.date_start(),
            rule.date_end(),
            rule.daylight_delta(),
            base_delta,
            rule.daylight_transition_start(),
        )
    } else {
        AdjustmentRule::new(
            rule.date_start(),
            rule.date_end(),
            rule.daylight_delta(),
            rule.daylight_transition_start(),
            rule.daylight_transition_end(),
            base_delta,
        )
    }
}

/// Converts Unix seconds to the calendar presentation of an instant,
/// clamping to the representable range.
fn unix_to_calendar(seconds: i64) -> CalendarDateTime {
    let ticks = seconds
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(UNIX_EPOCH_TICKS)
        .clamp(0, MAX_TICKS);
    CalendarDateTime::from_ticks(ticks, Tag::Absolute)
        .expect("clamped ticks are in range")
}

/// The fixed-size header of a binary zone file.
///
/// Version 2+ files have two headers: one for the 32-bit compatibility
/// data, and a second following that data which describes the 64-bit
/// block. Both use the same layout with big-endian 32-bit counts.
#[derive(Debug)]
struct Header {
    /// 4 for the 32-bit block, 8 for the 64-bit block.
    time_size: usize,
    /// 0 for version 1, otherwise the ASCII digit of the version.
    version: u8,
    isutcnt: usize,
    isstdcnt: usize,
    leapcnt: usize,
    timecnt: usize,
    typecnt: usize,
    charcnt: usize,
}

impl Header {
    fn parse(time_size: usize, bytes: &[u8]) -> Result<Header, Error> {
        assert!(time_size == 4 || time_size == 8);
        if bytes.len() < 44 {
            return Err(err!(InvalidZone, "header is too short"));
        }
        let (magic, rest) = bytes.split_at(4);
        if magic != b"TZif" {
            return Err(err!(
                InvalidZone,
                "magic bytes mismatch: expected `TZif`, got `{}`",
                Bytes(magic),
            ));
        }
        let version = match rest[0] {
            0 => 0,
            b'2' => b'2',
            b'3' => b'3',
            unknown => {
                return Err(err!(
                    InvalidZone,
                    "unsupported format version `{}`",
                    Bytes(&[unknown]),
                ));
            }
        };
        // One version byte and fifteen reserved bytes precede the counts.
        let rest = &rest[16..];
        let isutcnt = from_be_bytes_u32_to_usize(&rest[0..4])?;
        let isstdcnt = from_be_bytes_u32_to_usize(&rest[4..8])?;
        let leapcnt = from_be_bytes_u32_to_usize(&rest[8..12])?;
        let timecnt = from_be_bytes_u32_to_usize(&rest[12..16])?;
        let typecnt = from_be_bytes_u32_to_usize(&rest[16..20])?;
        let charcnt = from_be_bytes_u32_to_usize(&rest[20..24])?;

        if isutcnt != 0 && isutcnt != typecnt {
            return Err(err!(
                InvalidZone,
                "expected the number of UT/local indicators to be zero or \
                 equal to the number of local time types",
            ));
        }
        if isstdcnt != 0 && isstdcnt != typecnt {
            return Err(err!(
                InvalidZone,
                "expected the number of standard/wall indicators to be \
                 zero or equal to the number of local time types",
            ));
        }
        if typecnt < 1 {
            return Err(err!(
                InvalidZone,
                "expected at least one local time type",
            ));
        }
        if charcnt < 1 {
            return Err(err!(
                InvalidZone,
                "expected at least one byte of time zone designations",
            ));
        }
        Ok(Header {
            time_size,
            version,
            isutcnt,
            isstdcnt,
            leapcnt,
            timecnt,
            typecnt,
            charcnt,
        })
    }

    fn is_32bit(&self) -> bool {
        self.time_size == 4
    }

    /// The size of the data block described by this header, used to skip
    /// over the 32-bit compatibility payload of a version 2+ file.
    fn data_block_len(&self) -> Result<usize, Error> {
        let sections = [
            self.transition_times_len()?,
            self.timecnt,
            self.local_time_types_len()?,
            self.charcnt,
            self.leap_second_len()?,
            self.isstdcnt,
            self.isutcnt,
        ];
        sections.iter().try_fold(0usize, |sum, &len| {
            sum.checked_add(len).ok_or_else(|| {
                err!(InvalidZone, "data block length overflows")
            })
        })
    }

    fn transition_times_len(&self) -> Result<usize, Error> {
        self.timecnt.checked_mul(self.time_size).ok_or_else(|| {
            err!(InvalidZone, "number of transition times is too big")
        })
    }

    fn local_time_types_len(&self) -> Result<usize, Error> {
        self.typecnt.checked_mul(6).ok_or_else(|| {
            err!(InvalidZone, "number of local time types is too big")
        })
    }

    fn leap_second_len(&self) -> Result<usize, Error> {
        self.leapcnt.checked_mul(self.time_size + 4).ok_or_else(|| {
            err!(InvalidZone, "number of leap second records is too big")
        })
    }
}

/// Splits the given slice of bytes at the index given.
///
/// If the index is out of range, an error naming the section being read is
/// returned.
fn try_split_at<'b>(
    what: &'static str,
    bytes: &'b [u8],
    at: usize,
) -> Result<(&'b [u8], &'b [u8]), Error> {
    if at > bytes.len() {
        return Err(err!(
            InvalidZone,
            "expected {at} bytes for {what}, but only {len} remain",
            len = bytes.len(),
        ));
    }
    Ok(bytes.split_at(at))
}

fn from_be_bytes_u32_to_usize(bytes: &[u8]) -> Result<usize, Error> {
    let n = u32::from_be_bytes(bytes.try_into().unwrap());
    usize::try_from(n).map_err(|_| {
        err!(InvalidZone, "count {n} does not fit in this platform's usize")
    })
}

fn from_be_bytes_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes(bytes.try_into().unwrap())
}

fn from_be_bytes_i64(bytes: &[u8]) -> i64 {
    i64::from_be_bytes(bytes.try_into().unwrap())
}
