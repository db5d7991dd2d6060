/*!
The delimited textual serialization of a zone.

The format is a single line of `;`-separated fields with `[...]` groups for
rules and transition times:

```text
zone    = id ";" baseOffsetMinutes ";" display ";" standard ";" daylight ";" rule* ";"
rule    = "[" dateStart ";" dateEnd ";" daylightDeltaMinutes ";" ttStart ttEnd
          [ baseUtcOffsetDeltaMinutes ";" ] [ "1" ";" ] extension* "]" ";"
tt      = "[" isFixed ";" timeOfDay ";" month ";" (day | week ";" dayOfWeek) ";" "]" ";"
```

Dates use `MM:dd:yyyy` and times of day `HH:mm:ss.FFF`. Within any string
field the four characters `\ ; [ ]` are escaped by a backslash. Readers
must skip unknown trailing fields inside a rule or transition group, which
is what keeps the format forward-compatible.

This codec uses that latitude itself: a rule endpoint that carries more
than a bare date (a time of day, or an absolute designation, as the binary
decoder produces) is recorded in an extension token of the form
`sHH:mm:ss.FFFFFFFu` (`s`/`e` for start/end; trailing letter `u` for
absolute, `x` for unspecified). Older readers skip these; this codec reads
them back, so deserializing a serialized zone reproduces it exactly.
*/

use crate::{
    civil::{CalendarDateTime, Tag},
    error::{err, err_context, Error},
    instant::{
        TICKS_PER_HOUR, TICKS_PER_MILLISECOND, TICKS_PER_MINUTE,
        TICKS_PER_SECOND,
    },
    tz::{AdjustmentRule, Offset, TransitionTime, Zone},
    util::escape::Byte,
};

impl Zone {
    /// Serializes this zone to the textual format.
    pub fn to_serialized(&self) -> String {
        let mut out = String::new();
        push_escaped(&mut out, self.id());
        out.push(';');
        out.push_str(&self.base_utc_offset().minutes().to_string());
        out.push(';');
        push_escaped(&mut out, self.display_name());
        out.push(';');
        push_escaped(&mut out, self.standard_name());
        out.push(';');
        push_escaped(&mut out, self.daylight_name());
        out.push(';');
        for rule in self.adjustment_rules().unwrap_or(&[]) {
            serialize_rule(&mut out, rule);
        }
        out.push(';');
        out
    }

    /// Deserializes a zone from the textual format.
    pub fn from_serialized(text: &str) -> Result<Zone, Error> {
        let parser = Parser::new(text.as_bytes());
        parser.parse_zone()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Zone {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_serialized())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Zone {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Zone, D::Error> {
        struct ZoneVisitor;

        impl<'de> serde::de::Visitor<'de> for ZoneVisitor {
            type Value = Zone;

            fn expecting(
                &self,
                f: &mut core::fmt::Formatter,
            ) -> core::fmt::Result {
                f.write_str("a serialized zone string")
            }

            fn visit_str<E: serde::de::Error>(
                self,
                value: &str,
            ) -> Result<Zone, E> {
                Zone::from_serialized(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ZoneVisitor)
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        if matches!(ch, '\\' | ';' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn serialize_rule(out: &mut String, rule: &AdjustmentRule) {
    out.push('[');
    serialize_date(out, rule.date_start());
    out.push(';');
    serialize_date(out, rule.date_end());
    out.push(';');
    out.push_str(&rule.daylight_delta().minutes().to_string());
    out.push(';');
    serialize_transition(out, rule.daylight_transition_start());
    serialize_transition(out, rule.daylight_transition_end());
    let base_delta = rule.base_utc_offset_delta().minutes();
    if base_delta != 0 || rule.no_daylight_transitions() {
        // A bare `1` always means the no-transitions flag, so the one
        // delta value that collides with it is written with its sign.
        if base_delta == 1 {
            out.push_str("+1");
        } else {
            out.push_str(&base_delta.to_string());
        }
        out.push(';');
    }
    if rule.no_daylight_transitions() {
        out.push_str("1;");
    }
    serialize_endpoint_extension(out, 's', rule.date_start());
    serialize_endpoint_extension(out, 'e', rule.date_end());
    out.push_str("];");
}

fn serialize_date(out: &mut String, date: CalendarDateTime) {
    out.push_str(&format!(
        "{:02}:{:02}:{:04}",
        date.month(),
        date.day(),
        date.year(),
    ));
}

/// Writes the tail token restoring an endpoint's time of day and
/// designation, when the bare `MM:dd:yyyy` date loses information.
fn serialize_endpoint_extension(
    out: &mut String,
    which: char,
    endpoint: CalendarDateTime,
) {
    let time = endpoint.time_of_day_ticks();
    if time == 0 && endpoint.tag() == Tag::Unspecified {
        return;
    }
    let tag = match endpoint.tag() {
        Tag::Absolute => 'u',
        // Rule endpoints are never wall-tagged.
        Tag::Wall | Tag::Unspecified => 'x',
    };
    out.push(which);
    out.push_str(&format!(
        "{:02}:{:02}:{:02}.{:07}{tag}",
        time / TICKS_PER_HOUR,
        (time / TICKS_PER_MINUTE) % 60,
        (time / TICKS_PER_SECOND) % 60,
        time % TICKS_PER_SECOND,
    ));
    out.push(';');
}

fn serialize_transition(out: &mut String, tt: TransitionTime) {
    out.push('[');
    out.push_str(if tt.is_fixed_date() { "1" } else { "0" });
    out.push(';');
    serialize_time_of_day(out, tt.time_of_day());
    out.push(';');
    out.push_str(&tt.month().to_string());
    out.push(';');
    if tt.is_fixed_date() {
        out.push_str(&tt.day().to_string());
        out.push(';');
    } else {
        out.push_str(&tt.week().to_string());
        out.push(';');
        out.push_str(&tt.day_of_week().to_string());
        out.push(';');
    }
    out.push_str("];");
}

fn serialize_time_of_day(out: &mut String, time_of_day: CalendarDateTime) {
    out.push_str(&format!(
        "{:02}:{:02}:{:02}",
        time_of_day.hour(),
        time_of_day.minute(),
        time_of_day.second(),
    ));
    let millisecond = time_of_day.millisecond();
    if millisecond != 0 {
        let mut fraction = format!(".{millisecond:03}");
        while fraction.ends_with('0') {
            fraction.pop();
        }
        out.push_str(&fraction);
    }
}

/// The refinement of a rule endpoint parsed from an extension token.
#[derive(Clone, Copy, Debug)]
struct EndpointExtension {
    time_ticks: i64,
    tag: Tag,
}

/// A cursor over the serialized text.
struct Parser<'s> {
    text: &'s [u8],
    pos: core::cell::Cell<usize>,
}

impl<'s> Parser<'s> {
    fn new(text: &'s [u8]) -> Parser<'s> {
        Parser { text, pos: core::cell::Cell::new(0) }
    }

    fn parse_zone(&self) -> Result<Zone, Error> {
        let id = self.read_string("zone id")?;
        let base_minutes = self.read_int("base offset")?;
        let display_name = self.read_string("display name")?;
        let standard_name = self.read_string("standard name")?;
        let daylight_name = self.read_string("daylight name")?;
        let mut rules = Vec::new();
        while self.peek() == Some(b'[') {
            rules.push(self.parse_rule()?);
        }
        self.expect_separator("end of rules")?;
        if !self.is_done() {
            return Err(err!(
                Serialization,
                "unexpected trailing data after the zone terminator",
            ));
        }
        let base =
            Offset::from_minutes(base_minutes).map_err(|e| {
                err_context!(e, Serialization, "base offset is out of range")
            })?;
        let rules = if rules.is_empty() { None } else { Some(rules) };
        Zone::new(id, display_name, standard_name, daylight_name, base, rules)
            .map_err(|e| {
                err_context!(
                    e,
                    Serialization,
                    "deserialized fields do not form a valid zone",
                )
            })
    }

    fn parse_rule(&self) -> Result<AdjustmentRule, Error> {
        self.expect_open("rule")?;
        let start_date = self.read_date("rule start date")?;
        let end_date = self.read_date("rule end date")?;
        let delta_minutes = self.read_int("daylight delta")?;
        let transition_start = self.parse_transition()?;
        let transition_end = self.parse_transition()?;

        let mut base_delta: Option<i32> = None;
        let mut no_daylight_transitions = false;
        let mut start_extension: Option<EndpointExtension> = None;
        let mut end_extension: Option<EndpointExtension> = None;
        while self.peek() != Some(b']') {
            let token = self.read_string("rule field")?;
            if token == "1" {
                no_daylight_transitions = true;
            } else if let Some(ext) = parse_endpoint_extension(&token, 's') {
                start_extension = Some(ext);
            } else if let Some(ext) = parse_endpoint_extension(&token, 'e') {
                end_extension = Some(ext);
            } else if base_delta.is_none() {
                if let Ok(minutes) = parse_int(&token) {
                    base_delta = Some(minutes);
                }
                // A non-numeric token in this position is an unknown
                // future field; skip it.
            }
            // Any further unrecognized tokens are skipped for forward
            // compatibility.
        }
        self.expect_close("rule")?;
        self.expect_separator("rule")?;

        let date_start = apply_extension(start_date, start_extension);
        let date_end = apply_extension(end_date, end_extension);
        let daylight_delta =
            Offset::from_minutes(delta_minutes).map_err(|e| {
                err_context!(
                    e,
                    Serialization,
                    "daylight delta is out of range",
                )
            })?;
        let base_delta = Offset::from_minutes(base_delta.unwrap_or(0))
            .map_err(|e| {
                err_context!(
                    e,
                    Serialization,
                    "base offset correction is out of range",
                )
            })?;
        let rule = if no_daylight_transitions {
            AdjustmentRule::new_no_transitions_with(
                date_start,
                date_end,
                daylight_delta,
                base_delta,
                transition_start,
            )
        } else {
            AdjustmentRule::new(
                date_start,
                date_end,
                daylight_delta,
                transition_start,
                transition_end,
                base_delta,
            )
        };
        rule.map_err(|e| {
            err_context!(
                e,
                Serialization,
                "deserialized fields do not form a valid rule",
            )
        })
    }

    fn parse_transition(&self) -> Result<TransitionTime, Error> {
        self.expect_open("transition time")?;
        let shape = self.read_string("transition shape")?;
        let is_fixed = match shape.as_str() {
            "1" => true,
            "0" => false,
            other => {
                return Err(err!(
                    Serialization,
                    "expected `0` or `1` for the transition shape, \
                     but got `{other}`",
                ));
            }
        };
        let time_of_day = self.read_time_of_day()?;
        let month = self.read_small_int("transition month")?;
        let transition = if is_fixed {
            let day = self.read_small_int("transition day")?;
            TransitionTime::fixed(time_of_day, month, day)
        } else {
            let week = self.read_small_int("transition week")?;
            let day_of_week = self.read_small_int("transition weekday")?;
            TransitionTime::floating(time_of_day, month, week, day_of_week)
        };
        while self.peek() != Some(b']') {
            // Unknown trailing fields are skipped for forward
            // compatibility.
            self.read_string("transition field")?;
        }
        self.expect_close("transition time")?;
        self.expect_separator("transition time")?;
        transition.map_err(|e| {
            err_context!(
                e,
                Serialization,
                "deserialized fields do not form a valid transition time",
            )
        })
    }

    /// Reads one escaped string field and its trailing separator.
    fn read_string(&self, what: &'static str) -> Result<String, Error> {
        let mut value = Vec::new();
        loop {
            let Some(byte) = self.peek() else {
                return Err(err!(
                    Serialization,
                    "unexpected end of input while reading {what}",
                ));
            };
            match byte {
                b';' => {
                    self.bump();
                    break;
                }
                b'[' | b']' => {
                    return Err(err!(
                        Serialization,
                        "missing `;` separator after {what}",
                    ));
                }
                b'\\' => {
                    self.bump();
                    match self.peek() {
                        Some(escaped @ (b'\\' | b';' | b'[' | b']')) => {
                            value.push(escaped);
                            self.bump();
                        }
                        Some(other) => {
                            return Err(err!(
                                Serialization,
                                "invalid escape sequence `\\{}` in {what}",
                                Byte(other),
                            ));
                        }
                        None => {
                            return Err(err!(
                                Serialization,
                                "dangling backslash at end of {what}",
                            ));
                        }
                    }
                }
                _ => {
                    value.push(byte);
                    self.bump();
                }
            }
        }
        String::from_utf8(value).map_err(|_| {
            err!(Serialization, "{what} is not valid UTF-8")
        })
    }

    fn read_int(&self, what: &'static str) -> Result<i32, Error> {
        let token = self.read_string(what)?;
        parse_int(&token).map_err(|_| {
            err!(Serialization, "expected a number for {what}, got `{token}`")
        })
    }

    fn read_small_int(&self, what: &'static str) -> Result<i8, Error> {
        let value = self.read_int(what)?;
        i8::try_from(value).map_err(|_| {
            err!(Serialization, "{what} {value} is out of range")
        })
    }

    /// Reads a `MM:dd:yyyy` date field.
    fn read_date(
        &self,
        what: &'static str,
    ) -> Result<CalendarDateTime, Error> {
        let token = self.read_string(what)?;
        let parts: Vec<&str> = token.split(':').collect();
        let [month, day, year] = parts.as_slice() else {
            return Err(err!(
                Serialization,
                "expected {what} in `MM:dd:yyyy` form, got `{token}`",
            ));
        };
        let (month, day, year) = (
            parse_int(month),
            parse_int(day),
            parse_int(year),
        );
        let (Ok(month), Ok(day), Ok(year)) = (month, day, year) else {
            return Err(err!(
                Serialization,
                "expected {what} in `MM:dd:yyyy` form, got `{token}`",
            ));
        };
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
        .map_err(|e| {
            err_context!(e, Serialization, "{what} `{token}` is not a date")
        })
    }

    /// Reads a `HH:mm:ss[.FFF]` time-of-day field.
    fn read_time_of_day(&self) -> Result<CalendarDateTime, Error> {
        let token = self.read_string("transition time of day")?;
        parse_time_of_day_token(&token, 3)
            .and_then(|ticks| {
                CalendarDateTime::from_ticks(ticks, Tag::Unspecified).ok()
            })
            .ok_or_else(|| {
                err!(
                    Serialization,
                    "expected a time of day in `HH:mm:ss.FFF` form, got \
                     `{token}`",
                )
            })
    }

    fn expect_open(&self, what: &'static str) -> Result<(), Error> {
        if self.peek() != Some(b'[') {
            return Err(err!(
                Serialization,
                "expected `[` to open a {what}",
            ));
        }
        self.bump();
        Ok(())
    }

    fn expect_close(&self, what: &'static str) -> Result<(), Error> {
        if self.peek() != Some(b']') {
            return Err(err!(
                Serialization,
                "expected `]` to close a {what}",
            ));
        }
        self.bump();
        Ok(())
    }

    fn expect_separator(&self, what: &'static str) -> Result<(), Error> {
        if self.peek() != Some(b';') {
            return Err(err!(
                Serialization,
                "expected `;` separator after {what}",
            ));
        }
        self.bump();
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos.get()).copied()
    }

    fn bump(&self) {
        self.pos.set(self.pos.get() + 1);
    }

    fn is_done(&self) -> bool {
        self.pos.get() >= self.text.len()
    }
}

fn parse_int(token: &str) -> Result<i32, ()> {
    let token = token.strip_prefix('+').unwrap_or(token);
    if token.is_empty() {
        return Err(());
    }
    token.parse::<i32>().map_err(|_| ())
}

/// Parses an endpoint extension token: the marker letter, a
/// `HH:mm:ss.FFFFFFF` time and a trailing tag letter.
fn parse_endpoint_extension(
    token: &str,
    which: char,
) -> Option<EndpointExtension> {
    let rest = token.strip_prefix(which)?;
    let (time, tag) = rest.split_at(rest.len().checked_sub(1)?);
    let tag = match tag {
        "u" => Tag::Absolute,
        "x" => Tag::Unspecified,
        _ => return None,
    };
    let time_ticks = parse_time_of_day_token(time, 7)?;
    Some(EndpointExtension { time_ticks, tag })
}

/// Parses `HH:mm:ss` with an optional fraction of up to `max_fraction`
/// digits, to ticks past midnight.
fn parse_time_of_day_token(token: &str, max_fraction: u32) -> Option<i64> {
    let (hms, fraction) = match token.split_once('.') {
        None => (token, None),
        Some((hms, fraction)) => (hms, Some(fraction)),
    };
    let mut parts = hms.split(':');
    let hour: i64 = parts.next()?.parse().ok()?;
    let minute: i64 = parts.next()?.parse().ok()?;
    let second: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if !(0..24).contains(&hour)
        || !(0..60).contains(&minute)
        || !(0..60).contains(&second)
    {
        return None;
    }
    let mut ticks = hour * TICKS_PER_HOUR
        + minute * TICKS_PER_MINUTE
        + second * TICKS_PER_SECOND;
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > max_fraction as usize
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let value: i64 = fraction.parse().ok()?;
        // Scale the digits up to the fraction's full width, then into
        // ticks. Three digits are milliseconds, seven are whole ticks.
        let scale = match max_fraction {
            3 => TICKS_PER_MILLISECOND,
            _ => 1,
        };
        let width = max_fraction as usize - fraction.len();
        ticks += value * 10i64.pow(width as u32) * scale;
    }
    Some(ticks)
}

fn apply_extension(
    date: CalendarDateTime,
    extension: Option<EndpointExtension>,
) -> CalendarDateTime {
    match extension {
        None => date,
        Some(ext) => date
            .saturating_add_ticks(ext.time_ticks)
            .with_tag(ext.tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i16, month: i8, day: i8) -> CalendarDateTime {
        CalendarDateTime::new(
            year,
            month,
            day,
            0,
            0,
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

    fn pacific() -> Zone {
        let rule = AdjustmentRule::new(
            date(1, 1, 1),
            date(9999, 12, 31),
            Offset::constant(1),
            TransitionTime::floating(at(2, 0), 3, 2, 0).unwrap(),
            TransitionTime::floating(at(2, 0), 11, 1, 0).unwrap(),
            Offset::ZERO,
        )
        .unwrap();
        Zone::new(
            "Pacific Standard Time",
            "(UTC-08:00) Pacific Time (US & Canada)",
            "Pacific Standard Time",
            "Pacific Daylight Time",
            Offset::constant_minutes(-480),
            Some(vec![rule]),
        )
        .unwrap()
    }

    fn assert_round_trip(zone: &Zone) {
        let text = zone.to_serialized();
        let back = Zone::from_serialized(&text).unwrap();
        assert_eq!(zone, &back, "serialized text: {text}");
        assert_eq!(zone.display_name(), back.display_name());
        assert_eq!(zone.standard_name(), back.standard_name());
        assert_eq!(zone.daylight_name(), back.daylight_name());
        // Rule arrays must match element-wise, not just as a whole.
        match (zone.adjustment_rules(), back.adjustment_rules()) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                assert_eq!(a.len(), b.len());
                for (x, y) in a.iter().zip(b) {
                    assert_eq!(x, y, "serialized text: {text}");
                    assert_eq!(
                        x.date_start().tag(),
                        y.date_start().tag(),
                    );
                    assert_eq!(x.date_end().tag(), y.date_end().tag());
                }
            }
            (a, b) => panic!("rule arrays differ: {a:?} vs {b:?}"),
        }
    }

    #[test]
    fn round_trip_simple_zone() {
        assert_round_trip(&pacific());
        assert_round_trip(&Zone::utc());
        assert_round_trip(
            &Zone::fixed("Etc/GMT+7", Offset::constant(-7)).unwrap(),
        );
    }

    #[test]
    fn serialized_form_matches_grammar() {
        let text = pacific().to_serialized();
        assert_eq!(
            text,
            "Pacific Standard Time;-480;\
             (UTC-08:00) Pacific Time (US & Canada);\
             Pacific Standard Time;Pacific Daylight Time;\
             [01:01:0001;12:31:9999;60;[0;02:00:00;3;2;0;];\
             [0;02:00:00;11;1;0;];];",
        );
    }

    #[test]
    fn escapes_round_trip() {
        let zone = Zone::new(
            "Odd\\Zone;With[Brackets]",
            "display; name",
            "std\\name",
            "dst]name[",
            Offset::constant(2),
            None,
        )
        .unwrap();
        let text = zone.to_serialized();
        assert!(text.starts_with(r"Odd\\Zone\;With\[Brackets\];120;"));
        assert_round_trip(&zone);
    }

    #[test]
    fn empty_names_round_trip() {
        let zone = Zone::new(
            "Test/Empty",
            "",
            "",
            "",
            Offset::ZERO,
            None,
        )
        .unwrap();
        let back = Zone::from_serialized(&zone.to_serialized()).unwrap();
        assert_eq!(back.display_name(), "");
        assert_eq!(back.standard_name(), "");
    }

    #[test]
    fn decoded_binary_zone_round_trips() {
        use crate::tz::tzif::tests::{
            build_tzif, pacific_transitions, pacific_types,
        };

        let data = build_tzif(
            b'2',
            &pacific_types(),
            &pacific_transitions(),
            "PST8PDT,M3.2.0,M11.1.0",
        );
        let zone = Zone::from_tzif("Test/Pacific", &data).unwrap();
        assert_round_trip(&zone);

        // A version 1 file exercises the final no-transition rule shape.
        let data =
            build_tzif(0, &pacific_types(), &pacific_transitions(), "");
        let zone = Zone::from_tzif("Test/PacificV1", &data).unwrap();
        assert_round_trip(&zone);
    }

    #[test]
    fn no_transition_flag_round_trips() {
        let rule = AdjustmentRule::new_no_transitions(
            CalendarDateTime::new(
                2000, 6, 1, 12, 30, 15, 0, Tag::Absolute,
            )
            .unwrap(),
            CalendarDateTime::new(
                2002, 6, 1, 0, 0, 0, 500, Tag::Absolute,
            )
            .unwrap(),
            Offset::ZERO,
            Offset::constant_minutes(1),
        )
        .unwrap();
        let zone = Zone::new(
            "Test/Window",
            "",
            "",
            "",
            Offset::constant(3),
            Some(vec![rule]),
        )
        .unwrap();
        let text = zone.to_serialized();
        // The collision-prone base delta of one minute is sign-prefixed.
        assert!(text.contains(";+1;1;"), "serialized text: {text}");
        assert_round_trip(&zone);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let text = "Test/Future;60;d;s;l;\
                    [01:01:2000;12:31:2030;60;\
                    [0;02:00:00;3;2;0;someday;];\
                    [0;02:00:00;11;1;0;];\
                    mystery;another one;];;";
        let zone = Zone::from_serialized(text).unwrap();
        let rules = zone.adjustment_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].daylight_delta(), Offset::constant(1));
        assert!(!rules[0].no_daylight_transitions());
    }

    #[test]
    fn rejects_malformed_text() {
        // Bad escape sequence.
        assert!(Zone::from_serialized(r"Bad\qZone;0;d;s;l;;")
            .unwrap_err()
            .is_serialization());
        // Missing separator.
        assert!(Zone::from_serialized("Test;0;d;s;l")
            .unwrap_err()
            .is_serialization());
        // Bad numeric token.
        assert!(Zone::from_serialized("Test;abc;d;s;l;;")
            .unwrap_err()
            .is_serialization());
        // Trailing garbage.
        assert!(Zone::from_serialized("Test;0;d;s;l;;extra")
            .unwrap_err()
            .is_serialization());
        // Transitions out of range.
        let text = "Test;0;d;s;l;\
                    [01:01:2000;12:31:2030;60;\
                    [0;02:00:00;13;2;0;];[0;02:00:00;11;1;0;];];;";
        assert!(Zone::from_serialized(text)
            .unwrap_err()
            .is_serialization());
        // Rule fields that fail validation (start after end).
        let text = "Test;0;d;s;l;\
                    [01:01:2030;12:31:2000;60;\
                    [0;02:00:00;3;2;0;];[0;02:00:00;11;1;0;];];;";
        assert!(Zone::from_serialized(text)
            .unwrap_err()
            .is_serialization());
    }

    #[test]
    fn overlapping_rules_fail_zone_validation() {
        let text = "Test;0;d;s;l;\
                    [01:01:2000;12:31:2010;60;\
                    [0;02:00:00;3;2;0;];[0;02:00:00;11;1;0;];];\
                    [01:01:2010;12:31:2020;60;\
                    [0;02:00:00;3;2;0;];[0;02:00:00;11;1;0;];];;";
        let err = Zone::from_serialized(text).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn fractional_time_of_day_round_trips() {
        // The daylight classification sentinel carries two milliseconds.
        let tt = TransitionTime::dst_sentinel();
        let mut out = String::new();
        serialize_transition(&mut out, tt);
        assert_eq!(out, "[1;00:00:00.002;1;1;];");
    }

    quickcheck::quickcheck! {
        fn prop_random_zone_round_trips(
            base_minutes: i16,
            delta_minutes: i16,
            start_month: u8,
            end_month: u8,
            week: u8,
            weekday: u8,
            millisecond: u16
        ) -> quickcheck::TestResult {
            let base = Offset::constant_minutes(
                i32::from(base_minutes).rem_euclid(14 * 60 * 2 + 1)
                    - 14 * 60,
            );
            let delta = Offset::constant_minutes(
                i32::from(delta_minutes).rem_euclid(121) - 60,
            );
            let start_month = i8::try_from(start_month % 12 + 1).unwrap();
            let end_month = i8::try_from(end_month % 12 + 1).unwrap();
            let week = i8::try_from(week % 5 + 1).unwrap();
            let weekday = i8::try_from(weekday % 7).unwrap();
            let time_of_day = CalendarDateTime::new(
                1, 1, 1, 2, 0, 0, (millisecond % 1000) as i16,
                Tag::Unspecified,
            )
            .unwrap();
            let start = TransitionTime::floating(
                time_of_day, start_month, week, weekday,
            )
            .unwrap();
            let end = TransitionTime::floating(
                time_of_day, end_month, 5 - (week - 1), weekday,
            )
            .unwrap();
            if start == end {
                return quickcheck::TestResult::discard();
            }
            let rule = AdjustmentRule::new(
                date(1800, 1, 1),
                date(2200, 12, 31),
                delta,
                start,
                end,
                Offset::ZERO,
            )
            .unwrap();
            let Ok(zone) = Zone::new(
                "Test/Random",
                "random zone",
                "standard",
                "daylight",
                base,
                Some(vec![rule]),
            ) else {
                // The base and delta can sum past the offset limit.
                return quickcheck::TestResult::discard();
            };
            let back = Zone::from_serialized(&zone.to_serialized()).unwrap();
            quickcheck::TestResult::from_bool(zone == back)
        }
    }
}
