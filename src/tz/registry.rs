/*!
Support for the structured registry representation of a zone used by the
host OS on one platform.

The registry gives a zone as a default record (a bias from UTC plus two
yearly transition dates in `SYSTEMTIME` shape), optionally refined by one
record per year over a contiguous span of years. This module converts
those records into the same adjustment-rule model the binary decoder
produces.
*/

use crate::{
    civil::{CalendarDateTime, Tag},
    error::{err, err_context, Error},
    tz::{AdjustmentRule, Offset, TransitionTime, Zone},
};

/// A calendar timestamp in the registry's `SYSTEMTIME` shape.
///
/// When `year` is zero the value is a floating yearly pattern: `day` holds
/// the week ordinal (1..=5, 5 meaning "last") and `day_of_week` the weekday.
/// When `year` is non-zero the value names a fixed month and day.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegistrySystemTime {
    pub year: i32,
    pub month: i32,
    pub day_of_week: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    pub millisecond: i32,
}

/// One registry rule record: the fixed fields of a zone for some span of
/// years.
///
/// `bias` is in minutes with the registry's sign convention:
/// `UTC = local + bias`, so a zone east of the meridian has a negative
/// bias. A `standard_date` with month zero means the record has no daylight
/// saving at all.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegistryZoneRecord {
    pub bias: i32,
    pub standard_bias: i32,
    pub daylight_bias: i32,
    pub standard_date: RegistrySystemTime,
    pub daylight_date: RegistrySystemTime,
}

/// The per-year refinement of a registry zone: one record for every year
/// from `first_year` through `last_year`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryDynamicRules {
    pub first_year: i32,
    pub last_year: i32,
    pub records: Vec<RegistryZoneRecord>,
}

/// Everything the registry knows about one zone.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegistryZoneInfo {
    pub display_name: String,
    pub standard_name: String,
    pub daylight_name: String,
    pub record: RegistryZoneRecord,
    pub dynamic: Option<RegistryDynamicRules>,
}

impl Zone {
    /// Decodes the registry representation into a zone with the given
    /// identifier.
    pub fn from_registry(
        id: impl Into<String>,
        info: &RegistryZoneInfo,
    ) -> Result<Zone, Error> {
        let id = id.into();
        let base =
            Offset::from_minutes(-info.record.bias).map_err(|e| {
                err_context!(e, InvalidZone, "failed to decode zone `{id}`")
            })?;
        let rules = generate_rules(info).map_err(|e| {
            err_context!(e, InvalidZone, "failed to decode zone `{id}`")
        })?;
        Zone::new(
            id,
            info.display_name.clone(),
            info.standard_name.clone(),
            info.daylight_name.clone(),
            base,
            rules,
        )
    }
}

fn generate_rules(
    info: &RegistryZoneInfo,
) -> Result<Option<Vec<AdjustmentRule>>, Error> {
    let default_bias = info.record.bias;
    let Some(ref dynamic) = info.dynamic else {
        let rule = rule_from_record(
            &info.record,
            min_date(),
            max_date(),
            default_bias,
        )?;
        return Ok(rule.map(|rule| vec![rule]));
    };

    if dynamic.first_year > dynamic.last_year {
        return Err(err!(
            InvalidZone,
            "per-year records run from {first} to {last}, which is \
             backwards",
            first = dynamic.first_year,
            last = dynamic.last_year,
        ));
    }
    let year_count = (dynamic.last_year - dynamic.first_year + 1) as usize;
    if dynamic.records.len() != year_count {
        return Err(err!(
            InvalidZone,
            "expected {year_count} per-year records for \
             {first}..={last}, but got {got}",
            first = dynamic.first_year,
            last = dynamic.last_year,
            got = dynamic.records.len(),
        ));
    }
    if !(1 <= dynamic.first_year && dynamic.last_year <= 9999) {
        return Err(err!(
            InvalidZone,
            "per-year records cover years outside 1..=9999",
        ));
    }

    // A single-year refinement behaves exactly like a plain record.
    if dynamic.first_year == dynamic.last_year {
        let rule = rule_from_record(
            &dynamic.records[0],
            min_date(),
            max_date(),
            default_bias,
        )?;
        return Ok(rule.map(|rule| vec![rule]));
    }

    let mut rules = Vec::with_capacity(year_count);
    for (i, record) in dynamic.records.iter().enumerate() {
        let year = dynamic.first_year + i as i32;
        // The first record reaches back to the beginning of time and the
        // last one forward to the end; the years in between each cover
        // exactly themselves.
        let start = if year == dynamic.first_year {
            min_date()
        } else {
            date(year, 1, 1)
        };
        let end = if year == dynamic.last_year {
            max_date()
        } else {
            date(year, 12, 31)
        };
        if let Some(rule) =
            rule_from_record(record, start, end, default_bias)?
        {
            rules.push(rule);
        }
    }
    Ok(if rules.is_empty() { None } else { Some(rules) })
}

/// Converts one record over the given window into a rule, or `None` when
/// the record changes nothing about the zone's default behavior.
fn rule_from_record(
    record: &RegistryZoneRecord,
    start: CalendarDateTime,
    end: CalendarDateTime,
    default_bias: i32,
) -> Result<Option<AdjustmentRule>, Error> {
    let base_delta = Offset::from_minutes(default_bias - record.bias)?;
    let supports_dst = record.standard_date.month != 0;
    if !supports_dst {
        if record.bias == default_bias {
            return Ok(None);
        }
        // The record only corrects the base offset over its window.
        let rule = AdjustmentRule::new_no_transitions(
            start.with_tag(Tag::Absolute),
            end.with_tag(Tag::Absolute),
            Offset::ZERO,
            base_delta,
        )?;
        return Ok(Some(rule));
    }
    let transition_start = transition_from(&record.daylight_date)?;
    let transition_end = transition_from(&record.standard_date)?;
    if transition_start == transition_end {
        // Zones that disable daylight saving sometimes encode it as two
        // identical transitions.
        return Ok(None);
    }
    let rule = AdjustmentRule::new(
        start,
        end,
        Offset::from_minutes(-record.daylight_bias)?,
        transition_start,
        transition_end,
        base_delta,
    )?;
    Ok(Some(rule))
}

fn transition_from(
    st: &RegistrySystemTime,
) -> Result<TransitionTime, Error> {
    let field = |what: &'static str, value: i32| {
        i8::try_from(value).map_err(|_| {
            err!(InvalidZone, "registry transition {what} {value} is out \
                 of range")
        })
    };
    let time_of_day = CalendarDateTime::new(
        1,
        1,
        1,
        field("hour", st.hour)?,
        field("minute", st.minute)?,
        field("second", st.second)?,
        i16::try_from(st.millisecond).map_err(|_| {
            err!(
                InvalidZone,
                "registry transition millisecond {ms} is out of range",
                ms = st.millisecond,
            )
        })?,
        Tag::Unspecified,
    )?;
    if st.year == 0 {
        TransitionTime::floating(
            time_of_day,
            field("month", st.month)?,
            field("week", st.day)?,
            field("weekday", st.day_of_week)?,
        )
    } else {
        TransitionTime::fixed(
            time_of_day,
            field("month", st.month)?,
            field("day", st.day)?,
        )
    }
}

fn date(year: i32, month: i8, day: i8) -> CalendarDateTime {
    CalendarDateTime::new(
        year as i16,
        month,
        day,
        0,
        0,
        0,
        0,
        Tag::Unspecified,
    )
    .expect("per-year record dates are always valid")
}

fn min_date() -> CalendarDateTime {
    CalendarDateTime::MIN
}

fn max_date() -> CalendarDateTime {
    CalendarDateTime::MAX.date()
}

#[cfg(test)]
mod tests {
    use crate::tz::ConvertOptions;

    use super::*;

    fn pacific_record() -> RegistryZoneRecord {
        RegistryZoneRecord {
            bias: 480,
            standard_bias: 0,
            daylight_bias: -60,
            standard_date: RegistrySystemTime {
                year: 0,
                month: 11,
                day_of_week: 0,
                day: 1,
                hour: 2,
                ..Default::default()
            },
            daylight_date: RegistrySystemTime {
                year: 0,
                month: 3,
                day_of_week: 0,
                day: 2,
                hour: 2,
                ..Default::default()
            },
        }
    }

    fn pacific_info() -> RegistryZoneInfo {
        RegistryZoneInfo {
            display_name: "(UTC-08:00) Pacific Time".to_string(),
            standard_name: "Pacific Standard Time".to_string(),
            daylight_name: "Pacific Daylight Time".to_string(),
            record: pacific_record(),
            dynamic: None,
        }
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

    #[test]
    fn default_record_with_daylight() {
        let zone =
            Zone::from_registry("Pacific Standard Time", &pacific_info())
                .unwrap();
        assert_eq!(zone.base_utc_offset(), Offset::constant(-8));
        assert!(zone.supports_daylight_saving_time());

        let rules = zone.adjustment_rules().unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.daylight_delta(), Offset::constant(1));
        assert!(!rule.no_daylight_transitions());
        let start = rule.daylight_transition_start();
        assert!(!start.is_fixed_date());
        assert_eq!(
            (start.month(), start.week(), start.day_of_week()),
            (3, 2, 0)
        );

        // The decoded zone behaves like the hand-built Pacific fixture.
        assert!(zone.is_invalid(wall(2007, 3, 11, 2, 30)));
        assert!(zone.is_ambiguous(wall(2007, 11, 4, 1, 30)));
        assert_eq!(
            zone.offset_at(wall(2007, 7, 1, 12, 0)),
            Offset::constant(-7)
        );
    }

    #[test]
    fn record_without_daylight() {
        let mut info = pacific_info();
        info.record.standard_date.month = 0;
        let zone = Zone::from_registry("Test/NoDst", &info).unwrap();
        assert!(zone.adjustment_rules().is_none());
        assert!(!zone.supports_daylight_saving_time());
        assert_eq!(zone.base_utc_offset(), Offset::constant(-8));
    }

    #[test]
    fn fixed_date_transition() {
        let mut info = pacific_info();
        info.record.daylight_date = RegistrySystemTime {
            year: 2007,
            month: 4,
            day: 15,
            hour: 2,
            ..Default::default()
        };
        let zone = Zone::from_registry("Test/Fixed", &info).unwrap();
        let rule = &zone.adjustment_rules().unwrap()[0];
        let start = rule.daylight_transition_start();
        assert!(start.is_fixed_date());
        assert_eq!((start.month(), start.day()), (4, 15));
    }

    #[test]
    fn dynamic_records_split_by_year() {
        // Like Russia around 2014: a base offset correction over a span of
        // years, expressed as per-year records.
        let mut corrected = pacific_record();
        corrected.bias = 420;
        let info = RegistryZoneInfo {
            display_name: "Test".to_string(),
            standard_name: "Test Standard".to_string(),
            daylight_name: "Test Daylight".to_string(),
            record: pacific_record(),
            dynamic: Some(RegistryDynamicRules {
                first_year: 2005,
                last_year: 2007,
                records: vec![
                    pacific_record(),
                    corrected,
                    pacific_record(),
                ],
            }),
        };

        let zone = Zone::from_registry("Test/Dynamic", &info).unwrap();
        let rules = zone.adjustment_rules().unwrap();
        assert_eq!(rules.len(), 3);
        // First rule reaches back to the beginning of time.
        assert_eq!(rules[0].date_start().ticks(), 0);
        assert_eq!(rules[0].date_end(), wall(2005, 12, 31, 0, 0));
        // The middle year carries the bias correction.
        assert_eq!(rules[1].date_start(), wall(2006, 1, 1, 0, 0));
        assert_eq!(rules[1].date_end(), wall(2006, 12, 31, 0, 0));
        assert_eq!(
            rules[1].base_utc_offset_delta(),
            Offset::constant_minutes(60)
        );
        // Last rule reaches forward to the end of time.
        assert_eq!(rules[2].date_start(), wall(2007, 1, 1, 0, 0));

        // The offset in the corrected year reflects the delta.
        assert_eq!(
            zone.offset_at(wall(2006, 1, 15, 12, 0)),
            Offset::constant(-7)
        );
        assert_eq!(
            zone.offset_at(wall(2005, 1, 15, 12, 0)),
            Offset::constant(-8)
        );
    }

    #[test]
    fn dynamic_record_count_must_match_span() {
        let info = RegistryZoneInfo {
            record: pacific_record(),
            dynamic: Some(RegistryDynamicRules {
                first_year: 2005,
                last_year: 2007,
                records: vec![pacific_record()],
            }),
            ..Default::default()
        };
        assert!(Zone::from_registry("Test/Bad", &info)
            .unwrap_err()
            .is_invalid_zone());
    }

    #[test]
    fn identical_transitions_mean_no_daylight() {
        let mut info = pacific_info();
        info.record.daylight_date = info.record.standard_date;
        let zone = Zone::from_registry("Test/Same", &info).unwrap();
        assert!(zone.adjustment_rules().is_none());
    }

    #[test]
    fn registry_zone_round_trips_through_utc() {
        let zone =
            Zone::from_registry("Pacific Standard Time", &pacific_info())
                .unwrap();
        let summer = wall(2019, 7, 10, 9, 30);
        let utc =
            Zone::convert(summer, &zone, &Zone::utc(), ConvertOptions::new())
                .unwrap();
        assert_eq!(utc, wall(2019, 7, 10, 16, 30));
        let back =
            Zone::convert(utc, &Zone::utc(), &zone, ConvertOptions::new())
                .unwrap();
        assert_eq!(back.ticks(), summer.ticks());
    }
}
