/*!
Routines for representing time zones and evaluating their rules.

The main type in this module is [`Zone`]: a base offset from UTC plus an
ordered array of [`AdjustmentRule`]s. A zone answers every question this
crate can ask about civil time: the offset in effect at an instant, whether
a wall reading is daylight time, whether it is ambiguous (occurs twice) or
invalid (never occurs), and how to convert between zones.

Zones come from three decoders that all produce the same rule model:

* [`Zone::from_tzif`] reads the compiled binary zone files found under
  `/usr/share/zoneinfo` on Unix systems (format versions 1, 2 and 3,
  including the trailing extended-future string);
* [`Zone::from_registry`] reads the structured per-year records the host
  OS registry keeps on one platform;
* [`Zone::from_serialized`] reads the delimited textual format, which
  [`Zone::to_serialized`] writes.

[`ZoneCatalog`] wraps a [`ZoneSource`] collaborator and adds identifier
lookup, enumeration and caching on top.

```
use civtz::{
    civil::{CalendarDateTime, Tag},
    tz::{ConvertOptions, Offset, Zone},
};

let zone = Zone::fixed("Etc/GMT+8", Offset::constant(-8))?;
let wall = CalendarDateTime::new(2024, 7, 4, 12, 0, 0, 0, Tag::Unspecified)?;
let utc = Zone::convert(wall, &zone, &Zone::utc(), ConvertOptions::new())?;
assert_eq!(utc.hour(), 20);

# Ok::<(), civtz::Error>(())
```
*/

pub use self::{
    db::{LocalZoneSpec, NameKind, ZoneCatalog, ZoneSource},
    offset::{Dst, Offset},
    registry::{
        RegistryDynamicRules, RegistrySystemTime, RegistryZoneInfo,
        RegistryZoneRecord,
    },
    rule::AdjustmentRule,
    transition::TransitionTime,
    zone::{ConvertOptions, OffsetInfo, Zone},
};

mod db;
mod offset;
mod posix;
mod registry;
mod rule;
mod serialized;
mod transition;
mod tzif;
mod zone;
