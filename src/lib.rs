/*!
A civil time zone rules engine.

This crate models a named time zone as a base offset from UTC plus an
ordered sequence of adjustment rules, and answers the questions that model
raises: what offset is in effect at a given instant, whether a wall clock
reading is daylight time, whether it is ambiguous (a clock was set back
through it) or invalid (a clock jumped over it), and how to convert civil
times between zones.

Rule data comes from the two on-disk sources used in practice, both decoded
into the same in-memory model:

* the compiled binary zone files of the [Time Zone Database] (versions 1,
  2 and 3, including the trailing extended-future string), via
  [`tz::Zone::from_tzif`];
* the structured registry records used by the host OS on one platform,
  via [`tz::Zone::from_registry`].

A zone also round-trips through a delimited textual format
([`tz::Zone::to_serialized`] / [`tz::Zone::from_serialized`]), which is the
crate's stable interchange representation.

# Example

```
use civtz::{
    civil::{CalendarDateTime, Tag},
    tz::{ConvertOptions, Offset, Zone},
};

let zone = Zone::fixed("Etc/GMT+5", Offset::constant(-5))?;
let wall = CalendarDateTime::new(2024, 1, 15, 9, 0, 0, 0, Tag::Unspecified)?;
let utc = Zone::convert(wall, &zone, &Zone::utc(), ConvertOptions::new())?;
assert_eq!((utc.hour(), utc.tag()), (14, Tag::Absolute));

# Ok::<(), civtz::Error>(())
```

# Crate features

* **logging** (enabled by default) - Emits diagnostics about decoding and
  catalog lookups via the `log` crate.
* **serde** - Implements `Serialize` and `Deserialize` for [`tz::Zone`]
  through the textual format.

[Time Zone Database]: https://www.iana.org/time-zones
*/

#![deny(rustdoc::broken_intra_doc_links)]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

pub use crate::{
    error::Error,
    instant::Instant,
};

#[macro_use]
mod logging;

pub mod civil;
mod error;
mod instant;
pub mod tz;
mod util;
