/*!
The zone catalog: identifier lookup, enumeration and the process-wide
caches.

The catalog itself performs no I/O. A [`ZoneSource`] collaborator delivers
raw bytes (binary zone files), registry records or identifiers, and the
catalog owns everything from there: decoding, identifier validation and an
identity cache of constructed zones.

The cache is generational. Clearing it atomically swaps in a fresh empty
generation; lookups that raced with the clear keep using the generation
they started with, which is sound because zones are immutable and the
cache is purely an identity optimization.
*/

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, RwLock},
};

use crate::{
    error::{err, err_context, Error},
    tz::{registry::RegistryZoneInfo, tzif, Zone},
};

/// The longest accepted zone identifier, matching the registry platform's
/// key length limit.
const MAX_ID_LEN: usize = 255;

/// Which display name of a zone to look up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NameKind {
    /// The general display name.
    Generic,
    /// The name of the zone's standard time.
    Standard,
    /// The name of the zone's daylight time.
    Daylight,
}

/// What the collaborator knows about the host's current zone.
///
/// The identifier is always present; the payloads are optional and used
/// when available, saving a second round-trip through
/// [`ZoneSource::load_bytes`].
#[derive(Clone, Debug)]
pub struct LocalZoneSpec {
    pub id: String,
    pub bytes: Option<Vec<u8>>,
    pub registry: Option<RegistryZoneInfo>,
}

/// The collaborator that delivers raw rule data to the catalog.
///
/// Implementations typically read `/usr/share/zoneinfo` style directories
/// or the OS registry; the catalog never touches the outside world
/// directly.
pub trait ZoneSource: Send + Sync {
    /// Returns the raw binary zone file for the given identifier.
    fn load_bytes(&self, id: &str) -> Result<Vec<u8>, Error>;

    /// Returns the registry record for the given identifier. Sources on
    /// platforms without a registry report every identifier as unknown.
    fn load_registry(&self, id: &str) -> Result<RegistryZoneInfo, Error> {
        Err(err!(ZoneNotFound, "no registry data for zone `{id}`"))
    }

    /// Enumerates the identifiers of every installed zone.
    fn enumerate(&self) -> Result<Vec<String>, Error>;

    /// Resolves the host's current zone.
    fn resolve_local(&self) -> Result<LocalZoneSpec, Error>;

    /// Returns a localized display name for the given zone, when the
    /// platform has one. The catalog falls back to the names embedded in
    /// the zone data itself.
    fn localized_name(&self, _id: &str, _kind: NameKind) -> Option<String> {
        None
    }
}

/// One cache generation: the zones constructed so far and the local-zone
/// handle, resolved at most once per generation.
#[derive(Default)]
struct Generation {
    zones: RwLock<HashMap<String, Zone>>,
    local: OnceLock<Result<Zone, Error>>,
}

/// A catalog of zones backed by a [`ZoneSource`].
pub struct ZoneCatalog {
    source: Box<dyn ZoneSource>,
    generation: RwLock<Arc<Generation>>,
}

impl ZoneCatalog {
    /// Creates a catalog over the given source.
    pub fn new(source: Box<dyn ZoneSource>) -> ZoneCatalog {
        ZoneCatalog {
            source,
            generation: RwLock::new(Arc::new(Generation::default())),
        }
    }

    /// Returns the UTC sentinel zone.
    pub fn utc(&self) -> Zone {
        Zone::utc()
    }

    /// Finds a zone by identifier.
    ///
    /// The identifier must be non-empty, at most 255 bytes and free of
    /// NUL. Lookup is case-insensitive and cached: asking for the same
    /// identifier twice returns the zone constructed the first time.
    pub fn find(&self, id: &str) -> Result<Zone, Error> {
        validate_id(id)?;
        let generation = self.generation();
        let key = id.to_ascii_lowercase();
        if let Some(zone) = generation.zones.read().unwrap().get(&key) {
            trace!("zone `{id}` served from cache");
            return Ok(zone.clone());
        }
        let zone = if key == "utc" {
            Zone::utc()
        } else {
            self.load(id)?
        };
        generation
            .zones
            .write()
            .unwrap()
            .entry(key)
            .or_insert_with(|| zone.clone());
        Ok(zone)
    }

    /// Returns every installed zone, sorted by base offset and then by
    /// display name (ordinal).
    ///
    /// Identifiers whose data fails to decode are skipped.
    pub fn list(&self) -> Result<Vec<Zone>, Error> {
        let ids = self.source.enumerate()?;
        let mut zones = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find(&id) {
                Ok(zone) => zones.push(zone),
                Err(e) => {
                    warn!("skipping zone `{id}`: {e}");
                }
            }
        }
        zones.sort_by(|a, b| {
            (a.base_utc_offset(), a.display_name())
                .cmp(&(b.base_utc_offset(), b.display_name()))
        });
        Ok(zones)
    }

    /// Returns the host's current zone.
    ///
    /// The collaborator is consulted at most once per cache generation;
    /// clearing the cache makes the next call re-resolve.
    pub fn local(&self) -> Result<Zone, Error> {
        let generation = self.generation();
        generation
            .local
            .get_or_init(|| self.resolve_local())
            .clone()
    }

    /// Atomically replaces the cache with a fresh empty generation.
    pub fn clear_cache(&self) {
        debug!("clearing zone cache");
        *self.generation.write().unwrap() = Arc::new(Generation::default());
    }

    fn generation(&self) -> Arc<Generation> {
        self.generation.read().unwrap().clone()
    }

    fn resolve_local(&self) -> Result<Zone, Error> {
        let spec = self.source.resolve_local()?;
        debug!("resolved local zone id `{id}`", id = spec.id);
        validate_id(&spec.id)?;
        if let Some(ref bytes) = spec.bytes {
            return Ok(self.localize(Zone::from_tzif(&*spec.id, bytes)?));
        }
        if let Some(ref registry) = spec.registry {
            return Ok(
                self.localize(Zone::from_registry(&*spec.id, registry)?)
            );
        }
        self.find(&spec.id)
    }

    /// Loads and decodes one zone from the collaborator, trying the
    /// binary form first and the registry form when the binary one is
    /// unknown.
    fn load(&self, id: &str) -> Result<Zone, Error> {
        match self.source.load_bytes(id) {
            Ok(bytes) => {
                if !tzif::is_possibly_tzif(&bytes) {
                    return Err(err!(
                        InvalidZone,
                        "data for zone `{id}` is not in the binary zone \
                         file format",
                    ));
                }
                Ok(self.localize(Zone::from_tzif(id, &bytes)?))
            }
            Err(e) if e.is_zone_not_found() => {
                match self.source.load_registry(id) {
                    Ok(info) => {
                        Ok(self.localize(Zone::from_registry(id, &info)?))
                    }
                    Err(e) if e.is_zone_not_found() => Err(err_context!(
                        e,
                        ZoneNotFound,
                        "zone `{id}` was not found",
                    )),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Replaces a zone's display names with the collaborator's localized
    /// ones, when it has any.
    fn localize(&self, zone: Zone) -> Zone {
        let generic = self.source.localized_name(zone.id(), NameKind::Generic);
        let standard =
            self.source.localized_name(zone.id(), NameKind::Standard);
        let daylight =
            self.source.localized_name(zone.id(), NameKind::Daylight);
        if generic.is_none() && standard.is_none() && daylight.is_none() {
            return zone;
        }
        Zone::new(
            zone.id(),
            generic.unwrap_or_else(|| zone.display_name().to_string()),
            standard.unwrap_or_else(|| zone.standard_name().to_string()),
            daylight.unwrap_or_else(|| zone.daylight_name().to_string()),
            zone.base_utc_offset(),
            zone.adjustment_rules().map(<[_]>::to_vec),
        )
        // Renaming cannot invalidate an already-validated zone.
        .unwrap_or(zone)
    }
}

impl core::fmt::Debug for ZoneCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let generation = self.generation();
        let cached = generation.zones.read().unwrap().len();
        f.debug_struct("ZoneCatalog").field("cached", &cached).finish()
    }
}

fn validate_id(id: &str) -> Result<(), Error> {
    if id.is_empty() {
        return Err(err!(InvalidZone, "zone id must be non-empty"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(err!(
            InvalidZone,
            "zone id is {len} bytes long, which exceeds the limit of \
             {MAX_ID_LEN}",
            len = id.len(),
        ));
    }
    if id.contains('\0') {
        return Err(err!(InvalidZone, "zone id must not contain NUL"));
    }
    Ok(())
}
