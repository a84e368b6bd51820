//! Coarse IP geolocation for visit enrichment.
//!
//! Lookups are best-effort: every failure path returns `None` so ingestion
//! degrades to null location fields instead of aborting.

mod lookup;

pub use lookup::{GeoInfo, GeoLookup, HttpGeoLookup, NullGeoLookup};
