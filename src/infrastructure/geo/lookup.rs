//! Geo lookup trait, HTTP client, and private-address filtering.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Coarse geolocation data for a single IP address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// Resolves an IP address to a coarse location.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Returns `None` for private/unroutable addresses, failed lookups, and
    /// responses with no usable data. Never errors.
    async fn lookup(&self, ip: &str) -> Option<GeoInfo>;
}

/// Lookup implementation used when `GEO_LOOKUP_URL` is unset.
pub struct NullGeoLookup;

#[async_trait]
impl GeoLookup for NullGeoLookup {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }
}

// ── ip-api.com response shape ──────────────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
}

/// HTTP geolocation client with a per-IP result cache.
///
/// Talks to an ip-api.com-style endpoint with a 3-second timeout so a slow
/// provider can never stall the ingestion worker for long. Results,
/// including misses, are cached so repeat visitors don't trigger repeated
/// network requests. The cache is reset wholesale once it reaches
/// [`GEO_CACHE_MAX_ENTRIES`]; evicted entries are just refetched.
pub struct HttpGeoLookup {
    client: reqwest::Client,
    base_url: String,
    cache: DashMap<String, Option<GeoInfo>>,
    max_entries: usize,
}

/// Bound on cached per-IP results. Visitor IPs are an open-ended key space.
const GEO_CACHE_MAX_ENTRIES: usize = 10_000;

impl HttpGeoLookup {
    /// Creates a client against `base_url` (e.g. `"http://ip-api.com/json"`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
            cache: DashMap::new(),
            max_entries: GEO_CACHE_MAX_ENTRIES,
        }
    }

    async fn fetch(&self, ip: &str) -> Option<GeoInfo> {
        let url = format!(
            "{}/{}?fields=status,country,countryCode,regionName,city",
            self.base_url.trim_end_matches('/'),
            ip
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| tracing::debug!("geo lookup network error for {}: {}", ip, e))
            .ok()?;

        let body: IpApiResponse = resp
            .json()
            .await
            .map_err(|e| tracing::debug!("geo lookup parse error for {}: {}", ip, e))
            .ok()?;

        if body.status != "success" {
            tracing::debug!("geo lookup returned non-success status for {}", ip);
            return None;
        }

        let info = GeoInfo {
            country: body.country.filter(|s| !s.is_empty()),
            country_code: body.country_code.filter(|s| !s.is_empty()),
            region: body.region_name.filter(|s| !s.is_empty()),
            city: body.city.filter(|s| !s.is_empty()),
        };

        // Treat completely empty results as a miss
        if info.country.is_none() && info.region.is_none() && info.city.is_none() {
            return None;
        }

        Some(info)
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        // Skip addresses that can never be geolocated
        if is_private(ip) {
            return None;
        }

        // Check cache first (covers both successful hits and known misses)
        if let Some(entry) = self.cache.get(ip) {
            return entry.clone();
        }

        let result = self.fetch(ip).await;

        // Store in cache regardless of outcome so we don't retry endlessly
        if self.cache.len() >= self.max_entries {
            self.cache.clear();
        }
        self.cache.insert(ip.to_owned(), result.clone());

        result
    }
}

/// Return `true` for addresses that should never be sent to a public
/// geolocation API: loopback, link-local, private ranges, and IPv6 special
/// addresses.
fn is_private(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" → "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()          // 127.x.x.x
            || addr.is_link_local()     // 169.254.x.x
            || addr.is_unspecified()    // 0.0.0.0
            || addr.is_broadcast()
            // 10.x.x.x
            || octets[0] == 10
            // 172.16.x.x – 172.31.x.x
            || (octets[0] == 172 && (16..=31).contains(&octets[1]))
            // 192.168.x.x
            || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()       // ::1
            || addr.is_unspecified() // ::
            // fe80::/10  link-local
            || (addr.segments()[0] & 0xffc0) == 0xfe80
            // fc00::/7   unique-local
            || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        Err(_) => true, // unparseable → treat as private / skip
    }
}
