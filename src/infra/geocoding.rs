use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::observability::{emit_counter, MetricName};
use crate::pipeline::processing::normalize::NormalizedPlace;

/// Geographic detail for a place name, as returned by the external lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl GeocodeResult {
    /// Copy the looked-up detail onto a normalized place. Enrichment only;
    /// duplicate decisions never depend on these fields.
    pub fn apply_to(&self, place: &mut NormalizedPlace) {
        place.latitude = Some(self.latitude);
        place.longitude = Some(self.longitude);
        place.country = self.country.clone();
        place.region = self.region.clone();
        place.city = self.city.clone();
    }
}

/// Port for the external place lookup. A failed or timed-out lookup is
/// "no result", never an engine-level error.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, name: &str) -> Option<GeocodeResult>;
}

/// Process-lifetime lookup cache, keyed by the raw query string. Failures
/// are cached as permanent no-results so the rate-limited upstream is never
/// asked the same hopeless question twice.
///
/// Held behind an `Arc` and injected into the client rather than living in a
/// process-wide singleton, so tests and embedders control its scope.
#[derive(Default)]
pub struct GeocodeCache {
    entries: Mutex<HashMap<String, Option<GeocodeResult>>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<Option<GeocodeResult>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: Option<GeocodeResult>) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

// Nominatim-style response rows: coordinates as strings plus a nested
// address object.
#[derive(Debug, Deserialize)]
struct LookupRow {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<LookupAddress>,
}

#[derive(Debug, Deserialize)]
struct LookupAddress {
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

/// HTTP geocoding client with caching and upstream-mandated pacing of one
/// request per second.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    cache: Arc<GeocodeCache>,
    last_lookup: tokio::sync::Mutex<Option<Instant>>,
}

impl HttpGeocoder {
    pub fn new(config: &GeocodingConfig, cache: Arc<GeocodeCache>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("chronicler/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            min_interval: Duration::from_millis(config.min_interval_ms),
            cache,
            last_lookup: tokio::sync::Mutex::new(None),
        })
    }

    async fn lookup(&self, name: &str) -> anyhow::Result<Option<GeocodeResult>> {
        // Pace requests; the lock also serializes lookups so the interval
        // actually holds under concurrent callers.
        let mut last = self.last_lookup.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());

        let rows: Vec<LookupRow> = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", name),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let latitude: f64 = row.lat.parse()?;
        let longitude: f64 = row.lon.parse()?;
        let address = row.address;
        let (country, region, city) = match address {
            Some(addr) => (
                addr.country,
                addr.state,
                addr.city.or(addr.town).or(addr.village),
            ),
            None => (None, None, None),
        };

        Ok(Some(GeocodeResult {
            latitude,
            longitude,
            country,
            region,
            city,
        }))
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, name: &str) -> Option<GeocodeResult> {
        if let Some(cached) = self.cache.get(name) {
            emit_counter(MetricName::GeocodeCacheHits, 1);
            return cached;
        }

        emit_counter(MetricName::GeocodeLookups, 1);
        let result = match self.lookup(name).await {
            Ok(result) => result,
            Err(e) => {
                // Degrade to "no result" and remember it, so a flaky or slow
                // upstream is not retried for the process lifetime
                warn!("Geocode lookup for {:?} failed: {}", name, e);
                emit_counter(MetricName::GeocodeFailures, 1);
                None
            }
        };

        debug!("Caching geocode result for {:?}: {:?}", name, result.is_some());
        self.cache.put(name, result.clone());
        result
    }
}
