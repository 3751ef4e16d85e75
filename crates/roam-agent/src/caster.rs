//! Caster directory clients.
//!
//! Two [`Directory`] implementations:
//!
//! - [`ProviderDirectory`] — thin adapter to an external directory
//!   provider (the sidecar that actually speaks NTRIP to the caster and
//!   answers position queries with JSON entry lists).
//! - [`SimulatedDirectory`] — `--simulate` stand-in computing great-circle
//!   distances from a fixed reference-station table.

use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use roam_select::directory::{Directory, DirectoryError, DirectoryQuery};
use roam_select::record::MountpointRecord;

// ─── Provider Client ────────────────────────────────────────────────────

/// Wire shape of one directory entry as the provider reports it. A missing
/// field fails the whole response, never a partial snapshot.
#[derive(Debug, Deserialize)]
struct ProviderEntry {
    mountpoint: String,
    carrier: u8,
    distance_km: f64,
}

/// Directory client querying an external provider over TCP/JSON.
///
/// One connection per query: send the query as a JSON line, read entries
/// until EOF. The scheduler bounds the exchange with the query timeout.
#[derive(Debug, Clone)]
pub struct ProviderDirectory {
    address: String,
    port: u16,
}

impl ProviderDirectory {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        ProviderDirectory {
            address: address.into(),
            port,
        }
    }

    /// Parses and validates a provider response. Malformed entries are a
    /// boundary failure, never a partial snapshot.
    fn parse_response(raw: &[u8]) -> Result<Vec<MountpointRecord>, DirectoryError> {
        let entries: Vec<ProviderEntry> = serde_json::from_slice(raw)
            .map_err(|e| DirectoryError::ConnectionFailed(format!("malformed response: {e}")))?;
        entries
            .into_iter()
            .map(|e| {
                MountpointRecord::new(e.mountpoint, e.carrier, e.distance_km)
                    .map_err(|e| DirectoryError::ConnectionFailed(format!("invalid entry: {e}")))
            })
            .collect()
    }
}

impl Directory for ProviderDirectory {
    async fn query(&self, query: DirectoryQuery) -> Result<Vec<MountpointRecord>, DirectoryError> {
        let connect_err = |e: std::io::Error| DirectoryError::ConnectionFailed(e.to_string());

        let mut stream = TcpStream::connect((self.address.as_str(), self.port))
            .await
            .map_err(connect_err)?;

        let request = serde_json::json!({
            "latitude_deg": query.fix.latitude_deg,
            "longitude_deg": query.fix.longitude_deg,
            "max_distance_km": query.max_distance_km,
        });
        let mut line = request.to_string();
        line.push('\n');
        stream.write_all(line.as_bytes()).await.map_err(connect_err)?;
        stream.shutdown().await.map_err(connect_err)?;

        let mut raw = Vec::with_capacity(4096);
        stream.read_to_end(&mut raw).await.map_err(connect_err)?;
        Self::parse_response(&raw)
    }
}

// ─── Simulated Directory ────────────────────────────────────────────────

/// One simulated reference station.
#[derive(Debug, Clone)]
pub struct Station {
    pub mountpoint: String,
    pub carrier_level: u8,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Directory backed by a static station table.
#[derive(Debug, Clone)]
pub struct SimulatedDirectory {
    stations: Vec<Station>,
    latency: Duration,
}

impl SimulatedDirectory {
    pub fn new(stations: Vec<Station>) -> Self {
        SimulatedDirectory {
            stations,
            latency: Duration::ZERO,
        }
    }

    /// Adds artificial per-query latency, for exercising the query timeout.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A small network of stations around southern France, roughly the
    /// deployment the default thresholds were tuned for.
    pub fn regional_network() -> Self {
        let station = |mountpoint: &str, carrier_level, latitude_deg, longitude_deg| Station {
            mountpoint: mountpoint.to_owned(),
            carrier_level,
            latitude_deg,
            longitude_deg,
        };
        SimulatedDirectory::new(vec![
            station("TLSE", 3, 43.561, 1.481),
            station("AUCH", 2, 43.646, 0.586),
            station("ALBI", 2, 43.928, 2.147),
            station("CARC", 3, 43.213, 2.351),
            // L1-only station: visible in the directory, never eligible.
            station("MTBN", 1, 44.018, 1.355),
        ])
    }
}

impl Directory for SimulatedDirectory {
    async fn query(&self, query: DirectoryQuery) -> Result<Vec<MountpointRecord>, DirectoryError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut records = Vec::with_capacity(self.stations.len());
        for station in &self.stations {
            let distance_km = haversine_km(
                query.fix.latitude_deg,
                query.fix.longitude_deg,
                station.latitude_deg,
                station.longitude_deg,
            );
            if distance_km > query.max_distance_km {
                continue;
            }
            let record =
                MountpointRecord::new(station.mountpoint.clone(), station.carrier_level, distance_km)
                    .map_err(|e| DirectoryError::ConnectionFailed(e.to_string()))?;
            records.push(record);
        }
        records.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(records)
    }
}

/// Great-circle distance between two WGS84 points in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
