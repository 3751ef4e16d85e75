//! Position input boundary.
//!
//! Listens for JSON position fixes on a UDP socket and overwrites the
//! single-slot mailbox with the latest one; stale fixes are never queued,
//! and the worker being mid-evaluation never blocks acceptance. In
//! `--simulate` mode a slow random walk stands in for the receiver.

use std::time::Duration;

use rand::RngExt;
use serde::Deserialize;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use roam_select::directory::PositionFix;

/// Wire shape of one feed datagram (a NavSatFix-style subset).
#[derive(Debug, Deserialize)]
struct FixMessage {
    latitude: f64,
    longitude: f64,
}

impl FixMessage {
    fn into_fix(self) -> PositionFix {
        PositionFix {
            latitude_deg: self.latitude,
            longitude_deg: self.longitude,
        }
    }
}

/// Runs the UDP feed listener until shutdown. Malformed or implausible
/// datagrams are logged and dropped at this boundary.
pub async fn run(
    bind_addr: &str,
    positions: watch::Sender<Option<PositionFix>>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let socket = UdpSocket::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "position feed listening");

    let mut buf = [0u8; 2048];
    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return Ok(());
                }
            }
            recv = socket.recv_from(&mut buf) => {
                let (len, _peer) = recv?;
                match serde_json::from_slice::<FixMessage>(&buf[..len]) {
                    Ok(msg) => accept(msg.into_fix(), &positions),
                    Err(e) => tracing::warn!(error = %e, "malformed fix datagram dropped"),
                }
            }
        }
    }
}

fn accept(fix: PositionFix, positions: &watch::Sender<Option<PositionFix>>) {
    if fix.is_plausible() {
        // Overwrite semantics: the worker only ever sees the latest fix.
        positions.send_replace(Some(fix));
    } else {
        tracing::warn!(
            lat = fix.latitude_deg,
            lon = fix.longitude_deg,
            "implausible fix dropped"
        );
    }
}

/// Simulated feed: a slow random walk (~100 m/s worst case) starting near
/// Toulouse, one fix per second.
pub async fn run_simulated(
    positions: watch::Sender<Option<PositionFix>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut lat = 43.604;
    let mut lon = 1.444;
    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            _ = interval.tick() => {
                let mut rng = rand::rng();
                lat += rng.random_range(-0.001..0.001);
                lon += rng.random_range(-0.001..0.001);
                positions.send_replace(Some(PositionFix {
                    latitude_deg: lat,
                    longitude_deg: lon,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_message_parses_navsatfix_subset() {
        let msg: FixMessage =
            serde_json::from_str(r#"{"latitude": 43.6, "longitude": 1.44, "altitude": 152.0}"#)
                .unwrap();
        let fix = msg.into_fix();
        assert_eq!(fix.latitude_deg, 43.6);
        assert_eq!(fix.longitude_deg, 1.44);
    }

    #[test]
    fn missing_coordinate_is_rejected() {
        assert!(serde_json::from_str::<FixMessage>(r#"{"latitude": 43.6}"#).is_err());
    }

    #[test]
    fn accept_forwards_only_plausible_fixes() {
        let (tx, rx) = watch::channel(None);

        accept(
            PositionFix {
                latitude_deg: 95.0,
                longitude_deg: 0.0,
            },
            &tx,
        );
        assert!(rx.borrow().is_none());

        accept(
            PositionFix {
                latitude_deg: 43.6,
                longitude_deg: 1.44,
            },
            &tx,
        );
        assert_eq!(rx.borrow().unwrap().latitude_deg, 43.6);
    }

    #[test]
    fn newer_fix_overwrites_pending_one() {
        let (tx, rx) = watch::channel(None);
        for lon in [1.0, 2.0, 3.0] {
            accept(
                PositionFix {
                    latitude_deg: 43.6,
                    longitude_deg: lon,
                },
                &tx,
            );
        }
        assert_eq!(rx.borrow().unwrap().longitude_deg, 3.0);
    }
}
