//! Scale discovery.
//!
//! Scans the adapter for peripherals advertising either supported scale
//! service and surfaces each candidate to a [`DeviceChooser`], the one
//! user-interactive step in the pipeline.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{Stream, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, trace};

use crate::ble::uuids::{is_scale_service, ServicePair, SERVICE_CANDIDATES};
use crate::error::{Error, Result};

/// Advertisement data for one discovered candidate.
///
/// This is what a [`DeviceChooser`] gets to judge; it carries no
/// platform handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleAdvertisement {
    /// The BLE peripheral identifier.
    pub identifier: String,
    /// Advertised local name, if any.
    pub local_name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

/// A scale found during discovery.
///
/// Owned by the caller for the duration of one session; not reused
/// across sessions.
#[derive(Debug, Clone)]
pub struct ScaleDevice {
    /// The advertisement that got this device accepted.
    pub advertisement: ScaleAdvertisement,
    /// The peripheral handle.
    pub peripheral: Peripheral,
}

/// Verdict from a [`DeviceChooser`] for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooserVerdict {
    /// Use this device.
    Accept,
    /// Keep scanning for other candidates.
    Skip,
    /// Abandon the scan; surfaces as [`Error::UserCancelled`].
    Cancel,
}

/// Decides which discovered scale to use.
///
/// Plays the role of a platform device-selection prompt: an interactive
/// implementation can show the candidate to the operator, a headless one
/// can match on name or address.
#[async_trait]
pub trait DeviceChooser: Send + Sync {
    /// Judge one candidate. Each discovered device is offered at most once.
    async fn choose(&self, candidate: &ScaleAdvertisement) -> ChooserVerdict;
}

/// Chooser that accepts the first candidate offered.
pub struct FirstDiscovered;

#[async_trait]
impl DeviceChooser for FirstDiscovered {
    async fn choose(&self, _candidate: &ScaleAdvertisement) -> ChooserVerdict {
        ChooserVerdict::Accept
    }
}

/// Offer candidates to the chooser until one is accepted.
///
/// Each identifier is offered at most once; re-advertisements of an
/// already judged device are dropped. The candidate source ending
/// without an acceptance surfaces as [`Error::ConnectionLost`], a
/// cancel verdict as [`Error::UserCancelled`].
async fn offer_candidates<T, S>(
    mut candidates: S,
    chooser: &dyn DeviceChooser,
) -> Result<(ScaleAdvertisement, T)>
where
    S: Stream<Item = (ScaleAdvertisement, T)> + Unpin,
{
    let mut offered: HashSet<String> = HashSet::new();

    while let Some((advertisement, handle)) = candidates.next().await {
        if !offered.insert(advertisement.identifier.clone()) {
            continue;
        }

        debug!(
            "Offering candidate {} ({:?}, rssi {:?})",
            advertisement.identifier, advertisement.local_name, advertisement.rssi
        );

        match chooser.choose(&advertisement).await {
            ChooserVerdict::Accept => return Ok((advertisement, handle)),
            ChooserVerdict::Skip => continue,
            ChooserVerdict::Cancel => return Err(Error::UserCancelled),
        }
    }

    Err(Error::ConnectionLost)
}

/// Discovers scales advertising a supported service.
pub struct DeviceLocator {
    /// The BLE adapter to scan with.
    adapter: Adapter,
    /// Service pairs a candidate must advertise one of.
    candidates: Vec<ServicePair>,
}

impl DeviceLocator {
    /// Create a locator on the first available Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlatformUnsupported`] if the host has no
    /// Bluetooth capability.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::PlatformUnsupported)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::PlatformUnsupported)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a locator with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            candidates: SERVICE_CANDIDATES.to_vec(),
        }
    }

    /// Scan until the chooser accepts a candidate.
    ///
    /// The scan filter covers both the Weight Scale and the Body
    /// Composition service so either class of device is discoverable by
    /// one call. There is no built-in deadline; wrap this call in a
    /// caller-imposed timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserCancelled`] if the chooser cancels, or a
    /// Bluetooth error if the scan cannot run.
    pub async fn locate(&self, chooser: &dyn DeviceChooser) -> Result<ScaleDevice> {
        let filter = ScanFilter {
            services: self.candidates.iter().map(|c| c.service).collect(),
        };

        info!("Starting BLE scan for weight scales");

        let events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(filter)
            .await
            .map_err(Error::Bluetooth)?;

        let candidates = Box::pin(events.filter_map(|event| self.candidate_from_event(event)));

        let outcome = offer_candidates(candidates, chooser).await;

        if let Err(e) = self.adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }

        let (advertisement, peripheral) = outcome?;
        info!("Scale selected: {}", advertisement.identifier);

        Ok(ScaleDevice {
            advertisement,
            peripheral,
        })
    }

    /// Build a candidate from an adapter event, if the peripheral
    /// advertises a supported service.
    async fn candidate_from_event(
        &self,
        event: CentralEvent,
    ) -> Option<(ScaleAdvertisement, Peripheral)> {
        let id = match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
            _ => return None,
        };

        let peripheral = match self.adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        // Platforms differ in how strictly the scan filter is applied,
        // so re-check the advertised services here.
        if !properties.services.iter().any(is_scale_service) {
            return None;
        }

        let advertisement = ScaleAdvertisement {
            identifier: id.to_string(),
            local_name: properties.local_name,
            rssi: properties.rssi,
        };

        Some((advertisement, peripheral))
    }
}
