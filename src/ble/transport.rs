//! Transport abstraction over a BLE peripheral.
//!
//! `ScaleTransport` is the seam between the negotiation/subscription
//! logic and the platform BLE stack. Production code uses
//! [`PeripheralTransport`] over a btleplug peripheral; tests substitute
//! a mock.

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use futures::stream::{Stream, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Stream of raw notification frames from one characteristic, delivered
/// in arrival order.
pub type FrameStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Async transport to one BLE scale.
///
/// The transport is exclusively owned by the session that created it;
/// nothing else may use it concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScaleTransport: Send + Sync + 'static {
    /// Establish the transport connection.
    async fn connect(&self) -> Result<()>;

    /// Close the transport connection.
    async fn disconnect(&self) -> Result<()>;

    /// Discover GATT services. Must be called after `connect` and
    /// before any endpoint query.
    async fn discover_services(&self) -> Result<()>;

    /// Check whether the device exposes the given service.
    async fn has_service(&self, service: Uuid) -> bool;

    /// Check whether the device exposes the given characteristic within
    /// the given service.
    async fn has_endpoint(&self, service: Uuid, characteristic: Uuid) -> bool;

    /// Start notifications on a characteristic.
    async fn start_notifications(&self, characteristic: Uuid) -> Result<()>;

    /// Stop notifications on a characteristic.
    async fn stop_notifications(&self, characteristic: Uuid) -> Result<()>;

    /// Raw frames pushed by the device for the given characteristic.
    async fn frames(&self, characteristic: Uuid) -> Result<FrameStream>;
}

/// `ScaleTransport` implementation over a btleplug peripheral.
pub struct PeripheralTransport {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by UUID, filled by `discover_services`.
    characteristics: RwLock<HashMap<Uuid, Characteristic>>,
}

impl PeripheralTransport {
    /// Create a new transport for a peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: RwLock::new(HashMap::new()),
        }
    }

    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(&uuid)
            .cloned()
            .ok_or(Error::ServiceNotFound)
    }
}

#[async_trait]
impl ScaleTransport for PeripheralTransport {
    async fn connect(&self) -> Result<()> {
        self.peripheral.connect().await.map_err(Error::Bluetooth)
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await.map_err(Error::Bluetooth)
    }

    async fn discover_services(&self) -> Result<()> {
        self.peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth)?;

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in self.peripheral.services() {
            for characteristic in service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                chars.insert(characteristic.uuid, characteristic);
            }
        }

        debug!("Discovered {} characteristics", chars.len());

        Ok(())
    }

    async fn has_service(&self, service: Uuid) -> bool {
        self.peripheral
            .services()
            .iter()
            .any(|s| s.uuid == service)
    }

    async fn has_endpoint(&self, service: Uuid, characteristic: Uuid) -> bool {
        self.characteristics
            .read()
            .get(&characteristic)
            .map(|c| c.service_uuid == service)
            .unwrap_or(false)
    }

    async fn start_notifications(&self, characteristic: Uuid) -> Result<()> {
        let c = self.characteristic(characteristic)?;
        self.peripheral
            .subscribe(&c)
            .await
            .map_err(Error::Bluetooth)?;
        debug!("Subscribed to notifications from {}", characteristic);
        Ok(())
    }

    async fn stop_notifications(&self, characteristic: Uuid) -> Result<()> {
        let c = self.characteristic(characteristic)?;
        self.peripheral
            .unsubscribe(&c)
            .await
            .map_err(Error::Bluetooth)?;
        debug!("Unsubscribed from notifications from {}", characteristic);
        Ok(())
    }

    async fn frames(&self, characteristic: Uuid) -> Result<FrameStream> {
        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)?;

        Ok(Box::pin(notifications.filter_map(move |n| async move {
            if n.uuid == characteristic {
                trace!("Frame from {}: {} bytes", n.uuid, n.value.len());
                Some(n.value)
            } else {
                None
            }
        })))
    }
}
