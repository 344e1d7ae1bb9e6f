//! Weigh-in orchestration.
//!
//! Ties the pipeline together: locate a scale, negotiate a measurement
//! characteristic, subscribe, persist the first accepted measurement,
//! and tear the session down.

use std::sync::Arc;
use tracing::{debug, info};

use crate::ble::locator::{DeviceChooser, DeviceLocator, ScaleDevice};
use crate::ble::negotiator::ConnectionNegotiator;
use crate::ble::subscription::subscribe;
use crate::ble::transport::{PeripheralTransport, ScaleTransport};
use crate::data::{MeasurementRecord, StoredProfile};
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::PersistenceGateway;

/// Orchestrates weigh-in sessions against a persistence gateway.
pub struct ScaleManager {
    locator: DeviceLocator,
    gateway: Arc<dyn PersistenceGateway>,
}

impl ScaleManager {
    /// Create a manager on the first available Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlatformUnsupported`] if the host has no
    /// Bluetooth capability.
    pub async fn new(gateway: Arc<dyn PersistenceGateway>) -> Result<Self> {
        Ok(Self {
            locator: DeviceLocator::new().await?,
            gateway,
        })
    }

    /// Create a manager with a specific locator.
    pub fn with_locator(locator: DeviceLocator, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { locator, gateway }
    }

    /// Run one full weigh-in session.
    ///
    /// Locates a scale via the chooser, then runs the session against it.
    /// Requires a saved user profile for BMI derivation. There is no
    /// internal timeout; wrap the call in a caller-imposed deadline.
    ///
    /// There is no automatic retry: connection-level failures surface as
    /// a single error and the caller decides whether to re-run the
    /// pipeline from discovery.
    pub async fn weigh_once(&self, chooser: &dyn DeviceChooser) -> Result<MeasurementRecord> {
        let user = self.current_user()?;
        let device = self.locator.locate(chooser).await?;
        self.weigh_device(device, &user).await
    }

    /// Run a weigh-in session against an already located scale.
    pub async fn weigh_device(
        &self,
        device: ScaleDevice,
        user: &StoredProfile,
    ) -> Result<MeasurementRecord> {
        info!(
            "Starting weigh-in on {} ({:?})",
            device.advertisement.identifier, device.advertisement.local_name
        );
        let transport = Arc::new(PeripheralTransport::new(device.peripheral));
        self.weigh_with_transport(transport, user).await
    }

    /// Run a weigh-in session over an explicit transport.
    pub async fn weigh_with_transport<T: ScaleTransport>(
        &self,
        transport: Arc<T>,
        user: &StoredProfile,
    ) -> Result<MeasurementRecord> {
        run_weigh_session(transport, user, self.gateway.as_ref()).await
    }

    /// The saved user profile, required before weighing.
    pub fn current_user(&self) -> Result<StoredProfile> {
        self.gateway
            .profile()?
            .ok_or_else(|| Error::Internal("no user profile saved".to_string()))
    }

    /// Access the persistence gateway.
    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }
}

/// Run one weigh-in session over a transport.
///
/// Negotiates a session, subscribes, waits for the first accepted
/// measurement, persists it with its BMI, and tears down. Frames
/// arriving after the first accepted measurement are still decoded in
/// arrival order, but only the first is recorded. Teardown runs on both
/// the success and the failure path.
pub async fn run_weigh_session<T: ScaleTransport>(
    transport: Arc<T>,
    user: &StoredProfile,
    gateway: &dyn PersistenceGateway,
) -> Result<MeasurementRecord> {
    let mut negotiator = ConnectionNegotiator::new(transport);
    let session = negotiator.negotiate().await?;

    debug!(
        "Session ready on service {}, characteristic {}",
        session.service(),
        session.characteristic()
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let teardown = subscribe(session, move |measurement| {
        let _ = tx.send(measurement);
    })
    .await?;

    let measurement = match rx.recv().await {
        Some(measurement) => measurement,
        None => {
            teardown.invoke().await?;
            return Err(Error::ConnectionLost);
        }
    };

    info!("Accepted measurement: {}", measurement);

    let bmi = metrics::bmi(measurement.weight_kg, user.profile.height_cm as f64);
    let record = gateway.insert_measurement(user.id, measurement.weight_kg, bmi);

    let teardown_result = teardown.invoke().await;
    let record = record?;
    teardown_result?;

    Ok(record)
}
