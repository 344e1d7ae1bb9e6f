//! Subscription lifecycle for measurement notifications.
//!
//! [`subscribe`] consumes a ready session, starts the notification
//! stream, and routes every decodable frame to the caller's callback.
//! The returned [`Teardown`] handle stops notifications and closes the
//! transport; it is safe to invoke more than once.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::ble::negotiator::ConnectionSession;
use crate::ble::transport::ScaleTransport;
use crate::data::Measurement;
use crate::error::Result;
use crate::protocol::frame;
use futures::stream::StreamExt;

/// Start the notification stream on the session's characteristic.
///
/// Each incoming frame is decoded synchronously in arrival order;
/// `on_measurement` is invoked only when decoding succeeds and rejected
/// frames are silently dropped. Frames are not queued, reordered, or
/// batched, and more than one frame may arrive before teardown.
///
/// The session is taken by value, so a second subscription on the same
/// session is unrepresentable. If the subscription cannot be started the
/// transport is disconnected before the error surfaces; there is no
/// [`Teardown`] handle on the failure path, so nothing else could close
/// the connection.
pub async fn subscribe<T, F>(session: ConnectionSession<T>, on_measurement: F) -> Result<Teardown<T>>
where
    T: ScaleTransport,
    F: Fn(Measurement) + Send + Sync + 'static,
{
    let (transport, pair) = session.into_parts();

    if let Err(e) = transport.start_notifications(pair.characteristic).await {
        release_transport(transport.as_ref()).await;
        return Err(e);
    }

    let mut frames = match transport.frames(pair.characteristic).await {
        Ok(frames) => frames,
        Err(e) => {
            if let Err(stop_err) = transport.stop_notifications(pair.characteristic).await {
                warn!("Failed to stop notifications: {}", stop_err);
            }
            release_transport(transport.as_ref()).await;
            return Err(e);
        }
    };

    debug!(
        "Subscription active on characteristic {}",
        pair.characteristic
    );

    let running = Arc::new(AtomicBool::new(true));
    let task_running = running.clone();

    let reader = tokio::spawn(async move {
        while let Some(raw) = frames.next().await {
            if !task_running.load(Ordering::SeqCst) {
                break;
            }

            match frame::decode(&raw) {
                Some(measurement) => on_measurement(measurement),
                None => trace!("Dropping undecodable frame ({} bytes)", raw.len()),
            }
        }
        debug!("Notification reader stopped");
    });

    Ok(Teardown {
        transport,
        characteristic: pair.characteristic,
        running,
        reader: Mutex::new(Some(reader)),
        torn_down: AtomicBool::new(false),
    })
}

/// Disconnect after a subscription failure; the original error is the
/// one that surfaces.
async fn release_transport<T: ScaleTransport>(transport: &T) {
    if let Err(e) = transport.disconnect().await {
        warn!("Failed to disconnect after subscription failure: {}", e);
    }
}

/// Handle that stops notifications and closes the transport connection.
///
/// Both the success path and an abort path may end up invoking teardown,
/// so [`Teardown::invoke`] is idempotent: the second and later calls are
/// no-ops that return `Ok`.
pub struct Teardown<T: ScaleTransport> {
    transport: Arc<T>,
    characteristic: Uuid,
    running: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

impl<T: ScaleTransport> Teardown<T> {
    /// Stop the notification stream and close the connection.
    pub async fn invoke(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        debug!("Tearing down subscription on {}", self.characteristic);

        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
            let _ = handle.await;
        }

        if let Err(e) = self.transport.stop_notifications(self.characteristic).await {
            warn!("Failed to stop notifications: {}", e);
        }

        self.transport.disconnect().await?;

        Ok(())
    }

    /// Check whether teardown has already run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl<T: ScaleTransport> Drop for Teardown<T> {
    fn drop(&mut self) {
        // Last-resort: stop the reader task; the async teardown path is
        // the one that releases the transport.
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::negotiator::ConnectionNegotiator;
    use crate::ble::transport::MockScaleTransport;
    use crate::ble::uuids::SERVICE_CANDIDATES;
    use crate::data::WeightUnit;
    use futures::stream;

    /// Mock transport exposing the primary pair that will deliver the
    /// given frames and accept one stop/disconnect cycle.
    fn transport_with_frames(frames: Vec<Vec<u8>>) -> MockScaleTransport {
        let mut mock = MockScaleTransport::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_discover_services().returning(|| Ok(()));
        mock.expect_has_service().returning(|_| true);
        mock.expect_has_endpoint().returning(|_, _| true);
        mock.expect_start_notifications().times(1).returning(|_| Ok(()));
        mock.expect_frames()
            .times(1)
            .returning(move |_| Ok(Box::pin(stream::iter(frames.clone()))));
        mock.expect_stop_notifications().times(1).returning(|_| Ok(()));
        mock.expect_disconnect().times(1).returning(|| Ok(()));
        mock
    }

    async fn session_for(
        mock: MockScaleTransport,
    ) -> ConnectionSession<MockScaleTransport> {
        let mut negotiator =
            ConnectionNegotiator::with_candidates(Arc::new(mock), SERVICE_CANDIDATES.to_vec());
        negotiator.negotiate().await.unwrap()
    }

    #[tokio::test]
    async fn test_measurements_reach_callback_in_order() {
        let frames = vec![
            vec![0x00, 0x58, 0x02], // 3.00 kg
            vec![0x01, 0x58, 0x02], // 6.00 lbs-flagged
        ];
        let session = session_for(transport_with_frames(frames)).await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let teardown = subscribe(session, move |m| {
            let _ = tx.send(m);
        })
        .await
        .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.weight_kg, 3.00);
        assert_eq!(first.unit, WeightUnit::Kilograms);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.weight_kg, 6.00);
        assert_eq!(second.unit, WeightUnit::Pounds);

        teardown.invoke().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_frames_are_dropped_silently() {
        let frames = vec![
            vec![0x00],             // too short
            vec![0x00, 0x01],       // too short
            vec![0x00, 0xDC, 0x01], // 2.38 kg
        ];
        let session = session_for(transport_with_frames(frames)).await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let teardown = subscribe(session, move |m| {
            let _ = tx.send(m);
        })
        .await
        .unwrap();

        // Only the valid frame produces a measurement.
        let only = rx.recv().await.unwrap();
        assert_eq!(only.weight_kg, 2.38);

        teardown.invoke().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_notification_start_disconnects() {
        // times(1) on disconnect asserts no open connection survives a
        // failed subscription; no teardown handle exists to close it.
        let mut mock = MockScaleTransport::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_discover_services().returning(|| Ok(()));
        mock.expect_has_service().returning(|_| true);
        mock.expect_has_endpoint().returning(|_, _| true);
        mock.expect_start_notifications()
            .times(1)
            .returning(|_| Err(crate::error::Error::NotConnected));
        mock.expect_disconnect().times(1).returning(|| Ok(()));

        let session = session_for(mock).await;
        let result = subscribe(session, |_m| {}).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_frame_stream_stops_and_disconnects() {
        // Notifications already started, so the failure path unwinds
        // them before disconnecting.
        let mut mock = MockScaleTransport::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_discover_services().returning(|| Ok(()));
        mock.expect_has_service().returning(|_| true);
        mock.expect_has_endpoint().returning(|_, _| true);
        mock.expect_start_notifications().times(1).returning(|_| Ok(()));
        mock.expect_frames()
            .times(1)
            .returning(|_| Err(crate::error::Error::NotConnected));
        mock.expect_stop_notifications().times(1).returning(|_| Ok(()));
        mock.expect_disconnect().times(1).returning(|| Ok(()));

        let session = session_for(mock).await;
        let result = subscribe(session, |_m| {}).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        // times(1) on stop/disconnect in the mock proves the second
        // invoke touches nothing.
        let session = session_for(transport_with_frames(vec![])).await;
        let teardown = subscribe(session, |_m| {}).await.unwrap();

        teardown.invoke().await.unwrap();
        assert!(teardown.is_torn_down());
        teardown.invoke().await.unwrap();
    }
}
