//! End-to-end pipeline tests over a scripted transport.
//!
//! The fake transport stands in for a real scale: it exposes a chosen
//! set of GATT endpoints and replays a fixed set of notification frames.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use uuid::Uuid;

use bodyscale_ble::ble::transport::FrameStream;
use bodyscale_ble::ble::uuids::{
    BODY_COMPOSITION_MEASUREMENT_UUID, BODY_COMPOSITION_SERVICE_UUID, SERVICE_CANDIDATES,
    WEIGHT_MEASUREMENT_UUID, WEIGHT_SCALE_SERVICE_UUID,
};
use bodyscale_ble::{
    run_weigh_session, subscribe, ConnectionNegotiator, Error, PersistenceGateway, Result,
    ScaleTransport, SqliteStore, UserProfile,
};

/// A scripted scale: advertises the given endpoint pairs and replays
/// the given frames on whatever characteristic gets subscribed.
struct FakeScale {
    endpoints: Vec<(Uuid, Uuid)>,
    frames: Vec<Vec<u8>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    notification_stops: AtomicUsize,
}

impl FakeScale {
    fn new(endpoints: Vec<(Uuid, Uuid)>, frames: Vec<Vec<u8>>) -> Self {
        Self {
            endpoints,
            frames,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            notification_stops: AtomicUsize::new(0),
        }
    }

    fn body_composition_only(frames: Vec<Vec<u8>>) -> Self {
        Self::new(
            vec![(
                BODY_COMPOSITION_SERVICE_UUID,
                BODY_COMPOSITION_MEASUREMENT_UUID,
            )],
            frames,
        )
    }
}

#[async_trait]
impl ScaleTransport for FakeScale {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn discover_services(&self) -> Result<()> {
        Ok(())
    }

    async fn has_service(&self, service: Uuid) -> bool {
        self.endpoints.iter().any(|(s, _)| *s == service)
    }

    async fn has_endpoint(&self, service: Uuid, characteristic: Uuid) -> bool {
        self.endpoints
            .iter()
            .any(|(s, c)| *s == service && *c == characteristic)
    }

    async fn start_notifications(&self, _characteristic: Uuid) -> Result<()> {
        Ok(())
    }

    async fn stop_notifications(&self, _characteristic: Uuid) -> Result<()> {
        self.notification_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn frames(&self, _characteristic: Uuid) -> Result<FrameStream> {
        Ok(Box::pin(stream::iter(self.frames.clone())))
    }
}

fn store_with_user(height_cm: u16) -> (Arc<SqliteStore>, i64) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let id = store.save_profile(&UserProfile::new("Alex", height_cm)).unwrap();
    (store, id)
}

#[tokio::test]
async fn weigh_session_over_body_composition_fallback() {
    // Scale exposes only the Body Composition service; the frame decodes
    // to 2.38 kg, which at 180 cm is a BMI of 0.7.
    let scale = Arc::new(FakeScale::body_composition_only(vec![vec![
        0x00, 0xDC, 0x01,
    ]]));
    let (store, _) = store_with_user(180);
    let user = store.profile().unwrap().unwrap();

    let record = run_weigh_session(scale.clone(), &user, store.as_ref())
        .await
        .unwrap();

    assert_eq!(record.weight_kg, 2.38);
    assert_eq!(record.bmi, 0.7);

    // Exactly one append reached the store.
    let recent = store.recent_measurements(user.id, 10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, record.id);

    // The session closed its own resources.
    assert_eq!(scale.connects.load(Ordering::SeqCst), 1);
    assert_eq!(scale.disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(scale.notification_stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn weigh_session_prefers_weight_scale_service() {
    let scale = Arc::new(FakeScale::new(
        vec![
            (WEIGHT_SCALE_SERVICE_UUID, WEIGHT_MEASUREMENT_UUID),
            (
                BODY_COMPOSITION_SERVICE_UUID,
                BODY_COMPOSITION_MEASUREMENT_UUID,
            ),
        ],
        vec![],
    ));

    let mut negotiator =
        ConnectionNegotiator::with_candidates(scale, SERVICE_CANDIDATES.to_vec());
    let session = negotiator.negotiate().await.unwrap();

    assert_eq!(session.service(), WEIGHT_SCALE_SERVICE_UUID);
    assert_eq!(session.characteristic(), WEIGHT_MEASUREMENT_UUID);
}

#[tokio::test]
async fn weigh_session_records_only_first_measurement() {
    // Several frames arrive before teardown completes; each is processed
    // in order but only the first accepted one is persisted.
    let scale = Arc::new(FakeScale::body_composition_only(vec![
        vec![0x00, 0x01],       // rejected: too short
        vec![0x00, 0x58, 0x02], // 3.00 kg, accepted
        vec![0x00, 0x59, 0x02], // arrives before teardown, not recorded
    ]));
    let (store, _) = store_with_user(175);
    let user = store.profile().unwrap().unwrap();

    let record = run_weigh_session(scale, &user, store.as_ref()).await.unwrap();

    assert_eq!(record.weight_kg, 3.00);
    assert_eq!(store.recent_measurements(user.id, 10).unwrap().len(), 1);
}

#[tokio::test]
async fn unsupported_device_fails_without_dangling_connection() {
    let scale = Arc::new(FakeScale::new(vec![], vec![]));

    let mut negotiator = ConnectionNegotiator::new(scale.clone());
    let result = negotiator.negotiate().await;

    assert!(matches!(result, Err(Error::ServiceNotFound)));
    assert_eq!(scale.connects.load(Ordering::SeqCst), 1);
    assert_eq!(scale.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn teardown_twice_is_safe() {
    let scale = Arc::new(FakeScale::body_composition_only(vec![]));

    let mut negotiator = ConnectionNegotiator::new(scale.clone());
    let session = negotiator.negotiate().await.unwrap();
    let teardown = subscribe(session, |_m| {}).await.unwrap();

    teardown.invoke().await.unwrap();
    teardown.invoke().await.unwrap();

    // The transport saw exactly one stop/disconnect cycle.
    assert_eq!(scale.notification_stops.load(Ordering::SeqCst), 1);
    assert_eq!(scale.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_ending_without_measurement_surfaces_connection_lost() {
    let scale = Arc::new(FakeScale::body_composition_only(vec![
        vec![0x00], // rejected; stream then ends
    ]));
    let (store, _) = store_with_user(180);
    let user = store.profile().unwrap().unwrap();

    let result = run_weigh_session(scale.clone(), &user, store.as_ref()).await;

    assert!(matches!(result, Err(Error::ConnectionLost)));
    assert!(store.recent_measurements(user.id, 10).unwrap().is_empty());
    // The failed session still released the transport.
    assert_eq!(scale.disconnects.load(Ordering::SeqCst), 1);
}
