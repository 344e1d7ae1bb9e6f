//! Service negotiation.
//!
//! Walks a connected device through the candidate service pairs in fixed
//! priority order and binds a [`ConnectionSession`] to the first pair the
//! device exposes.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::transport::ScaleTransport;
use crate::ble::uuids::{ServicePair, SERVICE_CANDIDATES};
use crate::error::{Error, Result};

/// Negotiation progress for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NegotiationState {
    /// No transport connection.
    #[default]
    Disconnected,
    /// Establishing the transport connection.
    Connecting,
    /// Looking for a candidate service.
    ResolvingService,
    /// Looking for the paired measurement characteristic.
    ResolvingCharacteristic,
    /// A session is bound; subscription may proceed.
    Ready,
    /// Negotiation failed; the transport has been torn down.
    Failed,
}

impl NegotiationState {
    /// Check if negotiation completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl std::fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::ResolvingService => write!(f, "ResolvingService"),
            Self::ResolvingCharacteristic => write!(f, "ResolvingCharacteristic"),
            Self::Ready => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// A fully bound session: open transport plus the resolved service and
/// characteristic identities.
///
/// A session is either fully resolved or does not exist; there is no
/// partially-bound state visible to callers. Exactly one session may be
/// active per device, and a session admits exactly one subscription --
/// both enforced by move semantics.
pub struct ConnectionSession<T: ScaleTransport> {
    transport: Arc<T>,
    pair: ServicePair,
}

impl<T: ScaleTransport> ConnectionSession<T> {
    /// The resolved service UUID.
    pub fn service(&self) -> Uuid {
        self.pair.service
    }

    /// The resolved measurement characteristic UUID.
    pub fn characteristic(&self) -> Uuid {
        self.pair.characteristic
    }

    /// Split the session into its transport and resolved pair.
    pub(crate) fn into_parts(self) -> (Arc<T>, ServicePair) {
        (self.transport, self.pair)
    }
}

impl<T: ScaleTransport> std::fmt::Debug for ConnectionSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("service", &self.pair.service)
            .field("characteristic", &self.pair.characteristic)
            .finish()
    }
}

/// Negotiates a measurement characteristic on one device.
pub struct ConnectionNegotiator<T: ScaleTransport> {
    transport: Arc<T>,
    candidates: Vec<ServicePair>,
    state: NegotiationState,
}

impl<T: ScaleTransport> ConnectionNegotiator<T> {
    /// Create a negotiator using the standard candidate pairs.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_candidates(transport, SERVICE_CANDIDATES.to_vec())
    }

    /// Create a negotiator with an explicit ordered candidate list.
    pub fn with_candidates(transport: Arc<T>, candidates: Vec<ServicePair>) -> Self {
        Self {
            transport,
            candidates,
            state: NegotiationState::Disconnected,
        }
    }

    /// Get the current negotiation state.
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Connect the transport and resolve a candidate pair.
    ///
    /// Candidates are tried strictly in order; the first pair whose
    /// service and characteristic both resolve wins. If none resolves,
    /// the transport is disconnected before [`Error::ServiceNotFound`]
    /// is surfaced, so no open connection dangles on failure.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionFailed`] if the transport cannot connect, or
    /// [`Error::ServiceNotFound`] if neither pair resolves. A negotiator
    /// in a terminal state returns [`Error::Internal`].
    pub async fn negotiate(&mut self) -> Result<ConnectionSession<T>> {
        if self.state.is_terminal() {
            return Err(Error::Internal(
                "negotiation already completed for this device".to_string(),
            ));
        }

        self.set_state(NegotiationState::Connecting);

        if let Err(e) = self.transport.connect().await {
            self.set_state(NegotiationState::Failed);
            return Err(Error::ConnectionFailed {
                reason: e.to_string(),
            });
        }

        if let Err(e) = self.transport.discover_services().await {
            self.fail_and_disconnect().await;
            return Err(Error::ConnectionFailed {
                reason: e.to_string(),
            });
        }

        match self.resolve_endpoint().await {
            Some(pair) => {
                self.set_state(NegotiationState::Ready);
                info!(
                    "Negotiation ready: service {}, characteristic {}",
                    pair.service, pair.characteristic
                );
                Ok(ConnectionSession {
                    transport: self.transport.clone(),
                    pair,
                })
            }
            None => {
                self.fail_and_disconnect().await;
                Err(Error::ServiceNotFound)
            }
        }
    }

    /// Walk the candidate list and return the first pair the device
    /// exposes, as a tagged result rather than error-driven fallback.
    async fn resolve_endpoint(&mut self) -> Option<ServicePair> {
        for pair in self.candidates.clone() {
            self.set_state(NegotiationState::ResolvingService);
            if !self.transport.has_service(pair.service).await {
                debug!("Service {} not present, trying next candidate", pair.service);
                continue;
            }

            self.set_state(NegotiationState::ResolvingCharacteristic);
            if self
                .transport
                .has_endpoint(pair.service, pair.characteristic)
                .await
            {
                return Some(pair);
            }

            debug!(
                "Characteristic {} missing from service {}, trying next candidate",
                pair.characteristic, pair.service
            );
        }

        None
    }

    async fn fail_and_disconnect(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!("Failed to disconnect after negotiation failure: {}", e);
        }
        self.set_state(NegotiationState::Failed);
    }

    fn set_state(&mut self, new_state: NegotiationState) {
        if self.state != new_state {
            debug!("Negotiation state: {} -> {}", self.state, new_state);
            self.state = new_state;
        }
    }
}
