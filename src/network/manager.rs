use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::PresetTable;
use crate::error::{WifiError, WifiResult};
use crate::network::association::Association;
use crate::network::registry::CallbackRegistry;
use crate::network::types::*;

/// Receives connection lifecycle events
pub trait EventSink {
    fn emit(&mut self, event: ConnectionEvent);
}

/// Mediates one association request per SSID and surfaces its lifecycle.
///
/// All methods take `&mut self`; the owner is expected to apply backend
/// events from the same task that calls [`join`](Self::join), so the
/// registry has a single writer.
pub struct ConnectionManager {
    association: Arc<dyn Association>,
    presets: PresetTable,
    registry: CallbackRegistry,
}

impl ConnectionManager {
    pub fn new(association: Arc<dyn Association>, presets: PresetTable) -> Self {
        Self {
            association,
            presets,
            registry: CallbackRegistry::new(),
        }
    }

    /// Register an association request for typed credentials or a preset.
    ///
    /// Rejections leave the registry untouched and make no backend call.
    pub fn join(&mut self, request: JoinRequest, sink: &mut impl EventSink) -> WifiResult<()> {
        let credential = self.resolve(request)?;
        let ssid = credential.ssid();

        if self.registry.contains(ssid) {
            return Err(WifiError::AlreadyRegistered(ssid.to_string()));
        }

        let handle = self.association.request(&credential)?;
        self.registry.insert(ssid, handle);
        info!("Requested association with \"{}\" ({})", ssid, handle);

        sink.emit(ConnectionEvent::Requested {
            ssid: ssid.to_string(),
        });
        Ok(())
    }

    fn resolve(&self, request: JoinRequest) -> WifiResult<NetworkCredential> {
        match request {
            JoinRequest::Credentials { ssid, passphrase } => NetworkCredential::new(ssid, passphrase),
            JoinRequest::Preset(key) => self
                .presets
                .get(&key)
                .cloned()
                .ok_or(WifiError::UnknownPreset(key)),
        }
    }

    /// Apply an outcome delivered by the association backend.
    pub fn handle_event(&mut self, event: AssociationEvent, sink: &mut impl EventSink) {
        let AssociationEvent { handle, ssid, kind } = event;
        let current = self.registry.get(&ssid) == Some(handle);
        if !current {
            debug!("Event for \"{}\" from stale request {}", ssid, handle);
        }

        match kind {
            AssociationEventKind::Available => {
                sink.emit(ConnectionEvent::Available { ssid });
            }
            AssociationEventKind::Unavailable(reason) => {
                sink.emit(ConnectionEvent::Unavailable {
                    ssid: ssid.clone(),
                    reason,
                });
                if current {
                    self.unregister(&ssid, handle);
                }
            }
            AssociationEventKind::Lost => {
                sink.emit(ConnectionEvent::Lost { ssid: ssid.clone() });
                if current {
                    self.unregister(&ssid, handle);
                }
            }
        }
    }

    fn unregister(&mut self, ssid: &str, handle: RequestHandle) {
        self.association.release(handle);
        self.registry.remove_if(ssid, handle);
        info!("Released request {} for \"{}\"", handle, ssid);
    }

    /// Explicitly drop the registration for `ssid`. Returns whether one existed.
    pub fn release(&mut self, ssid: &str) -> bool {
        match self.registry.remove(ssid) {
            Some(handle) => {
                self.association.release(handle);
                info!("Released request {} for \"{}\"", handle, ssid);
                true
            }
            None => {
                warn!("No registration for \"{}\" to release", ssid);
                false
            }
        }
    }

    /// Drop every registration; called when the session ends.
    pub fn release_all(&mut self) -> usize {
        let entries = self.registry.drain();
        for (ssid, handle) in &entries {
            self.association.release(*handle);
            debug!("Released request {} for \"{}\"", handle, ssid);
        }
        entries.len()
    }

    pub fn state(&self, ssid: &str) -> RegistrationState {
        self.registry.state(ssid)
    }

    pub fn handle(&self, ssid: &str) -> Option<RequestHandle> {
        self.registry.get(ssid)
    }

    pub fn registered(&self) -> Vec<&str> {
        self.registry.ssids()
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::association::mock::MockAssociation;

    impl EventSink for Vec<ConnectionEvent> {
        fn emit(&mut self, event: ConnectionEvent) {
            self.push(event);
        }
    }

    fn presets() -> PresetTable {
        PresetTable::from_pairs([("UNS WiFi 5G", "uns1234567!"), ("VITA_S20", "qqqqwwww")])
            .unwrap()
    }

    fn setup() -> (Arc<MockAssociation>, ConnectionManager) {
        let mock = Arc::new(MockAssociation::default());
        let manager = ConnectionManager::new(mock.clone(), presets());
        (mock, manager)
    }

    fn typed(ssid: &str, passphrase: &str) -> JoinRequest {
        JoinRequest::Credentials {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        }
    }

    fn event(handle: RequestHandle, ssid: &str, kind: AssociationEventKind) -> AssociationEvent {
        AssociationEvent {
            handle,
            ssid: ssid.into(),
            kind,
        }
    }

    #[test]
    fn preset_join_uses_table_passphrase() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();

        manager
            .join(JoinRequest::Preset("UNS WiFi 5G".into()), &mut events)
            .unwrap();

        let requests = mock.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "UNS WiFi 5G");
        assert_eq!(requests[0].1, "uns1234567!");
        assert_eq!(manager.state("UNS WiFi 5G"), RegistrationState::Registered);
        assert_eq!(
            events,
            vec![ConnectionEvent::Requested {
                ssid: "UNS WiFi 5G".into()
            }]
        );
    }

    #[test]
    fn repeated_join_is_rejected_and_keeps_handle() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        manager
            .join(JoinRequest::Preset("UNS WiFi 5G".into()), &mut events)
            .unwrap();
        let first = manager.handle("UNS WiFi 5G");

        let err = manager
            .join(JoinRequest::Preset("UNS WiFi 5G".into()), &mut events)
            .unwrap_err();
        assert!(matches!(err, WifiError::AlreadyRegistered(ref s) if s == "UNS WiFi 5G"));

        // Same network typed by hand counts as the same registration
        let err = manager
            .join(typed("UNS WiFi 5G", "other-password"), &mut events)
            .unwrap_err();
        assert!(matches!(err, WifiError::AlreadyRegistered(_)));

        assert_eq!(manager.handle("UNS WiFi 5G"), first);
        assert_eq!(mock.request_count(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_preset_has_no_side_effect() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();

        for key in ["", "home", "uns wifi 5g", "VITA_S2"] {
            let err = manager
                .join(JoinRequest::Preset(key.into()), &mut events)
                .unwrap_err();
            assert!(matches!(err, WifiError::UnknownPreset(_)), "{key:?}");
        }
        assert!(manager.registered().is_empty());
        assert_eq!(mock.request_count(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn blank_credentials_make_no_backend_call() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();

        for (ssid, pw) in [("", ""), ("home", ""), ("", "qqqqwwww"), ("  ", "  ")] {
            let err = manager.join(typed(ssid, pw), &mut events).unwrap_err();
            assert!(matches!(err, WifiError::InvalidCredential(_)));
        }
        assert!(manager.registered().is_empty());
        assert_eq!(mock.request_count(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn lost_frees_ssid_for_next_join() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        manager.join(typed("home", "hunter22"), &mut events).unwrap();
        let handle = manager.handle("home").unwrap();

        manager.handle_event(event(handle, "home", AssociationEventKind::Available), &mut events);
        assert_eq!(manager.state("home"), RegistrationState::Registered);

        manager.handle_event(event(handle, "home", AssociationEventKind::Lost), &mut events);
        assert_eq!(manager.state("home"), RegistrationState::Unregistered);
        assert_eq!(mock.released(), vec![handle]);

        manager.join(typed("home", "hunter22"), &mut events).unwrap();
        assert_eq!(manager.state("home"), RegistrationState::Registered);
        assert_ne!(manager.handle("home"), Some(handle));

        let lines: Vec<String> = events.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "[home] requested",
                "[home] available",
                "[home] lost",
                "[home] requested"
            ]
        );
    }

    #[test]
    fn unavailable_clears_registration() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        manager
            .join(JoinRequest::Preset("VITA_S20".into()), &mut events)
            .unwrap();
        let handle = manager.handle("VITA_S20").unwrap();

        manager.handle_event(
            event(
                handle,
                "VITA_S20",
                AssociationEventKind::Unavailable(Some("wireless is disabled".into())),
            ),
            &mut events,
        );

        assert_eq!(manager.state("VITA_S20"), RegistrationState::Unregistered);
        assert_eq!(mock.released(), vec![handle]);
        assert_eq!(
            events.last().unwrap().to_string(),
            "[VITA_S20] unavailable: wireless is disabled"
        );
    }

    #[test]
    fn stale_event_does_not_touch_newer_registration() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        manager.join(typed("home", "hunter22"), &mut events).unwrap();
        let old = manager.handle("home").unwrap();
        assert!(manager.release("home"));

        manager.join(typed("home", "hunter22"), &mut events).unwrap();
        let new = manager.handle("home").unwrap();

        manager.handle_event(event(old, "home", AssociationEventKind::Lost), &mut events);
        assert_eq!(manager.handle("home"), Some(new));
        assert_eq!(mock.released(), vec![old]);
        // Still logged
        assert_eq!(events.last().unwrap(), &ConnectionEvent::Lost { ssid: "home".into() });
    }

    #[test]
    fn backend_failure_registers_nothing() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        mock.refuse_requests(true);

        let err = manager.join(typed("home", "hunter22"), &mut events).unwrap_err();
        assert!(!err.is_rejection());
        assert_eq!(manager.state("home"), RegistrationState::Unregistered);
        assert!(events.is_empty());

        mock.refuse_requests(false);
        manager.join(typed("home", "hunter22"), &mut events).unwrap();
        assert_eq!(manager.state("home"), RegistrationState::Registered);
    }

    #[test]
    fn release_all_drops_everything() {
        let (mock, mut manager) = setup();
        let mut events = Vec::new();
        manager
            .join(JoinRequest::Preset("UNS WiFi 5G".into()), &mut events)
            .unwrap();
        manager
            .join(JoinRequest::Preset("VITA_S20".into()), &mut events)
            .unwrap();
        assert_eq!(manager.registered(), vec!["UNS WiFi 5G", "VITA_S20"]);

        assert_eq!(manager.release_all(), 2);
        assert!(manager.registered().is_empty());
        assert_eq!(mock.released().len(), 2);
        assert!(!manager.release("VITA_S20"));
    }
}
