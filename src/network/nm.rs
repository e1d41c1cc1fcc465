use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};
use zbus::Connection;

use crate::error::{WifiError, WifiResult};
use crate::event::Event;
use crate::network::association::Association;
use crate::network::dbus_proxies::*;
use crate::network::types::*;

/// NMDeviceType for 802.11 WiFi
const NM_DEVICE_TYPE_WIFI: u32 = 2;

/// Upper bound on how long shutdown waits for NM to answer pending calls
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// [`Association`] backed by NetworkManager over the system D-Bus.
///
/// Each request runs in its own tokio task: it adds a volatile connection
/// profile, activates it on the WiFi device and follows the resulting
/// active connection until it goes away. Outcomes are sent to the app's
/// event channel as [`Event::Association`].
pub struct NmAssociation {
    connection: Connection,
    interface: Option<String>,
    events: mpsc::UnboundedSender<Event>,
    next_id: AtomicU64,
    requests: Arc<Mutex<RequestBook<JoinHandle<()>>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl NmAssociation {
    /// Connect to the system D-Bus
    pub async fn new(
        interface: Option<String>,
        events: mpsc::UnboundedSender<Event>,
    ) -> WifiResult<Self> {
        let connection = Connection::system().await?;
        Ok(Self {
            connection,
            interface,
            events,
            next_id: AtomicU64::new(0),
            requests: Arc::new(Mutex::new(RequestBook::default())),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Check if NetworkManager is running
    pub async fn is_running(&self) -> bool {
        let proxy = match NetworkManagerProxy::new(&self.connection).await {
            Ok(p) => p,
            Err(_) => return false,
        };
        proxy.version().await.is_ok()
    }

    /// Get NM version string
    pub async fn version(&self) -> WifiResult<String> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        Ok(proxy.version().await?)
    }

    /// Check if wireless is enabled
    pub async fn wireless_enabled(&self) -> WifiResult<bool> {
        let proxy = NetworkManagerProxy::new(&self.connection).await?;
        Ok(proxy.wireless_enabled().await?)
    }

    /// Wait for deactivations started by `release` to finish, including
    /// requests released while NM was still creating their connection.
    pub async fn drain(&self) {
        let pending = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if pending.is_empty() {
            return;
        }
        debug!("Waiting for {} pending NetworkManager call(s)", pending.len());
        if tokio::time::timeout(DRAIN_TIMEOUT, futures::future::join_all(pending))
            .await
            .is_err()
        {
            warn!("NetworkManager did not answer within {:?}; exiting anyway", DRAIN_TIMEOUT);
        }
    }

    fn track(&self, task: JoinHandle<()>) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }
}

impl Association for NmAssociation {
    fn request(&self, credential: &NetworkCredential) -> WifiResult<RequestHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WifiError::NetworkManager(format!("cannot start request: {e}")))?;
        let handle = RequestHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.requests).open(handle);

        let task = RequestTask {
            handle,
            credential: credential.clone(),
            connection: self.connection.clone(),
            interface: self.interface.clone(),
            events: self.events.clone(),
            requests: self.requests.clone(),
        };
        let join = runtime.spawn(task.run());
        lock(&self.requests).attach(handle, join);

        debug!("Spawned request {} for \"{}\"", handle, credential.ssid());
        Ok(handle)
    }

    fn release(&self, handle: RequestHandle) {
        let release = lock(&self.requests).release(handle);
        match release {
            Release::Unknown => {}
            Release::Finished(task) => {
                if let Some(task) = task {
                    task.abort();
                }
            }
            Release::Deferred(task) => {
                // NM may already be creating the connection; the task tears it down
                debug!("Released {} during activation", handle);
                if let Some(task) = task {
                    self.track(task);
                }
            }
            Release::Deactivate(path, task) => {
                if let Some(task) = task {
                    task.abort();
                }
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    warn!("No runtime to deactivate {} on", path);
                    return;
                };
                let connection = self.connection.clone();
                self.track(runtime.spawn(async move {
                    if let Err(e) = deactivate(&connection, &path).await {
                        debug!("Deactivating {} failed: {}", path, e);
                    }
                }));
            }
        }
    }
}

fn lock<T>(requests: &Mutex<RequestBook<T>>) -> MutexGuard<'_, RequestBook<T>> {
    requests.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Request bookkeeping ───────────────────────────────────────────────

/// Where a request stands from the backend's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    /// `AddAndActivateConnection2` has not answered yet
    Activating,
    /// NM created this active connection and it has not gone down
    Active(OwnedObjectPath),
    /// The connection went down or never came up
    Ended,
}

#[derive(Debug)]
struct Tracked<T> {
    task: Option<T>,
    phase: Phase,
    released: bool,
}

/// What `release` has to do for a handle.
#[derive(Debug, PartialEq, Eq)]
enum Release<T> {
    Unknown,
    /// Still activating: the request task deactivates once NM returns the path
    Deferred(Option<T>),
    Deactivate(OwnedObjectPath, Option<T>),
    Finished(Option<T>),
}

/// Shared between `release` and the request tasks. `T` is the task handle.
#[derive(Debug)]
struct RequestBook<T> {
    entries: HashMap<RequestHandle, Tracked<T>>,
}

impl<T> Default for RequestBook<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> RequestBook<T> {
    fn open(&mut self, handle: RequestHandle) {
        self.entries.insert(
            handle,
            Tracked {
                task: None,
                phase: Phase::Activating,
                released: false,
            },
        );
    }

    fn attach(&mut self, handle: RequestHandle, task: T) {
        if let Some(tracked) = self.entries.get_mut(&handle) {
            tracked.task = Some(task);
        }
    }

    fn release(&mut self, handle: RequestHandle) -> Release<T> {
        let Some(tracked) = self.entries.get_mut(&handle) else {
            return Release::Unknown;
        };
        if tracked.phase == Phase::Activating {
            tracked.released = true;
            return Release::Deferred(tracked.task.take());
        }
        match self.entries.remove(&handle) {
            Some(Tracked {
                task,
                phase: Phase::Active(path),
                ..
            }) => Release::Deactivate(path, task),
            Some(tracked) => Release::Finished(tracked.task),
            None => Release::Unknown,
        }
    }

    /// Record the path NM returned. `false` means the request was released
    /// meanwhile: the entry is gone and the caller must deactivate `path`.
    fn activated(&mut self, handle: RequestHandle, path: &OwnedObjectPath) -> bool {
        match self.entries.get_mut(&handle) {
            Some(tracked) if !tracked.released => {
                tracked.phase = Phase::Active(path.clone());
                true
            }
            _ => {
                self.entries.remove(&handle);
                false
            }
        }
    }

    fn ended(&mut self, handle: RequestHandle) {
        let released = match self.entries.get_mut(&handle) {
            Some(tracked) => {
                tracked.phase = Phase::Ended;
                tracked.released
            }
            None => return,
        };
        if released {
            self.entries.remove(&handle);
        }
    }
}

// ── Per-request task ──────────────────────────────────────────────────

struct RequestTask {
    handle: RequestHandle,
    credential: NetworkCredential,
    connection: Connection,
    interface: Option<String>,
    events: mpsc::UnboundedSender<Event>,
    requests: Arc<Mutex<RequestBook<JoinHandle<()>>>>,
}

impl RequestTask {
    async fn run(self) {
        let active = match activate(&self.connection, self.interface.as_deref(), &self.credential)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!("Activation of \"{}\" failed: {}", self.credential.ssid(), e);
                self.notify(AssociationEventKind::Unavailable(Some(e.to_string())));
                return;
            }
        };
        if !lock(&self.requests).activated(self.handle, &active) {
            info!("{} was released while activating, deactivating {}", self.handle, active);
            if let Err(e) = deactivate(&self.connection, &active).await {
                debug!("Deactivating {} failed: {}", active, e);
            }
            return;
        }

        let mut tracker = ActivationTracker::default();
        if let Err(e) = self.watch(&active, &mut tracker).await {
            warn!("Lost track of {}: {}", active, e);
            if let Some(kind) = tracker.ended() {
                self.notify(kind);
            }
        }
    }

    async fn watch(
        &self,
        active: &OwnedObjectPath,
        tracker: &mut ActivationTracker,
    ) -> WifiResult<()> {
        let proxy = ActiveConnectionProxy::builder(&self.connection)
            .path(active.clone())?
            .build()
            .await?;

        // Subscribe before reading the current state so no transition is missed
        let mut changes = proxy.receive_activation_state_changed().await?;

        let initial = ActiveConnectionState::from_nm(proxy.state().await?);
        if let Some(kind) = tracker.observe(initial, None) {
            self.notify(kind);
        }

        while !tracker.is_finished() {
            let Some(signal) = changes.next().await else {
                if let Some(kind) = tracker.ended() {
                    self.notify(kind);
                }
                break;
            };
            let args = signal.args()?;
            let state = ActiveConnectionState::from_nm(*args.state());
            debug!("{} -> {:?} (reason {})", active, state, args.reason());
            if let Some(kind) = tracker.observe(state, Some(*args.reason())) {
                self.notify(kind);
            }
        }
        Ok(())
    }

    fn notify(&self, kind: AssociationEventKind) {
        // Connection is already down; release must not deactivate it again
        if !matches!(kind, AssociationEventKind::Available) {
            lock(&self.requests).ended(self.handle);
        }
        let event = AssociationEvent {
            handle: self.handle,
            ssid: self.credential.ssid().to_string(),
            kind,
        };
        if self.events.send(Event::Association(event)).is_err() {
            debug!("Event channel closed, dropping event for {}", self.handle);
        }
    }
}

/// Turns NM active-connection states into association events.
#[derive(Debug, Default)]
struct ActivationTracker {
    activated: bool,
    finished: bool,
}

impl ActivationTracker {
    fn observe(
        &mut self,
        state: ActiveConnectionState,
        reason: Option<u32>,
    ) -> Option<AssociationEventKind> {
        if self.finished {
            return None;
        }
        match state {
            ActiveConnectionState::Activated if !self.activated => {
                self.activated = true;
                Some(AssociationEventKind::Available)
            }
            ActiveConnectionState::Deactivated => {
                self.finished = true;
                if self.activated {
                    Some(AssociationEventKind::Lost)
                } else {
                    Some(AssociationEventKind::Unavailable(
                        reason.map(|r| state_reason(r).to_string()),
                    ))
                }
            }
            _ => None,
        }
    }

    /// The state stream stopped before the connection reached Deactivated.
    fn ended(&mut self) -> Option<AssociationEventKind> {
        if self.finished {
            return None;
        }
        self.finished = true;
        if self.activated {
            Some(AssociationEventKind::Lost)
        } else {
            Some(AssociationEventKind::Unavailable(Some(
                "NetworkManager stopped reporting the connection".into(),
            )))
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

// ── D-Bus operations ──────────────────────────────────────────────────

/// Add a volatile profile for the credential and activate it.
/// Returns the active connection path.
async fn activate(
    connection: &Connection,
    interface: Option<&str>,
    credential: &NetworkCredential,
) -> WifiResult<OwnedObjectPath> {
    let nm_proxy = NetworkManagerProxy::new(connection).await?;
    if !nm_proxy.wireless_enabled().await.unwrap_or(true) {
        warn!("Wireless is disabled; activation of \"{}\" will fail", credential.ssid());
    }

    let device = find_wifi_device(connection, interface).await?;
    let options = HashMap::from([("persist", Value::from("volatile"))]);

    let (_settings_path, active_path, _result) = nm_proxy
        .add_and_activate_connection2(
            wifi_settings(credential),
            &device,
            &ObjectPath::from_static_str_unchecked("/"),
            options,
        )
        .await?;

    info!(
        "Activating WiFi '{}', active connection: {}",
        credential.ssid(),
        active_path
    );
    Ok(active_path)
}

async fn deactivate(connection: &Connection, active: &OwnedObjectPath) -> WifiResult<()> {
    let nm_proxy = NetworkManagerProxy::new(connection).await?;
    nm_proxy.deactivate_connection(active).await?;
    info!("Deactivated connection: {}", active);
    Ok(())
}

/// Find the WiFi device, optionally by interface name
async fn find_wifi_device(
    connection: &Connection,
    interface: Option<&str>,
) -> WifiResult<OwnedObjectPath> {
    let nm_proxy = NetworkManagerProxy::new(connection).await?;
    let devices = nm_proxy.get_devices().await?;

    for path in devices {
        let dev_proxy = DeviceProxy::builder(connection)
            .path(path.clone())?
            .build()
            .await?;

        if dev_proxy.device_type().await.unwrap_or(0) != NM_DEVICE_TYPE_WIFI {
            continue;
        }
        match interface {
            Some(name) if dev_proxy.interface().await.unwrap_or_default() != name => continue,
            _ => return Ok(path),
        }
    }

    Err(WifiError::DeviceNotFound(
        interface.unwrap_or("no WiFi device").to_string(),
    ))
}

/// NM connection settings for a WPA2-PSK infrastructure network with DHCP.
pub fn wifi_settings(
    credential: &NetworkCredential,
) -> HashMap<&'static str, HashMap<&'static str, Value<'_>>> {
    let conn_settings = HashMap::from([
        ("id", Value::from(credential.ssid())),
        ("type", Value::from("802-11-wireless")),
        ("autoconnect", Value::from(false)),
    ]);

    let wifi_settings = HashMap::from([
        ("ssid", Value::from(credential.ssid().as_bytes().to_vec())),
        ("mode", Value::from("infrastructure")),
        ("security", Value::from("802-11-wireless-security")),
    ]);

    let sec_settings = HashMap::from([
        ("key-mgmt", Value::from("wpa-psk")),
        ("psk", Value::from(credential.passphrase())),
    ]);

    HashMap::from([
        ("connection", conn_settings),
        ("802-11-wireless", wifi_settings),
        ("802-11-wireless-security", sec_settings),
        ("ipv4", HashMap::from([("method", Value::from("auto"))])),
        ("ipv6", HashMap::from([("method", Value::from("auto"))])),
    ])
}
