use crate::error::WifiResult;

use super::types::{NetworkCredential, RequestHandle};

/// The host's network-association facility.
///
/// `request` returns as soon as the request is registered. Outcomes arrive
/// later as [`AssociationEvent`](super::types::AssociationEvent)s on the
/// single channel the backend was built with, carrying the handle and SSID
/// so they can be matched back to the registry.
pub trait Association: Send + Sync {
    /// Ask the host to join a WPA2 network over WiFi.
    fn request(&self, credential: &NetworkCredential) -> WifiResult<RequestHandle>;

    /// Drop a request; tears the link down if it is up. Unknown handles are ignored.
    fn release(&self, handle: RequestHandle);
}
