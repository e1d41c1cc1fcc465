use std::collections::HashMap;

use super::types::{RegistrationState, RequestHandle};

/// SSID → handle of its in-flight or active association request.
///
/// Holds at most one handle per SSID. A second insert for the same SSID is
/// refused and leaves the stored handle alone.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    entries: HashMap<String, RequestHandle>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and changes nothing) if the SSID is already registered.
    pub fn insert(&mut self, ssid: &str, handle: RequestHandle) -> bool {
        if self.entries.contains_key(ssid) {
            return false;
        }
        self.entries.insert(ssid.to_string(), handle);
        true
    }

    pub fn get(&self, ssid: &str) -> Option<RequestHandle> {
        self.entries.get(ssid).copied()
    }

    pub fn contains(&self, ssid: &str) -> bool {
        self.entries.contains_key(ssid)
    }

    /// Remove the entry only if it still carries `handle`.
    pub fn remove_if(&mut self, ssid: &str, handle: RequestHandle) -> bool {
        if self.get(ssid) == Some(handle) {
            self.entries.remove(ssid);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, ssid: &str) -> Option<RequestHandle> {
        self.entries.remove(ssid)
    }

    pub fn drain(&mut self) -> Vec<(String, RequestHandle)> {
        self.entries.drain().collect()
    }

    pub fn state(&self, ssid: &str) -> RegistrationState {
        if self.contains(ssid) {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        }
    }

    /// Registered SSIDs in sorted order
    pub fn ssids(&self) -> Vec<&str> {
        let mut ssids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ssids.sort_unstable();
        ssids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_keeps_first_handle() {
        let mut reg = CallbackRegistry::new();
        assert!(reg.insert("home", RequestHandle::new(1)));
        assert!(!reg.insert("home", RequestHandle::new(2)));
        assert_eq!(reg.get("home"), Some(RequestHandle::new(1)));
        assert_eq!(reg.ssids(), vec!["home"]);
    }

    #[test]
    fn remove_if_checks_handle() {
        let mut reg = CallbackRegistry::new();
        reg.insert("home", RequestHandle::new(7));
        assert!(!reg.remove_if("home", RequestHandle::new(3)));
        assert_eq!(reg.state("home"), RegistrationState::Registered);
        assert!(reg.remove_if("home", RequestHandle::new(7)));
        assert_eq!(reg.state("home"), RegistrationState::Unregistered);
        assert!(reg.ssids().is_empty());
    }

    #[test]
    fn ssids_are_sorted() {
        let mut reg = CallbackRegistry::new();
        reg.insert("VITA_S20", RequestHandle::new(2));
        reg.insert("UNS WiFi 5G", RequestHandle::new(1));
        assert_eq!(reg.ssids(), vec!["UNS WiFi 5G", "VITA_S20"]);

        let mut drained = reg.drain();
        drained.sort();
        assert_eq!(drained.len(), 2);
        assert!(reg.ssids().is_empty());
    }
}
