pub mod association;
pub mod dbus_proxies;
pub mod manager;
pub mod nm;
pub mod registry;
pub mod types;

pub use manager::ConnectionManager;
pub use nm::NmAssociation;
