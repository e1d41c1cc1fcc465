use thiserror::Error;

/// Unified error type for wifi-connect
#[derive(Error, Debug)]
pub enum WifiError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Unknown preset: \"{0}\"")]
    UnknownPreset(String),

    #[error("\"{0}\" already has a registered request")]
    AlreadyRegistered(String),

    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("NetworkManager error: {0}")]
    NetworkManager(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl WifiError {
    /// Local rejections of a join call; the user can correct the input and retry.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_) | Self::UnknownPreset(_) | Self::AlreadyRegistered(_)
        )
    }
}

pub type WifiResult<T> = Result<T, WifiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_rejections_are_flagged() {
        assert!(WifiError::InvalidCredential("ssid is blank".into()).is_rejection());
        assert!(WifiError::UnknownPreset("home".into()).is_rejection());
        assert!(WifiError::AlreadyRegistered("home".into()).is_rejection());
        assert!(!WifiError::NetworkManager("boom".into()).is_rejection());
        assert!(!WifiError::DeviceNotFound("wlan0".into()).is_rejection());
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> WifiResult<()> {
            let tty: std::io::Result<()> =
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no tty"));
            tty?;
            Ok(())
        }
        let err = open().unwrap_err();
        assert!(matches!(err, WifiError::Io(_)));
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "IO error: no tty");
    }

    #[test]
    fn messages_name_the_network() {
        let err = WifiError::AlreadyRegistered("VITA_S20".into());
        assert_eq!(err.to_string(), "\"VITA_S20\" already has a registered request");
    }
}
