mod desktop;

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use desktop::{DesktopNetwork, DesktopPermissions};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("network state unavailable: {0}")]
    NetworkState(String),
    #[error("permission service failed: {0}")]
    Permission(String),
    #[error("invalid connection type: {0}")]
    InvalidConnectionType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Ethernet,
    Cellular,
    None,
    Unknown,
}

impl ConnectionType {
    /// The only connection a Wi-Fi-only policy lets downloads through on.
    pub fn is_wifi(&self) -> bool {
        matches!(self, Self::Wifi)
    }
}

impl Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wifi => "wifi",
            Self::Ethernet => "ethernet",
            Self::Cellular => "cellular",
            Self::None => "none",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for ConnectionType {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wifi" | "wi-fi" => Ok(Self::Wifi),
            "ethernet" => Ok(Self::Ethernet),
            "cellular" => Ok(Self::Cellular),
            "none" => Ok(Self::None),
            "unknown" => Ok(Self::Unknown),
            _ => Err(DeviceError::InvalidConnectionType(s.to_string())),
        }
    }
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn connection_type(&self) -> Result<ConnectionType, DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionResponse {
    pub status: PermissionStatus,
    /// False once the user refused permanently, only the system settings can
    /// grant it afterwards.
    pub can_ask_again: bool,
}

impl PermissionResponse {
    pub fn is_granted(&self) -> bool {
        self.status == PermissionStatus::Granted
    }
}

/// Media-library write permission.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn get_permissions(&self) -> Result<PermissionResponse, DeviceError>;
    async fn request_permissions(&self) -> Result<PermissionResponse, DeviceError>;
    /// Deep link into the app's system settings page.
    async fn open_settings(&self) -> Result<(), DeviceError>;
}
