use async_trait::async_trait;

use super::{ConnectionType, DeviceError, NetworkProbe, PermissionProvider, PermissionResponse, PermissionStatus};

/// Reports the connection type set in the config; desktops have no
/// connectivity API worth querying.
#[derive(Debug, Clone)]
pub struct DesktopNetwork {
    connection: ConnectionType,
}

impl DesktopNetwork {
    pub fn new(connection: ConnectionType) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl NetworkProbe for DesktopNetwork {
    async fn connection_type(&self) -> Result<ConnectionType, DeviceError> {
        Ok(self.connection)
    }
}

/// The filesystem gallery needs no grant.
#[derive(Debug, Clone, Default)]
pub struct DesktopPermissions;

#[async_trait]
impl PermissionProvider for DesktopPermissions {
    async fn get_permissions(&self) -> Result<PermissionResponse, DeviceError> {
        Ok(PermissionResponse {
            status: PermissionStatus::Granted,
            can_ask_again: true,
        })
    }

    async fn request_permissions(&self) -> Result<PermissionResponse, DeviceError> {
        self.get_permissions().await
    }

    async fn open_settings(&self) -> Result<(), DeviceError> {
        info!("No system settings page on desktop");
        Ok(())
    }
}
