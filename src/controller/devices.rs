//! Device listing and selection

use crate::host::SurfaceHost;
use crate::model::{Direction, SurfaceKind};

use super::surfaces;
use super::{SessionController, SessionError};

impl<H: SurfaceHost> SessionController<H> {
    /// Re-query the device list and redraw it.
    pub async fn show_devices(&mut self) -> Result<(), SessionError> {
        if self.session.is_none() {
            return Err(SessionError::Closed);
        }

        let devices = self.backend.list_devices().await?;
        tracing::info!(count = devices.len(), "Devices refreshed");

        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        session.replace_devices(devices);
        surfaces::render_devices(&mut self.host, session)?;
        Ok(())
    }

    pub fn select_device(&mut self, direction: Direction) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        let previous = session.selected_device_index();
        let Some(current) = session.select_device(direction) else {
            tracing::debug!("No devices to select");
            return Ok(());
        };
        tracing::debug!(
            device = ?session.selected_device().map(|d| &d.name),
            "Device selected"
        );

        if let Some(id) = session.surface_of(SurfaceKind::Devices) {
            surfaces::move_marker(&mut self.host, id, previous, current)?;
        }
        Ok(())
    }
}
