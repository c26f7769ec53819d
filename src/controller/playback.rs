//! Playback control methods
//!
//! None of these need an open session; without one, playback goes to
//! whichever device the service picks.

use crate::host::SurfaceHost;
use crate::model::PlaybackAction;

use super::{SessionController, SessionError};

impl<H: SurfaceHost> SessionController<H> {
    pub async fn play(&mut self, uri: &str) -> Result<(), SessionError> {
        let device_id = self
            .session
            .as_ref()
            .and_then(|session| session.selected_device_id())
            .map(str::to_string);
        tracing::debug!(uri, device_id = ?device_id, "Starting playback");

        self.backend.play(uri, device_id).await?;
        tracing::info!(uri, "Playback started");
        Ok(())
    }

    pub async fn playback(&mut self, action: PlaybackAction) -> Result<(), SessionError> {
        tracing::debug!(action = ?action, "Playback control");
        match action {
            PlaybackAction::Next => self.backend.skip().await?,
            PlaybackAction::Pause => self.backend.toggle_pause().await?,
            PlaybackAction::Prev => self.backend.previous().await?,
        }
        Ok(())
    }

    pub async fn save(&mut self) -> Result<(), SessionError> {
        self.backend.like().await?;
        tracing::info!("Saved current track");
        Ok(())
    }
}
