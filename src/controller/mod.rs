//! Controller module - Session lifecycle and command handling
//!
//! The controller owns the single [`Session`] and turns each [`Command`]
//! into at most one backend call plus the surface writes that reflect it.
//! Commands run one at a time on `&mut self`, so session state needs no lock.
//!
//! - `surfaces`: open/close, layout and frame rendering
//! - `search`: searching, browsing and the result cursor
//! - `playback`: play, transport controls and saving
//! - `devices`: device listing and selection

mod devices;
mod playback;
mod search;
mod surfaces;

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, MusicBackend};
use crate::host::{NotifyLevel, SurfaceError, SurfaceHost};
use crate::model::{Command, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("search input is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Spotify is not open")]
    Closed,
}

pub struct SessionController<H: SurfaceHost> {
    pub(crate) host: H,
    pub(crate) backend: Arc<dyn MusicBackend>,
    pub(crate) session: Option<Session>,
}

impl<H: SurfaceHost> SessionController<H> {
    pub fn new(host: H, backend: Arc<dyn MusicBackend>) -> Self {
        Self {
            host,
            backend,
            session: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Run one command to completion. Failures are reported, never returned.
    pub async fn dispatch(&mut self, command: Command) {
        tracing::debug!(command = ?command, "Dispatching command");

        let result = match command {
            Command::Open => self.open().await,
            Command::ShowDevices => self.show_devices().await,
            Command::Close => {
                self.close();
                Ok(())
            }
            Command::Search(mode) => self.search(mode).await,
            Command::SelectDevice(direction) => self.select_device(direction),
            Command::Play(uri) => self.play(&uri).await,
            Command::Playback(action) => self.playback(action).await,
            Command::Save => self.save().await,
            Command::MoveCursor(direction) => self.move_cursor(direction),
            Command::Activate => self.activate().await,
        };

        if let Err(error) = result {
            self.report(&error);
        }
    }

    fn report(&mut self, error: &SessionError) {
        let message = Self::format_error(error);
        let level = match error {
            SessionError::Input(_) => {
                tracing::debug!(error = %error, "Command rejected");
                NotifyLevel::Warn
            }
            _ => {
                tracing::error!(error = %error, "Command failed");
                NotifyLevel::Error
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.last_error = Some(message.clone());
        }
        self.host.notify(level, &message);
    }

    pub(crate) fn format_error(error: &SessionError) -> String {
        match error {
            SessionError::Backend(BackendError::Unauthorized) => {
                "Authentication expired. Refresh your Spotify token and restart.".to_string()
            }
            SessionError::Backend(BackendError::NotFound(detail)) if detail.contains("device") => {
                "No active device found. Start playing on Spotify and try again.".to_string()
            }
            SessionError::Backend(BackendError::NotFound(detail)) => {
                format!("Not found: {detail}")
            }
            SessionError::Backend(BackendError::Unavailable(detail)) => {
                format!("Spotify unavailable: {detail}")
            }
            SessionError::Backend(BackendError::MalformedResponse(_)) => {
                "Unexpected response from Spotify.".to_string()
            }
            SessionError::Surface(e) => format!("Display error: {e}"),
            SessionError::Input(InputError::Empty) => "Type something to search first.".to_string(),
            SessionError::Closed => error.to_string(),
        }
    }
}
