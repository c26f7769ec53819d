//! Searching, drill-down browsing and the result cursor

use crate::backend::SEARCH_LIMIT;
use crate::host::SurfaceHost;
use crate::model::{Direction, ResultRow, SearchMode, SurfaceKind};

use super::surfaces;
use super::{InputError, SessionController, SessionError};

/// Where activating a collection row leads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Browse {
    ArtistAlbums,
    AlbumTracks,
    PlaylistTracks,
}

impl Browse {
    fn mode(self) -> SearchMode {
        match self {
            Self::ArtistAlbums => SearchMode::Album,
            Self::AlbumTracks | Self::PlaylistTracks => SearchMode::Track,
        }
    }
}

impl<H: SurfaceHost> SessionController<H> {
    /// Search for whatever is typed in the input surface.
    pub async fn search(&mut self, mode: SearchMode) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        let input = session
            .surface_of(SurfaceKind::Input)
            .ok_or(SessionError::Closed)?;

        let query = self.host.read_line(input, 0)?.trim().to_string();
        if query.is_empty() {
            return Err(InputError::Empty.into());
        }

        tracing::debug!(mode = %mode, query = %query, "Searching");
        let rows = self.backend.search(mode, &query, SEARCH_LIMIT).await?;
        tracing::info!(mode = %mode, count = rows.len(), "Search completed");

        session.mode = mode;
        session.query = query;
        session.replace_results(rows);
        surfaces::retitle(&mut self.host, session)?;
        surfaces::render_results(&mut self.host, session)?;
        Ok(())
    }

    /// Act on the row under the cursor: play tracks and shows, open everything else.
    pub async fn activate(&mut self) -> Result<(), SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::Closed)?;
        let Some(row) = session.selected_result().cloned() else {
            tracing::debug!("Nothing under the cursor");
            return Ok(());
        };

        let mode = session.mode;
        let target = match mode {
            SearchMode::Track | SearchMode::Show => return self.play(&row.uri).await,
            SearchMode::Artist => Browse::ArtistAlbums,
            SearchMode::Album => Browse::AlbumTracks,
            SearchMode::Playlist => Browse::PlaylistTracks,
        };
        self.browse(target, &row).await
    }

    async fn browse(&mut self, target: Browse, row: &ResultRow) -> Result<(), SessionError> {
        tracing::debug!(target = ?target, id = %row.id, "Browsing");
        let rows = match target {
            Browse::ArtistAlbums => self.backend.artist_albums(&row.id).await?,
            Browse::AlbumTracks => self.backend.album_tracks(&row.id).await?,
            Browse::PlaylistTracks => self.backend.playlist_tracks(&row.id).await?,
        };
        tracing::info!(target = ?target, count = rows.len(), "Browse completed");

        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        session.mode = target.mode();
        session.query = row.primary_text.clone();
        session.replace_results(rows);
        surfaces::retitle(&mut self.host, session)?;
        surfaces::render_results(&mut self.host, session)?;
        Ok(())
    }

    pub fn move_cursor(&mut self, direction: Direction) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        let previous = session.result_cursor();
        let Some(current) = session.move_cursor(direction) else {
            return Ok(());
        };

        if let Some(id) = session.surface_of(SurfaceKind::Results) {
            surfaces::move_marker(&mut self.host, id, previous, current)?;
        }
        Ok(())
    }
}
