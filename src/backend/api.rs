//! Spotify Web API backend
//!
//! Wraps an already-authorized rspotify client. Token refreshing is disabled
//! on the client, so an expired token surfaces as `Unauthorized`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use rspotify::{
    AuthCodeSpotify, ClientError,
    model::{
        AlbumId, ArtistId, EpisodeId, PlayContextId, PlayableId, PlayableItem, PlaylistId,
        SearchResult, SearchType, ShowId, SimplifiedArtist, TrackId,
    },
    prelude::*,
};

use super::{BackendError, MusicBackend, SEARCH_LIMIT, classify_message, with_timeout};
use crate::model::{Device, NowPlaying, ResultRow, SearchMode};
use crate::view::format::join_artists;

const BACKEND: &str = "api";

pub struct ApiBackend {
    client: AuthCodeSpotify,
    timeout: Duration,
}

/// What a `spotify:<kind>:<id>` URI resolves to when played
#[derive(Debug)]
enum PlayTarget<'a> {
    Item(PlayableId<'a>),
    Context(PlayContextId<'a>),
}

impl<'a> PlayTarget<'a> {
    fn parse(uri: &'a str) -> Option<Self> {
        let mut parts = uri.split(':');
        let (Some("spotify"), Some(kind), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        match kind {
            "track" => TrackId::from_id(id).ok().map(|id| Self::Item(PlayableId::Track(id))),
            "episode" => EpisodeId::from_id(id)
                .ok()
                .map(|id| Self::Item(PlayableId::Episode(id))),
            "album" => AlbumId::from_id(id)
                .ok()
                .map(|id| Self::Context(PlayContextId::Album(id))),
            "artist" => ArtistId::from_id(id)
                .ok()
                .map(|id| Self::Context(PlayContextId::Artist(id))),
            "playlist" => PlaylistId::from_id(id)
                .ok()
                .map(|id| Self::Context(PlayContextId::Playlist(id))),
            "show" => ShowId::from_id(id)
                .ok()
                .map(|id| Self::Context(PlayContextId::Show(id))),
            _ => None,
        }
    }
}

fn map_client_error(error: ClientError) -> BackendError {
    let message = error.to_string();
    if message.contains("json parse") {
        BackendError::MalformedResponse(message)
    } else {
        classify_message(&message)
    }
}

fn artist_names(artists: &[SimplifiedArtist]) -> Vec<String> {
    artists.iter().map(|a| a.name.clone()).collect()
}

fn track_row(name: String, artists: &[SimplifiedArtist], id: Option<&TrackId<'_>>) -> ResultRow {
    let track_id = id.map(|id| id.id().to_string()).unwrap_or_default();
    ResultRow {
        primary_text: name,
        secondary_text: join_artists(&artist_names(artists)),
        uri: format!("spotify:track:{}", track_id),
        id: track_id,
    }
}

fn rows_from_search(result: SearchResult) -> Vec<ResultRow> {
    match result {
        SearchResult::Tracks(page) => page
            .items
            .into_iter()
            .map(|track| track_row(track.name, &track.artists, track.id.as_ref()))
            .collect(),
        SearchResult::Artists(page) => page
            .items
            .into_iter()
            .map(|artist| {
                let id = artist.id.id().to_string();
                ResultRow {
                    primary_text: artist.name,
                    secondary_text: String::new(),
                    uri: format!("spotify:artist:{}", id),
                    id,
                }
            })
            .collect(),
        SearchResult::Albums(page) => page
            .items
            .into_iter()
            .map(|album| {
                let id = album.id.as_ref().map(|id| id.id().to_string()).unwrap_or_default();
                ResultRow {
                    primary_text: album.name,
                    secondary_text: join_artists(&artist_names(&album.artists)),
                    uri: format!("spotify:album:{}", id),
                    id,
                }
            })
            .collect(),
        SearchResult::Playlists(page) => page
            .items
            .into_iter()
            .map(|playlist| {
                let id = playlist.id.id().to_string();
                ResultRow {
                    primary_text: playlist.name,
                    secondary_text: playlist
                        .owner
                        .display_name
                        .unwrap_or_else(|| playlist.owner.id.id().to_string()),
                    uri: format!("spotify:playlist:{}", id),
                    id,
                }
            })
            .collect(),
        SearchResult::Shows(page) => page
            .items
            .into_iter()
            .map(|show| {
                let id = show.id.id().to_string();
                ResultRow {
                    primary_text: show.name,
                    secondary_text: show.publisher,
                    uri: format!("spotify:show:{}", id),
                    id,
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn now_playing_from(item: PlayableItem) -> Option<NowPlaying> {
    match item {
        PlayableItem::Track(track) => Some(NowPlaying {
            title: track.name,
            artist_names: artist_names(&track.artists),
        }),
        PlayableItem::Episode(episode) => Some(NowPlaying {
            title: episode.name,
            artist_names: vec![episode.show.name],
        }),
        _ => None,
    }
}

fn search_type(mode: SearchMode) -> SearchType {
    match mode {
        SearchMode::Track => SearchType::Track,
        SearchMode::Artist => SearchType::Artist,
        SearchMode::Album => SearchType::Album,
        SearchMode::Playlist => SearchType::Playlist,
        SearchMode::Show => SearchType::Show,
    }
}

impl ApiBackend {
    pub fn new(client: AuthCodeSpotify, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl MusicBackend for ApiBackend {
    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ResultRow>, BackendError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        crate::log_backend_request!(BACKEND, "search", mode = %mode, query, limit);

        let result = with_timeout(self.timeout, "search", async {
            self.client
                .search(query, search_type(mode), None, None, Some(limit), None)
                .await
                .map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "search", result);

        Ok(rows_from_search(result?))
    }

    async fn play(&self, uri: &str, device_id: Option<String>) -> Result<(), BackendError> {
        let target = PlayTarget::parse(uri)
            .ok_or_else(|| BackendError::NotFound(format!("not a playable uri: {uri}")))?;
        crate::log_backend_request!(BACKEND, "play", uri, device_id = ?device_id);

        let device = device_id.as_deref();
        let result = with_timeout(self.timeout, "play", async {
            let started = match target {
                PlayTarget::Item(item) => {
                    self.client
                        .start_uris_playback([item], device, None, None)
                        .await
                }
                PlayTarget::Context(context) => {
                    self.client
                        .start_context_playback(context, device, None, None)
                        .await
                }
            };
            started.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "play", result);
        result
    }

    async fn skip(&self) -> Result<(), BackendError> {
        let result = with_timeout(self.timeout, "skip", async {
            self.client.next_track(None).await.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "skip", result);
        result
    }

    async fn toggle_pause(&self) -> Result<(), BackendError> {
        let result = with_timeout(self.timeout, "toggle_pause", async {
            let playback = self
                .client
                .current_playback(None, None::<Vec<_>>)
                .await
                .map_err(map_client_error)?;

            let toggled = match playback {
                Some(context) if context.is_playing => self.client.pause_playback(None).await,
                _ => self.client.resume_playback(None, None).await,
            };
            toggled.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "toggle_pause", result);
        result
    }

    async fn previous(&self) -> Result<(), BackendError> {
        let result = with_timeout(self.timeout, "previous", async {
            self.client.previous_track(None).await.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "previous", result);
        result
    }

    async fn like(&self) -> Result<(), BackendError> {
        let result = with_timeout(self.timeout, "like", async {
            let playback = self
                .client
                .current_playback(None, None::<Vec<_>>)
                .await
                .map_err(map_client_error)?;

            let track_id = match playback.and_then(|p| p.item) {
                Some(PlayableItem::Track(track)) => track.id,
                _ => None,
            };
            let track_id =
                track_id.ok_or_else(|| BackendError::NotFound("no track is playing".to_string()))?;

            self.client
                .current_user_saved_tracks_add([track_id])
                .await
                .map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "like", result);
        result
    }

    async fn list_devices(&self) -> Result<Vec<Device>, BackendError> {
        let result = with_timeout(self.timeout, "list_devices", async {
            self.client.device().await.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "list_devices", result);

        Ok(result?
            .into_iter()
            .map(|d| Device {
                id: d.id.unwrap_or_default(),
                name: d.name,
                is_active: d.is_active,
            })
            .collect())
    }

    async fn currently_playing(&self) -> Result<Option<NowPlaying>, BackendError> {
        let result = with_timeout(self.timeout, "currently_playing", async {
            self.client
                .current_playback(None, None::<Vec<_>>)
                .await
                .map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "currently_playing", result);

        Ok(result?
            .filter(|playback| playback.is_playing)
            .and_then(|playback| playback.item)
            .and_then(now_playing_from))
    }

    async fn artist_albums(&self, artist_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        let id = ArtistId::from_id(artist_id)
            .map_err(|_| BackendError::NotFound(format!("invalid artist id: {artist_id}")))?;

        let result = with_timeout(self.timeout, "artist_albums", async {
            self.client
                .artist_albums(id, None, None)
                .take(SEARCH_LIMIT as usize)
                .try_collect::<Vec<_>>()
                .await
                .map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "artist_albums", result);

        Ok(result?
            .into_iter()
            .map(|album| {
                let id = album.id.as_ref().map(|i| i.id().to_string()).unwrap_or_default();
                ResultRow {
                    primary_text: album.name,
                    secondary_text: album
                        .release_date
                        .unwrap_or_default()
                        .chars()
                        .take(4)
                        .collect(),
                    uri: format!("spotify:album:{}", id),
                    id,
                }
            })
            .collect())
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        let id = AlbumId::from_id(album_id)
            .map_err(|_| BackendError::NotFound(format!("invalid album id: {album_id}")))?;

        let result = with_timeout(self.timeout, "album_tracks", async {
            self.client.album(id, None).await.map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "album_tracks", result);

        Ok(result?
            .tracks
            .items
            .into_iter()
            .map(|track| track_row(track.name, &track.artists, track.id.as_ref()))
            .collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<ResultRow>, BackendError> {
        let id = PlaylistId::from_id(playlist_id)
            .map_err(|_| BackendError::NotFound(format!("invalid playlist id: {playlist_id}")))?;

        let result = with_timeout(self.timeout, "playlist_tracks", async {
            self.client
                .playlist_items(id, None, None)
                .take(SEARCH_LIMIT as usize)
                .try_collect::<Vec<_>>()
                .await
                .map_err(map_client_error)
        })
        .await;
        crate::log_backend_result!(BACKEND, "playlist_tracks", result);

        Ok(result?
            .into_iter()
            .filter_map(|item| match item.track {
                Some(PlayableItem::Track(track)) => {
                    Some(track_row(track.name, &track.artists, track.id.as_ref()))
                }
                _ => None,
            })
            .collect())
    }
}
