use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::catalog::CatalogEntry;
use crate::errors::GatewayError;

/// Kodi's audio playlist.
pub const AUDIO_PLAYLIST_ID: i64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekStep {
    SmallForward,
    SmallBackward,
    BigForward,
    BigBackward,
}

impl SeekStep {
    pub fn as_rpc_value(&self) -> &'static str {
        match self {
            Self::SmallForward => "smallforward",
            Self::SmallBackward => "smallbackward",
            Self::BigForward => "bigforward",
            Self::BigBackward => "bigbackward",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKey {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    Home,
    Info,
    ContextMenu,
}

impl NavigationKey {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Up => "Input.Up",
            Self::Down => "Input.Down",
            Self::Left => "Input.Left",
            Self::Right => "Input.Right",
            Self::Select => "Input.Select",
            Self::Back => "Input.Back",
            Self::Home => "Input.Home",
            Self::Info => "Input.Info",
            Self::ContextMenu => "Input.ContextMenu",
        }
    }

    /// Directional keys may be repeated; the rest are pressed once.
    pub fn is_directional(&self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

/// The seam between the skill and the media center.
///
/// Implementors supply `call`; every operation is expressed in terms of it.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, GatewayError>;

    async fn get_movies(&self) -> Result<Vec<CatalogEntry>, GatewayError> {
        let result = self.call("VideoLibrary.GetMovies", None).await?;
        parse_movies(&result)
    }

    async fn get_songs(&self) -> Result<Vec<CatalogEntry>, GatewayError> {
        let result = self
            .call("AudioLibrary.GetSongs", Some(json!({ "properties": ["artist", "album"] })))
            .await?;
        parse_songs(&result)
    }

    async fn play_movie(&self, movie_id: i64) -> Result<(), GatewayError> {
        self.call("Player.Open", Some(json!({ "item": { "movieid": movie_id } }))).await?;
        Ok(())
    }

    async fn play_song(&self, song_id: i64) -> Result<(), GatewayError> {
        self.call("Player.Open", Some(json!({ "item": { "songid": song_id } }))).await?;
        Ok(())
    }

    /// Replaces the audio playlist with `song_ids` and starts it.
    async fn queue_and_play_songs(&self, song_ids: &[i64]) -> Result<(), GatewayError> {
        self.call("Playlist.Clear", Some(json!({ "playlistid": AUDIO_PLAYLIST_ID }))).await?;
        for song_id in song_ids {
            self.call(
                "Playlist.Add",
                Some(json!({ "playlistid": AUDIO_PLAYLIST_ID, "item": { "songid": song_id } })),
            )
            .await?;
        }
        self.call("Player.Open", Some(json!({ "item": { "playlistid": AUDIO_PLAYLIST_ID } })))
            .await?;
        Ok(())
    }

    async fn play_url(&self, url: &str) -> Result<(), GatewayError> {
        self.call("Player.Open", Some(json!({ "item": { "file": url } }))).await?;
        Ok(())
    }

    /// A missing add-on is reported by Kodi as an RPC error and maps to `false`.
    async fn cinemavision_available(&self, addon_id: &str) -> Result<bool, GatewayError> {
        let result = self
            .call(
                "Addons.GetAddonDetails",
                Some(json!({ "addonid": addon_id, "properties": ["enabled"] })),
            )
            .await;
        match result {
            Ok(value) => Ok(value
                .pointer("/addon/enabled")
                .and_then(Value::as_bool)
                .unwrap_or(false)),
            Err(error) if error.is_rejection() => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn play_cinemavision(&self, addon_id: &str, movie_id: i64) -> Result<(), GatewayError> {
        self.call(
            "Addons.ExecuteAddon",
            Some(json!({
                "addonid": addon_id,
                "params": ["experience", format!("movieid={movie_id}")],
            })),
        )
        .await?;
        Ok(())
    }

    async fn active_player_id(&self) -> Result<Option<i64>, GatewayError> {
        let result = self.call("Player.GetActivePlayers", None).await?;
        let players = result.as_array().ok_or_else(|| {
            GatewayError::Decode("Player.GetActivePlayers result is not an array".to_owned())
        })?;
        Ok(players.iter().find_map(|player| player.get("playerid").and_then(Value::as_i64)))
    }

    /// Returns `false` when nothing is playing.
    async fn pause(&self) -> Result<bool, GatewayError> {
        self.set_playing(false).await
    }

    async fn resume(&self) -> Result<bool, GatewayError> {
        self.set_playing(true).await
    }

    async fn set_playing(&self, play: bool) -> Result<bool, GatewayError> {
        let Some(player_id) = self.active_player_id().await? else {
            return Ok(false);
        };
        self.call("Player.PlayPause", Some(json!({ "playerid": player_id, "play": play })))
            .await?;
        Ok(true)
    }

    async fn stop(&self) -> Result<bool, GatewayError> {
        let Some(player_id) = self.active_player_id().await? else {
            return Ok(false);
        };
        self.call("Player.Stop", Some(json!({ "playerid": player_id }))).await?;
        Ok(true)
    }

    async fn seek(&self, step: SeekStep) -> Result<bool, GatewayError> {
        let Some(player_id) = self.active_player_id().await? else {
            return Ok(false);
        };
        self.call(
            "Player.Seek",
            Some(json!({ "playerid": player_id, "value": { "step": step.as_rpc_value() } })),
        )
        .await?;
        Ok(true)
    }

    async fn set_subtitles(&self, enabled: bool) -> Result<bool, GatewayError> {
        let Some(player_id) = self.active_player_id().await? else {
            return Ok(false);
        };
        let subtitle = if enabled { "on" } else { "off" };
        self.call(
            "Player.SetSubtitle",
            Some(json!({ "playerid": player_id, "subtitle": subtitle })),
        )
        .await?;
        Ok(true)
    }

    async fn set_volume(&self, volume: u8) -> Result<(), GatewayError> {
        self.call("Application.SetVolume", Some(json!({ "volume": volume }))).await?;
        Ok(())
    }

    async fn set_mute(&self, mute: bool) -> Result<(), GatewayError> {
        self.call("Application.SetMute", Some(json!({ "mute": mute }))).await?;
        Ok(())
    }

    async fn show_notification(&self, title: &str, message: &str) -> Result<(), GatewayError> {
        self.call("GUI.ShowNotification", Some(json!({ "title": title, "message": message })))
            .await?;
        Ok(())
    }

    async fn navigate(&self, key: NavigationKey) -> Result<(), GatewayError> {
        self.call(key.method(), None).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let result = self.call("JSONRPC.Ping", None).await?;
        match result.as_str() {
            Some("pong") => Ok(()),
            _ => Err(GatewayError::Decode(format!("unexpected ping reply: {result}"))),
        }
    }
}

pub fn parse_movies(result: &Value) -> Result<Vec<CatalogEntry>, GatewayError> {
    Ok(library_items(result, "movies")?
        .iter()
        .filter_map(|item| {
            let id = item.get("movieid").and_then(Value::as_i64);
            let label = item.get("label").and_then(Value::as_str);
            match (id, label) {
                (Some(id), Some(label)) => Some(CatalogEntry::movie(id, label)),
                _ => {
                    debug!(
                        event_name = "gateway.catalog_entry_skipped",
                        kind = "movie",
                        "malformed movie entry"
                    );
                    None
                }
            }
        })
        .collect())
}

pub fn parse_songs(result: &Value) -> Result<Vec<CatalogEntry>, GatewayError> {
    Ok(library_items(result, "songs")?
        .iter()
        .filter_map(|item| {
            let id = item.get("songid").and_then(Value::as_i64);
            let label = item.get("label").and_then(Value::as_str);
            let (Some(id), Some(label)) = (id, label) else {
                debug!(
                    event_name = "gateway.catalog_entry_skipped",
                    kind = "song",
                    "malformed song entry"
                );
                return None;
            };
            let artist = item
                .get("artist")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).map(str::to_owned).collect())
                .unwrap_or_default();
            let album = item
                .get("album")
                .and_then(Value::as_str)
                .filter(|album| !album.is_empty())
                .map(str::to_owned);
            Some(CatalogEntry::song(id, label, artist, album))
        })
        .collect())
}

/// An empty library omits the list key entirely.
fn library_items<'a>(result: &'a Value, key: &str) -> Result<&'a [Value], GatewayError> {
    let object = result
        .as_object()
        .ok_or_else(|| {
            GatewayError::Decode(format!("library result for `{key}` is not an object"))
        })?;
    match object.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(GatewayError::Decode(format!("library field `{key}` is not an array"))),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Default)]
struct Script {
    sticky: BTreeMap<String, Result<Value, GatewayError>>,
    queued: BTreeMap<String, VecDeque<Result<Value, GatewayError>>>,
    calls: Vec<RecordedCall>,
}

/// In-memory gateway for tests and dry runs: replies from a script and records every call.
///
/// Unscripted methods answer `"OK"`, which is what Kodi returns for control calls.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(self, movies: &[CatalogEntry]) -> Self {
        let items: Vec<Value> = movies
            .iter()
            .map(|movie| json!({ "movieid": movie.id, "label": movie.label }))
            .collect();
        self.respond("VideoLibrary.GetMovies", json!({ "movies": items }))
    }

    pub fn with_songs(self, songs: &[CatalogEntry]) -> Self {
        let items: Vec<Value> = songs
            .iter()
            .map(|song| {
                json!({
                    "songid": song.id,
                    "label": song.label,
                    "artist": song.extra.artist,
                    "album": song.extra.album.clone().unwrap_or_default(),
                })
            })
            .collect();
        self.respond("AudioLibrary.GetSongs", json!({ "songs": items }))
    }

    pub fn with_cinemavision(self, installed: bool) -> Self {
        if installed {
            self.respond(
                "Addons.GetAddonDetails",
                json!({ "addon": { "addonid": "script.cinemavision", "enabled": true } }),
            )
        } else {
            self.fail(
                "Addons.GetAddonDetails",
                GatewayError::Rpc {
                    method: "Addons.GetAddonDetails".to_owned(),
                    code: -32602,
                    message: "Invalid params.".to_owned(),
                },
            )
        }
    }

    pub fn with_active_player(self, player_id: Option<i64>) -> Self {
        let players = match player_id {
            Some(id) => json!([{ "playerid": id, "type": "video" }]),
            None => json!([]),
        };
        self.respond("Player.GetActivePlayers", players)
    }

    pub fn respond(self, method: &str, value: Value) -> Self {
        self.with_script(|script| {
            script.sticky.insert(method.to_owned(), Ok(value));
        });
        self
    }

    pub fn fail(self, method: &str, error: GatewayError) -> Self {
        self.with_script(|script| {
            script.sticky.insert(method.to_owned(), Err(error));
        });
        self
    }

    /// Queues a one-shot reply that takes precedence over the sticky one.
    pub fn respond_once(&self, method: &str, reply: Result<Value, GatewayError>) {
        self.with_script(|script| {
            script.queued.entry(method.to_owned()).or_default().push_back(reply);
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.with_script(|script| script.calls.clone())
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.method == method).collect()
    }

    fn with_script<T>(&self, apply: impl FnOnce(&mut Script) -> T) -> T {
        match self.script.lock() {
            Ok(mut script) => apply(&mut script),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl MediaGateway for ScriptedGateway {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, GatewayError> {
        self.with_script(|script| {
            script.calls.push(RecordedCall { method: method.to_owned(), params });
            if let Some(reply) = script.queued.get_mut(method).and_then(VecDeque::pop_front) {
                return reply;
            }
            match script.sticky.get(method) {
                Some(reply) => reply.clone(),
                None => Ok(Value::String("OK".to_owned())),
            }
        })
    }
}
