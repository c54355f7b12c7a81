use std::time::Duration;

use kodi_voice_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use kodi_voice_core::config::AppConfig;
use kodi_voice_core::domain::youtube::video_url;
use kodi_voice_core::{
    DedupPolicy, DialogAction, DialogEvent, DialogState, EntityResolver, GatewayError,
    MediaGateway, MediaKind, NavigationKey, Query, QueryCategory, Signal, TransitionOutcome,
    YoutubeLinks,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::SkillError;
use crate::intents::{classify, SkillIntent, SkillRequest};
use crate::responses::SkillResponse;
use crate::session::Session;

const NOTIFICATION_TITLE: &str = "Kodi";
const AUDIT_ACTOR: &str = "kodi-skill";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillSettings {
    pub cinemavision_addon_id: String,
    pub volume_ceiling: u8,
    pub repeat_pause: Duration,
    pub max_repeat: u32,
    pub notifications_enabled: bool,
    pub dedup: DedupPolicy,
}

impl Default for SkillSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SkillSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            cinemavision_addon_id: config.dialog.cinemavision_addon_id.clone(),
            volume_ceiling: config.dialog.volume_ceiling,
            repeat_pause: Duration::from_millis(config.navigation.repeat_pause_ms),
            max_repeat: config.navigation.max_repeat,
            notifications_enabled: config.notifications.enabled,
            dedup: config.resolver.dedup,
        }
    }
}

/// Handles one utterance at a time against a single session.
pub struct KodiSkill<G, S = TracingAuditSink> {
    gateway: G,
    resolver: EntityResolver,
    settings: SkillSettings,
    session: Session,
    audit_sink: S,
}

impl<G> KodiSkill<G, TracingAuditSink>
where
    G: MediaGateway,
{
    pub fn new(gateway: G, settings: SkillSettings) -> Self {
        Self::with_audit_sink(gateway, settings, TracingAuditSink)
    }
}

impl<G, S> KodiSkill<G, S>
where
    G: MediaGateway,
    S: AuditSink,
{
    pub fn with_audit_sink(gateway: G, settings: SkillSettings, audit_sink: S) -> Self {
        let session = Session::new(settings.notifications_enabled);
        let resolver = EntityResolver::new(settings.dedup);
        Self { gateway, resolver, settings, session, audit_sink }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn settings(&self) -> &SkillSettings {
        &self.settings
    }

    /// Never fails: every error becomes a spoken response.
    pub async fn handle(&mut self, request: SkillRequest) -> SkillResponse {
        let intent = classify(&request);
        let audit = AuditContext::new(
            Some(self.session.id.clone()),
            Some(intent.name().to_owned()),
            Uuid::new_v4().to_string(),
            AUDIT_ACTOR,
        );
        info!(
            event_name = "skill.intent_received",
            correlation_id = %audit.correlation_id,
            intent = intent.name(),
            recognized_as = %request.intent,
            dialog_state = ?self.session.state(),
            "handling intent"
        );

        let response = match self.dispatch(intent, &audit).await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "skill.intent_failed",
                    correlation_id = %audit.correlation_id,
                    error_class = error.error_class(),
                    error = %error,
                    "intent handling failed"
                );
                self.record_intent_failure(&audit, &error);
                error.response()
            }
        };

        if self.session.notifications_enabled {
            self.notify(&response, &audit).await;
        }
        response
    }

    async fn dispatch(
        &mut self,
        intent: SkillIntent,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        match intent {
            SkillIntent::PlayMovie { title } => {
                self.play_movie(title.ok_or(SkillError::MissingSlot("title"))?, audit).await
            }
            SkillIntent::PlayMusic { query } => {
                self.play_music(query.ok_or(SkillError::MissingSlot("title"))?, audit).await
            }
            SkillIntent::PlayYoutube { video_id, playlist_id } => {
                let video_id = video_id.ok_or(SkillError::MissingSlot("video_id"))?;
                self.play_youtube(video_id, playlist_id, audit).await
            }
            SkillIntent::FollowUp(signal) => self.follow_up(signal, audit).await,
            SkillIntent::Stop => {
                if self.session.state() == DialogState::Idle {
                    self.player_control(self.gateway.stop().await?, "stopped")
                } else {
                    self.follow_up(Signal::Stop, audit).await
                }
            }
            SkillIntent::Pause => self.player_control(self.gateway.pause().await?, "paused"),
            SkillIntent::Resume => self.player_control(self.gateway.resume().await?, "resumed"),
            SkillIntent::Subtitles { enabled } => {
                let dialog = if enabled { "subtitles.on" } else { "subtitles.off" };
                self.player_control(self.gateway.set_subtitles(enabled).await?, dialog)
            }
            SkillIntent::Seek(step) => {
                self.player_control(self.gateway.seek(step).await?, "seeked")
            }
            SkillIntent::SetVolume { level } => {
                let level = level.ok_or(SkillError::MissingSlot("volume"))?;
                self.set_volume(level).await
            }
            SkillIntent::Mute { muted } => {
                self.gateway.set_mute(muted).await?;
                Ok(SkillResponse::new(if muted { "muted" } else { "unmuted" }))
            }
            SkillIntent::Navigate { key, times } => self.navigate(key, times).await,
            SkillIntent::Notifications { enabled } => {
                self.session.notifications_enabled = enabled;
                let dialog = if enabled { "notifications.on" } else { "notifications.off" };
                Ok(SkillResponse::new(dialog))
            }
            SkillIntent::Unknown { intent } => Ok(SkillResponse::not_understood(&intent)),
        }
    }

    async fn play_movie(
        &mut self,
        title: String,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        let movies = self.gateway.get_movies().await?;
        let matches = self.resolver.resolve(&Query::label(title), &movies);
        let cinemavision_available = if matches.len() == 1 {
            self.gateway.cinemavision_available(&self.settings.cinemavision_addon_id).await?
        } else {
            false
        };

        let outcome = self.session.dialog.apply_with_audit(
            DialogEvent::Resolved { matches, cinemavision_available },
            &self.audit_sink,
            audit,
        )?;
        self.execute(outcome, audit).await
    }

    /// Artist and album hits queue the whole collection; title hits go through the dialog.
    async fn play_music(
        &mut self,
        query: Query,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        let cached = self
            .session
            .cached_songs()
            .map(|songs| self.resolver.resolve_detailed(&query, songs));
        let resolution = match cached {
            Some(resolution) if !resolution.matches.is_empty() => resolution,
            stale => {
                if stale.is_some() {
                    debug!(
                        event_name = "skill.music_cache_refreshed",
                        correlation_id = %audit.correlation_id,
                        query = %query.raw_text,
                        "no match in cached music library, fetching it again"
                    );
                }
                self.session.invalidate_music_cache();
                let songs = self.gateway.get_songs().await?;
                self.resolver.resolve_detailed(&query, self.session.cache_songs(songs))
            }
        };

        match resolution.category {
            QueryCategory::Artist | QueryCategory::Album if !resolution.matches.is_empty() => {
                if !self.session.dialog.pending().is_idle() {
                    debug!(
                        event_name = "dialog.context_replaced",
                        correlation_id = %audit.correlation_id,
                        previous_state = ?self.session.state(),
                        "music collection request replaced the pending dialog context"
                    );
                }
                self.session.dialog.reset();

                let ids = resolution.matches.ids();
                if let Err(error) = self.gateway.queue_and_play_songs(&ids).await {
                    self.record_playback_failure(audit, "playlist", &error);
                    return Err(error.into());
                }
                self.record_playback(audit, "playlist", &query.raw_text);
                Ok(SkillResponse::new("playing.collection")
                    .with("name", &query.raw_text)
                    .with("category", resolution.category.as_str())
                    .with("count", ids.len()))
            }
            _ => {
                let outcome = self.session.dialog.apply_with_audit(
                    DialogEvent::Resolved {
                        matches: resolution.matches,
                        cinemavision_available: false,
                    },
                    &self.audit_sink,
                    audit,
                )?;
                self.execute(outcome, audit).await
            }
        }
    }

    async fn play_youtube(
        &mut self,
        video_id: String,
        playlist_id: Option<String>,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        match playlist_id {
            Some(playlist_id) => {
                let links = YoutubeLinks::new(video_id, playlist_id);
                let outcome = self.session.dialog.apply_with_audit(
                    DialogEvent::PlaylistOffered { links },
                    &self.audit_sink,
                    audit,
                )?;
                self.execute(outcome, audit).await
            }
            None => {
                self.session.dialog.reset();
                let url = video_url(&video_id);
                if let Err(error) = self.gateway.play_url(&url).await {
                    self.record_playback_failure(audit, "url", &error);
                    return Err(error.into());
                }
                self.record_playback(audit, "url", &url);
                Ok(SkillResponse::playing("the video"))
            }
        }
    }

    async fn follow_up(
        &mut self,
        signal: Signal,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        let outcome = self.session.dialog.apply_with_audit(
            DialogEvent::Signal(signal),
            &self.audit_sink,
            audit,
        )?;
        self.execute(outcome, audit).await
    }

    /// Runs the actions of a transition. The dialog has already moved on, so a failed
    /// playback is logged and reported but never re-prompted.
    async fn execute(
        &mut self,
        outcome: TransitionOutcome,
        audit: &AuditContext,
    ) -> Result<SkillResponse, SkillError> {
        debug!(
            event_name = "skill.actions_executing",
            correlation_id = %audit.correlation_id,
            to = ?outcome.to,
            action_count = outcome.actions.len(),
            "executing dialog actions"
        );

        let mut response = SkillResponse::nothing_pending();
        for action in outcome.actions {
            response = match action {
                DialogAction::Speak(prompt) => SkillResponse::from_prompt(&prompt),
                DialogAction::PlayEntry { id, kind, label } => {
                    let target = match kind {
                        MediaKind::Movie => "movie",
                        MediaKind::Song => "song",
                    };
                    let played = match kind {
                        MediaKind::Movie => self.gateway.play_movie(id).await,
                        MediaKind::Song => self.gateway.play_song(id).await,
                    };
                    if let Err(error) = played {
                        self.record_playback_failure(audit, target, &error);
                        return Err(error.into());
                    }
                    self.record_playback(audit, target, &label);
                    SkillResponse::playing(&label)
                }
                DialogAction::PlayCinemavision { movie_id, label } => {
                    let played = self
                        .gateway
                        .play_cinemavision(&self.settings.cinemavision_addon_id, movie_id)
                        .await;
                    if let Err(error) = played {
                        self.record_playback_failure(audit, "cinemavision", &error);
                        return Err(error.into());
                    }
                    self.record_playback(audit, "cinemavision", &label);
                    SkillResponse::playing(&label)
                }
                DialogAction::PlayUrl { url } => {
                    if let Err(error) = self.gateway.play_url(&url).await {
                        self.record_playback_failure(audit, "url", &error);
                        return Err(error.into());
                    }
                    self.record_playback(audit, "url", &url);
                    SkillResponse::playing("the video")
                }
            };
        }
        Ok(response)
    }

    fn player_control(&self, had_player: bool, dialog: &str) -> Result<SkillResponse, SkillError> {
        if had_player {
            Ok(SkillResponse::new(dialog))
        } else {
            Ok(SkillResponse::nothing_playing())
        }
    }

    async fn set_volume(&mut self, level: i64) -> Result<SkillResponse, SkillError> {
        let ceiling = self.settings.volume_ceiling;
        let volume = u8::try_from(level)
            .ok()
            .filter(|volume| *volume <= ceiling)
            .ok_or(SkillError::VolumeOutOfRange { requested: level, ceiling })?;

        self.gateway.set_volume(volume).await?;
        Ok(SkillResponse::new("volume.set").with("level", volume))
    }

    /// Directional keys repeat up to `max_repeat` times with a fixed pause; others press once.
    async fn navigate(
        &mut self,
        key: NavigationKey,
        times: u32,
    ) -> Result<SkillResponse, SkillError> {
        let ceiling = self.settings.max_repeat.max(1);
        let presses = if key.is_directional() { times.clamp(1, ceiling) } else { 1 };
        if presses < times {
            debug!(
                event_name = "skill.navigation_capped",
                requested = times,
                presses,
                "navigation repeat count capped"
            );
        }

        for press in 0..presses {
            if press > 0 && !self.settings.repeat_pause.is_zero() {
                tokio::time::sleep(self.settings.repeat_pause).await;
            }
            self.gateway.navigate(key).await?;
        }
        Ok(SkillResponse::new("navigated").with("presses", presses))
    }

    async fn notify(&self, response: &SkillResponse, audit: &AuditContext) {
        let message = response.text();
        if let Err(error) = self.gateway.show_notification(NOTIFICATION_TITLE, &message).await {
            warn!(
                event_name = "skill.notification_failed",
                correlation_id = %audit.correlation_id,
                error = %error,
                "could not mirror response to the media center"
            );
        }
    }

    fn record_playback(&self, audit: &AuditContext, target: &str, label: &str) {
        self.audit_sink.emit(
            AuditEvent::new(
                audit,
                "playback.started",
                AuditCategory::Playback,
                AuditOutcome::Success,
            )
            .with_metadata("target", target)
            .with_metadata("label", label),
        );
    }

    fn record_intent_failure(&self, audit: &AuditContext, error: &SkillError) {
        let outcome = match error {
            SkillError::Gateway(_) => AuditOutcome::Failed,
            _ => AuditOutcome::Rejected,
        };
        self.audit_sink.emit(
            AuditEvent::new(audit, "intent.failed", AuditCategory::Intent, outcome)
                .with_metadata("error_class", error.error_class())
                .with_metadata("error", error.to_string()),
        );
    }

    fn record_playback_failure(
        &self,
        audit: &AuditContext,
        target: &str,
        error: &GatewayError,
    ) {
        warn!(
            event_name = "skill.playback_failed",
            correlation_id = %audit.correlation_id,
            target,
            error_class = error.error_class(),
            error = %error,
            "playback command failed"
        );
        self.audit_sink.emit(
            AuditEvent::new(
                audit,
                "playback.failed",
                AuditCategory::Gateway,
                AuditOutcome::Failed,
            )
            .with_metadata("target", target)
            .with_metadata("error", error.to_string()),
        );
    }
}
