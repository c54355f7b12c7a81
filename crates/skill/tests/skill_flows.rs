use std::time::Duration;

use kodi_voice_core::audit::InMemoryAuditSink;
use kodi_voice_core::{CatalogEntry, DialogState, GatewayError, ScriptedGateway};
use kodi_voice_skill::{KodiSkill, SkillRequest, SkillSettings};
use serde_json::json;

fn settings() -> SkillSettings {
    SkillSettings { repeat_pause: Duration::ZERO, ..SkillSettings::default() }
}

fn movies() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::movie(1, "Iron Man"),
        CatalogEntry::movie(2, "Iron Man 2"),
        CatalogEntry::movie(3, "Ironman Begins"),
        CatalogEntry::movie(4, "Alien"),
        CatalogEntry::movie(5, "Iron Man 3"),
    ]
}

fn song(id: i64, title: &str, artist: &str, album: &str) -> CatalogEntry {
    CatalogEntry::song(id, title, vec![artist.to_owned()], Some(album.to_owned()))
}

fn songs() -> Vec<CatalogEntry> {
    vec![
        song(10, "Bohemian Rhapsody", "Queen", "A Night at the Opera"),
        song(11, "Killer Queen", "Queen", "Sheer Heart Attack"),
        song(12, "Heroes", "David Bowie", "Heroes"),
        song(13, "Starman", "David Bowie", "Ziggy Stardust"),
    ]
}

fn play_movie(title: &str) -> SkillRequest {
    SkillRequest::new("PlayFilmIntent", format!("play the film {title}"))
        .slot("FilmKeyword", "film")
        .slot("title", title)
}

fn reply(intent: &str) -> SkillRequest {
    SkillRequest::new(intent, "")
}

fn skill(gateway: &ScriptedGateway) -> KodiSkill<ScriptedGateway, InMemoryAuditSink> {
    KodiSkill::with_audit_sink(gateway.clone(), settings(), InMemoryAuditSink::default())
}

#[tokio::test]
async fn iron_man_lists_two_results_then_walks_to_list_end() {
    let gateway = ScriptedGateway::new().with_movies(&movies()[..4]).with_cinemavision(false);
    let mut skill = skill(&gateway);

    let found = skill.handle(play_movie("iron man")).await;
    assert_eq!(found.dialog, "results.found");
    assert_eq!(found.data.get("count").map(String::as_str), Some("2"));
    assert!(found.expect_response);
    assert_eq!(skill.session().state(), DialogState::AwaitingListDecision);

    let first = skill.handle(reply("YesIntent")).await;
    assert_eq!(first.data.get("label").map(String::as_str), Some("Iron Man"));

    let second = skill.handle(reply("NextIntent")).await;
    assert_eq!(second.data.get("label").map(String::as_str), Some("Iron Man 2"));

    let end = skill.handle(reply("NextIntent")).await;
    assert_eq!(end.dialog, "list.end");
    assert_eq!(skill.session().state(), DialogState::Idle);
    assert!(gateway.calls_to("Player.Open").is_empty());
}

#[tokio::test]
async fn three_results_yes_then_three_nexts_ends_idle() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let mut skill = skill(&gateway);

    skill.handle(play_movie("iron man")).await;
    skill.handle(reply("YesIntent")).await;
    skill.handle(reply("NextIntent")).await;
    skill.handle(reply("NextIntent")).await;
    let end = skill.handle(reply("NextIntent")).await;

    assert_eq!(end.dialog, "list.end");
    assert_eq!(skill.session().state(), DialogState::Idle);
}

#[tokio::test]
async fn play_while_browsing_opens_the_current_movie() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let mut skill = skill(&gateway);

    skill.handle(play_movie("iron man")).await;
    skill.handle(reply("YesIntent")).await;
    skill.handle(reply("NextIntent")).await;
    let playing = skill.handle(reply("PlayIntent")).await;

    assert_eq!(playing.dialog, "playing");
    assert_eq!(playing.data.get("label").map(String::as_str), Some("Iron Man 2"));
    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({ "item": { "movieid": 2 } }))
    );
    assert_eq!(skill.session().state(), DialogState::Idle);
}

#[tokio::test]
async fn single_movie_without_cinemavision_plays_immediately() {
    let gateway = ScriptedGateway::new().with_movies(&movies()).with_cinemavision(false);
    let mut skill = skill(&gateway);

    let response = skill.handle(play_movie("alien")).await;

    assert_eq!(response.dialog, "playing");
    assert_eq!(skill.session().state(), DialogState::Idle);
    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({ "item": { "movieid": 4 } }))
    );
}

#[tokio::test]
async fn single_movie_with_cinemavision_asks_then_plays_normally_on_no() {
    let gateway = ScriptedGateway::new().with_movies(&movies()).with_cinemavision(true);
    let mut skill = skill(&gateway);

    let question = skill.handle(play_movie("alien")).await;
    assert_eq!(question.dialog, "cinemavision.ask");
    assert_eq!(skill.session().state(), DialogState::AwaitingCinemavisionDecision);
    assert!(gateway.calls_to("Player.Open").is_empty());

    let declined = skill.handle(reply("NoIntent")).await;
    assert_eq!(declined.dialog, "playing");
    assert_eq!(skill.session().state(), DialogState::Idle);
    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({ "item": { "movieid": 4 } }))
    );
    assert!(gateway.calls_to("Addons.ExecuteAddon").is_empty());
}

#[tokio::test]
async fn cinemavision_yes_runs_the_experience() {
    let gateway = ScriptedGateway::new().with_movies(&movies()).with_cinemavision(true);
    let mut skill = skill(&gateway);

    skill.handle(play_movie("alien")).await;
    skill.handle(reply("YesIntent")).await;

    assert_eq!(
        gateway.calls_to("Addons.ExecuteAddon")[0].params,
        Some(json!({ "addonid": "script.cinemavision", "params": ["experience", "movieid=4"] }))
    );
}

#[tokio::test]
async fn no_match_speaks_no_results() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let mut skill = skill(&gateway);

    let response = skill.handle(play_movie("predator")).await;

    assert_eq!(response.dialog, "results.none");
    assert_eq!(skill.session().state(), DialogState::Idle);
}

#[tokio::test]
async fn stale_follow_up_reports_nothing_pending() {
    let gateway = ScriptedGateway::new();
    let mut skill = skill(&gateway);

    let response = skill.handle(reply("NextIntent")).await;

    assert_eq!(response.dialog, "nothing.pending");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn unexpected_reply_repeats_question_and_keeps_pending_list() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let mut skill = skill(&gateway);
    skill.handle(play_movie("iron man")).await;

    let response = skill.handle(reply("PlayIntent")).await;

    assert_eq!(response.dialog, "pending.reminder");
    assert_eq!(response.data.get("question").map(String::as_str), Some("list"));
    assert!(response.expect_response);
    assert_eq!(skill.session().state(), DialogState::AwaitingListDecision);
}

#[tokio::test]
async fn volume_above_ceiling_is_rejected_without_gateway_call() {
    let gateway = ScriptedGateway::new();
    let mut skill = skill(&gateway);

    let rejected = skill.handle(reply("SetVolumeIntent").slot("volume", 150)).await;
    assert_eq!(rejected.dialog, "volume.out_of_range");
    assert!(gateway.calls().is_empty());

    let accepted = skill.handle(reply("SetVolumeIntent").slot("volume", 42)).await;
    assert_eq!(accepted.dialog, "volume.set");
    assert_eq!(
        gateway.calls_to("Application.SetVolume")[0].params,
        Some(json!({ "volume": 42 }))
    );
}

#[tokio::test]
async fn gateway_failure_becomes_unreachable_response() {
    let gateway = ScriptedGateway::new()
        .fail("VideoLibrary.GetMovies", GatewayError::Transport("connection refused".to_owned()));
    let mut skill = skill(&gateway);

    let response = skill.handle(play_movie("alien")).await;

    assert_eq!(response.dialog, "media_center.unreachable");
    assert_eq!(skill.session().state(), DialogState::Idle);
}

#[tokio::test]
async fn failed_playback_is_logged_and_not_reprompted() {
    let gateway = ScriptedGateway::new()
        .with_movies(&movies())
        .with_cinemavision(false)
        .fail("Player.Open", GatewayError::HttpStatus { status: 500 });
    let sink = InMemoryAuditSink::default();
    let mut skill = KodiSkill::with_audit_sink(gateway.clone(), settings(), sink.clone());

    let response = skill.handle(play_movie("alien")).await;

    assert_eq!(response.dialog, "media_center.unreachable");
    assert_eq!(skill.session().state(), DialogState::Idle);
    assert!(sink.event_types().contains(&"playback.failed".to_owned()));
    assert!(sink.event_types().contains(&"intent.failed".to_owned()));
}

#[tokio::test]
async fn transitions_are_audited_with_one_correlation_id_per_utterance() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let sink = InMemoryAuditSink::default();
    let mut skill = KodiSkill::with_audit_sink(gateway, settings(), sink.clone());

    skill.handle(play_movie("iron man")).await;
    skill.handle(reply("YesIntent")).await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "dialog.transition_applied");
    assert_ne!(events[0].correlation_id, events[1].correlation_id);
    assert_eq!(events[0].session_id, events[1].session_id);
}

#[tokio::test]
async fn stop_cancels_pending_question_before_touching_the_player() {
    let gateway = ScriptedGateway::new().with_movies(&movies()).with_active_player(Some(1));
    let mut skill = skill(&gateway);
    skill.handle(play_movie("iron man")).await;

    let cancelled = skill.handle(reply("StopIntent")).await;
    assert_eq!(cancelled.dialog, "cancelled");
    assert!(gateway.calls_to("Player.Stop").is_empty());

    let stopped = skill.handle(reply("StopIntent")).await;
    assert_eq!(stopped.dialog, "stopped");
    assert_eq!(gateway.calls_to("Player.Stop")[0].params, Some(json!({ "playerid": 1 })));
}

#[tokio::test]
async fn new_request_replaces_pending_context() {
    let gateway = ScriptedGateway::new().with_movies(&movies()).with_cinemavision(true);
    let mut skill = skill(&gateway);
    skill.handle(play_movie("alien")).await;
    assert_eq!(skill.session().state(), DialogState::AwaitingCinemavisionDecision);

    skill.handle(play_movie("iron man")).await;

    assert_eq!(skill.session().state(), DialogState::AwaitingListDecision);
}

#[tokio::test]
async fn artist_query_queues_every_song_by_the_first_artist() {
    let gateway = ScriptedGateway::new().with_songs(&songs());
    let mut skill = skill(&gateway);

    let response = skill
        .handle(SkillRequest::new("PlayMusicIntent", "play queen").slot("artist", "queen"))
        .await;

    assert_eq!(response.dialog, "playing.collection");
    assert_eq!(response.data.get("count").map(String::as_str), Some("2"));
    assert_eq!(response.text(), "Playing 2 songs by queen.");
    assert_eq!(gateway.methods(), vec![
        "AudioLibrary.GetSongs",
        "Playlist.Clear",
        "Playlist.Add",
        "Playlist.Add",
        "Player.Open"
    ]);
}

#[tokio::test]
async fn open_music_query_falls_back_to_album() {
    let gateway = ScriptedGateway::new().with_songs(&songs());
    let mut skill = skill(&gateway);

    let response = skill.handle(SkillRequest::new("PlayMusicIntent", "play ziggy stardust")).await;

    assert_eq!(response.dialog, "playing.collection");
    assert_eq!(response.data.get("category").map(String::as_str), Some("album"));
    assert_eq!(response.text(), "Playing 1 songs from ziggy stardust.");
    assert_eq!(
        gateway.calls_to("Playlist.Add")[0].params,
        Some(json!({ "playlistid": 0, "item": { "songid": 13 } }))
    );
}

#[tokio::test]
async fn song_title_match_plays_the_song() {
    let gateway = ScriptedGateway::new().with_songs(&songs());
    let mut skill = skill(&gateway);

    let response = skill
        .handle(
            SkillRequest::new("PlayMusicIntent", "play the song starman")
                .slot("SongKeyword", "song")
                .slot("title", "starman"),
        )
        .await;

    assert_eq!(response.dialog, "playing");
    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({ "item": { "songid": 13 } }))
    );
}

#[tokio::test]
async fn music_library_is_reused_until_a_query_misses() {
    let gateway = ScriptedGateway::new().with_songs(&songs());
    let mut skill = skill(&gateway);

    skill.handle(SkillRequest::new("PlayMusicIntent", "play heroes")).await;
    skill.handle(SkillRequest::new("PlayMusicIntent", "play starman")).await;
    assert_eq!(gateway.calls_to("AudioLibrary.GetSongs").len(), 1);

    gateway.respond_once(
        "AudioLibrary.GetSongs",
        Ok(json!({ "songs": [
            { "songid": 13, "label": "Starman", "artist": ["David Bowie"], "album": "Ziggy Stardust" },
            { "songid": 14, "label": "Space Oddity", "artist": ["David Bowie"], "album": "Space Oddity" }
        ] })),
    );
    let response = skill
        .handle(
            SkillRequest::new("PlayMusicIntent", "play the song space oddity")
                .slot("SongKeyword", "song")
                .slot("title", "space oddity"),
        )
        .await;

    assert_eq!(response.dialog, "playing");
    assert_eq!(gateway.calls_to("AudioLibrary.GetSongs").len(), 2);
    assert_eq!(skill.session().cached_songs().map(<[CatalogEntry]>::len), Some(2));
    assert_eq!(
        gateway.calls_to("Player.Open").last().map(|call| call.params.clone()),
        Some(Some(json!({ "item": { "songid": 14 } })))
    );
}

#[tokio::test]
async fn youtube_with_playlist_offers_choice() {
    let gateway = ScriptedGateway::new();
    let mut skill = skill(&gateway);

    let question = skill
        .handle(
            reply("PlayYoutubeIntent").slot("video_id", "abc123").slot("playlist_id", "PL987"),
        )
        .await;
    assert_eq!(question.dialog, "playlist.ask");

    skill.handle(reply("YesIntent")).await;
    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({
            "item": { "file": "plugin://plugin.video.youtube/play/?playlist_id=PL987&order=default&play=1" }
        }))
    );
}

#[tokio::test]
async fn youtube_video_only_plays_immediately() {
    let gateway = ScriptedGateway::new();
    let mut skill = skill(&gateway);

    skill.handle(reply("PlayYoutubeIntent").slot("video_id", "abc123")).await;

    assert_eq!(
        gateway.calls_to("Player.Open")[0].params,
        Some(json!({ "item": { "file": "plugin://plugin.video.youtube/play/?video_id=abc123" } }))
    );
    assert_eq!(skill.session().state(), DialogState::Idle);
}

#[tokio::test]
async fn pause_and_subtitles_target_active_player() {
    let gateway = ScriptedGateway::new().with_active_player(Some(1));
    let mut skill = skill(&gateway);

    let paused = skill
        .handle(
            SkillRequest::new("PauseIntent", "pause kodi")
                .slot("PauseKeyword", "pause")
                .slot("KodiKeyword", "kodi"),
        )
        .await;
    let subtitles = skill.handle(reply("SubtitlesOffIntent")).await;

    assert_eq!(paused.dialog, "paused");
    assert_eq!(subtitles.dialog, "subtitles.off");
    assert_eq!(
        gateway.calls_to("Player.SetSubtitle")[0].params,
        Some(json!({ "playerid": 1, "subtitle": "off" }))
    );
}

#[tokio::test]
async fn pause_with_nothing_playing_says_so() {
    let gateway = ScriptedGateway::new().with_active_player(None);
    let mut skill = skill(&gateway);

    let response = skill
        .handle(
            SkillRequest::new("PauseIntent", "pause the film")
                .slot("PauseKeyword", "pause")
                .slot("FilmKeyword", "film"),
        )
        .await;

    assert_eq!(response.dialog, "nothing.playing");
}

#[tokio::test]
async fn navigation_repeat_is_capped() {
    let gateway = ScriptedGateway::new();
    let mut skill = KodiSkill::with_audit_sink(
        gateway.clone(),
        SkillSettings { max_repeat: 3, ..settings() },
        InMemoryAuditSink::default(),
    );

    let response =
        skill.handle(reply("NavigateIntent").slot("direction", "down").slot("times", 7)).await;
    skill.handle(reply("NavigateIntent").slot("direction", "select").slot("times", 4)).await;

    assert_eq!(response.data.get("presses").map(String::as_str), Some("3"));
    assert_eq!(gateway.calls_to("Input.Down").len(), 3);
    assert_eq!(gateway.calls_to("Input.Select").len(), 1);
}

#[tokio::test]
async fn zero_repeat_limit_still_presses_once() {
    let gateway = ScriptedGateway::new();
    let mut skill = KodiSkill::with_audit_sink(
        gateway.clone(),
        SkillSettings { max_repeat: 0, ..settings() },
        InMemoryAuditSink::default(),
    );

    let response =
        skill.handle(reply("NavigateIntent").slot("direction", "down").slot("times", 3)).await;

    assert_eq!(response.dialog, "navigated");
    assert_eq!(response.data.get("presses").map(String::as_str), Some("1"));
    assert_eq!(gateway.calls_to("Input.Down").len(), 1);
}

#[tokio::test]
async fn rejected_requests_are_audited_as_intent_failures() {
    let gateway = ScriptedGateway::new();
    let sink = InMemoryAuditSink::default();
    let mut skill = KodiSkill::with_audit_sink(gateway, settings(), sink.clone());

    skill.handle(reply("SetVolumeIntent").slot("volume", 150)).await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "intent.failed");
    assert_eq!(events[0].metadata.get("error_class").map(String::as_str), Some("invalid_input"));
}

#[tokio::test]
async fn notifications_mirror_responses_once_enabled() {
    let gateway = ScriptedGateway::new().with_movies(&movies());
    let mut skill = skill(&gateway);

    skill.handle(play_movie("predator")).await;
    assert!(gateway.calls_to("GUI.ShowNotification").is_empty());

    skill.handle(reply("NotificationsOnIntent")).await;
    skill.handle(play_movie("predator")).await;

    let notifications = gateway.calls_to("GUI.ShowNotification");
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[1].params,
        Some(json!({ "title": "Kodi", "message": "I could not find anything matching that." }))
    );
}

#[tokio::test]
async fn missing_title_is_reported() {
    let gateway = ScriptedGateway::new();
    let mut skill = skill(&gateway);

    let response = skill.handle(SkillRequest::new("PlayFilmIntent", "play the film")).await;

    assert_eq!(response.dialog, "missing.slot");
    assert!(gateway.calls().is_empty());
}
