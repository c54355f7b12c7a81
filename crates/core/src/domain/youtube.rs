use serde::{Deserialize, Serialize};

const YOUTUBE_PLUGIN_ROOT: &str = "plugin://plugin.video.youtube/play/";

/// A video id and the playlist it was found in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoutubeLinks {
    pub video_id: String,
    pub playlist_id: String,
}

impl YoutubeLinks {
    pub fn new(video_id: impl Into<String>, playlist_id: impl Into<String>) -> Self {
        Self { video_id: video_id.into(), playlist_id: playlist_id.into() }
    }

    pub fn single_url(&self) -> String {
        video_url(&self.video_id)
    }

    pub fn playlist_url(&self) -> String {
        format!("{YOUTUBE_PLUGIN_ROOT}?playlist_id={}&order=default&play=1", self.playlist_id)
    }
}

pub fn video_url(video_id: &str) -> String {
    format!("{YOUTUBE_PLUGIN_ROOT}?video_id={video_id}")
}

#[cfg(test)]
mod tests {
    use super::YoutubeLinks;

    #[test]
    fn builds_plugin_urls_for_both_choices() {
        let links = YoutubeLinks::new("dQw4w9WgXcQ", "PL123");

        assert_eq!(links.single_url(), "plugin://plugin.video.youtube/play/?video_id=dQw4w9WgXcQ");
        assert_eq!(
            links.playlist_url(),
            "plugin://plugin.video.youtube/play/?playlist_id=PL123&order=default&play=1"
        );
    }
}
