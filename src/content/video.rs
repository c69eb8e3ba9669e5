//! YouTube link helpers.
use url::Url;

/// Extract the video id from a `youtube.com/watch?v=`, `youtu.be/`,
/// `/embed/` or `/shorts/` link.
pub fn youtube_id(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = (if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match url.path_segments()?.collect::<Vec<_>>().as_slice() {
            ["watch"] => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            ["embed", id] | ["shorts", id] => Some((*id).to_string()),
            _ => None,
        }
    } else {
        None
    })?;

    let valid = !id.is_empty()
        && id.len() <= 32
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

/// Looping, muted embed URL for a YouTube link.
pub fn embed_url(video_url: &str) -> Option<String> {
    youtube_id(video_url).map(|id| {
        format!(
            "https://www.youtube.com/embed/{id}?autoplay=1&mute=1&loop=1&playlist={id}&controls=0&rel=0&modestbranding=1"
        )
    })
}

/// Canonical watch URL for a YouTube link; other links are returned trimmed.
pub fn watch_url(video_url: &str) -> Option<String> {
    let trimmed = video_url.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match youtube_id(trimmed) {
        Some(id) => format!("https://www.youtube.com/watch?v={id}"),
        None => trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_id_forms() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(youtube_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn test_non_youtube_links() {
        assert_eq!(youtube_id("https://vimeo.com/12345"), None);
        assert_eq!(youtube_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(youtube_id("https://www.youtube.com/watch"), None);
        assert_eq!(youtube_id("not a url"), None);
        assert_eq!(youtube_id("https://notyoutube.com/watch?v=abc"), None);
    }

    #[test]
    fn test_suspicious_ids_rejected() {
        assert_eq!(youtube_id("https://youtu.be/abc%20def"), None);
        assert_eq!(youtube_id("https://www.youtube.com/watch?v="), None);
    }

    #[test]
    fn test_embed_url() {
        let embed = embed_url("https://youtu.be/abc123").unwrap();
        assert!(embed.starts_with("https://www.youtube.com/embed/abc123?"));
        assert!(embed.contains("playlist=abc123"));
        assert!(embed_url("https://example.com/video").is_none());
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("https://www.youtube.com/embed/abc123").as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(
            watch_url(" https://example.com/clip ").as_deref(),
            Some("https://example.com/clip")
        );
        assert_eq!(watch_url("   "), None);
    }
}
