//! Cover images: data URLs and the on-disk cover cache.
//!
//! Facts carry their cover inline as a `data:image/png;base64,...` URL. To
//! let the user open a cover in the system image viewer it is written once
//! to `~/.cache/nightdeck/covers/<sha256>.png`.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PNG_DATA_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Cover is not an inline image")]
    NotDataUrl,
    #[error("Cover data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Failed to write cover: {0}")]
    Io(#[from] std::io::Error),
}

pub fn png_data_url(bytes: &[u8]) -> String {
    format!("{PNG_DATA_PREFIX}{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:image/...` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, CoverError> {
    let rest = url.strip_prefix("data:image/").ok_or(CoverError::NotDataUrl)?;
    let (_, payload) = rest.split_once(";base64,").ok_or(CoverError::NotDataUrl)?;
    Ok(STANDARD.decode(payload.trim())?)
}

#[derive(Debug, Clone)]
pub struct CoverCache {
    dir: PathBuf,
}

impl CoverCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$XDG_CACHE_HOME/nightdeck/covers`, falling back to `~/.cache`.
    pub fn default_dir() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))?;
        Some(base.join("nightdeck").join("covers"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the cover for `image_url` lives, whether or not it was written.
    pub fn path_for(&self, image_url: &str) -> PathBuf {
        let digest = Sha256::digest(image_url.as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.dir.join(format!("{name}.png"))
    }

    /// Path of an already written cover.
    pub fn cached(&self, image_url: &str) -> Option<PathBuf> {
        let path = self.path_for(image_url);
        path.is_file().then_some(path)
    }

    /// Write the cover to disk unless it is there already.
    pub async fn warm(&self, image_url: &str) -> Result<PathBuf, CoverError> {
        let path = self.path_for(image_url);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
        let bytes = decode_data_url(image_url)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so a reader never sees a partial file.
        let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Cover cached");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str) -> CoverCache {
        let dir = std::env::temp_dir().join(format!("nightdeck_covers_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        CoverCache::new(dir)
    }

    #[test]
    fn test_data_url_roundtrip() {
        let url = png_data_url(&[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_rejects_remote_urls() {
        assert!(matches!(
            decode_data_url("https://example.com/cover.png"),
            Err(CoverError::NotDataUrl)
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(CoverError::Decode(_))
        ));
    }

    #[test]
    fn test_path_is_stable_per_url() {
        let cache = CoverCache::new("/tmp/covers");
        let a = cache.path_for("data:image/png;base64,AAAA");
        assert_eq!(a, cache.path_for("data:image/png;base64,AAAA"));
        assert_ne!(a, cache.path_for("data:image/png;base64,BBBB"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[tokio::test]
    async fn test_warm_writes_once() {
        let cache = temp_cache("warm");
        let url = png_data_url(b"cover-bytes");
        assert!(cache.cached(&url).is_none());

        let path = cache.warm(&url).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"cover-bytes");
        assert_eq!(cache.cached(&url), Some(path.clone()));

        // Second warm is a no-op returning the same file.
        assert_eq!(cache.warm(&url).await.unwrap(), path);
        let _ = std::fs::remove_dir_all(cache.dir());
    }

    #[tokio::test]
    async fn test_warm_remote_url_fails() {
        let cache = temp_cache("remote");
        assert!(matches!(
            cache.warm("https://example.com/x.png").await,
            Err(CoverError::NotDataUrl)
        ));
    }
}
