use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Turns a remote image URL into something the static site can serve.
pub trait ImageDownloader {
    /// Returns the local path to use in place of `url`, or `None` if the
    /// image could not be stored.
    fn download(&self, url: &str) -> Option<String>;
}

/// Stores thumbnails on disk, one file per URL, named after its BLAKE3 digest.
pub struct ImageCache {
    dir: PathBuf,
    public_prefix: String,
    client: Option<Client>,
}

impl ImageCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Self {
        let client = match Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
        {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "failed to build image client; only cached images will be used");
                None
            }
        };

        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
            client,
        }
    }

    fn public_path(&self, file_name: &str) -> String {
        let prefix = self.public_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        }
    }

    fn fetch_to(&self, url: &str, path: &Path) -> anyhow::Result<()> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no HTTP client available"))?;

        let resp = client.get(url).send()?;
        if !resp.status().is_success() {
            anyhow::bail!("HTTP error {}", resp.status());
        }

        let is_image = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            anyhow::bail!("response is not an image");
        }

        let bytes = resp.bytes()?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, &bytes)?;
        Ok(())
    }
}

impl ImageDownloader for ImageCache {
    fn download(&self, url: &str) -> Option<String> {
        let file_name = cache_file_name(url);
        let path = self.dir.join(&file_name);

        if path.exists() {
            debug!(%url, path = %path.display(), "image already cached");
            return Some(self.public_path(&file_name));
        }

        match self.fetch_to(url, &path) {
            Ok(()) => Some(self.public_path(&file_name)),
            Err(err) => {
                warn!(%url, error = %err, "failed to cache image");
                None
            }
        }
    }
}

/// `<blake3 hex of url>.<extension of url path, or jpg>`
pub fn cache_file_name(url: &str) -> String {
    let digest = hex::encode(blake3::hash(url.as_bytes()).as_bytes());
    format!("{digest}.{}", image_extension(url))
}

fn image_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            let path = u.path().to_string();
            Path::new(&path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
        })
        .filter(|ext| {
            matches!(
                ext.as_str(),
                "jpg" | "jpeg" | "png" | "gif" | "webp" | "avif" | "svg"
            )
        })
        .unwrap_or_else(|| "jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_stable_and_keeps_extension() {
        let a = cache_file_name("https://img.test/a/photo.PNG?w=300");
        let b = cache_file_name("https://img.test/a/photo.PNG?w=300");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), 64 + ".png".len());
    }

    #[test]
    fn unknown_extension_defaults_to_jpg() {
        assert!(cache_file_name("https://i.ytimg.com/vi/abc/hqdefault").ends_with(".jpg"));
        assert!(cache_file_name("https://example.com/image.php?id=4").ends_with(".jpg"));
        assert!(cache_file_name("not a url").ends_with(".jpg"));
    }

    #[test]
    fn cached_file_is_reused_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://img.test/cached.webp";
        let file_name = cache_file_name(url);
        fs::write(dir.path().join(&file_name), b"fake").unwrap();

        let cache = ImageCache::new(dir.path(), "images/", "rssnap-test", Duration::from_secs(1));
        assert_eq!(cache.download(url), Some(format!("images/{file_name}")));
    }
}
