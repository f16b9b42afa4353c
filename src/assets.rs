//! Byte sources for logos, fonts and other referenced assets.
//!
//! Renderers never fail because an asset is missing: a fetch error is logged
//! by the caller and the asset is left out.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
#[cfg(feature = "http")]
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};

/// Reference prefix of logos served from the logo directory.
pub const LOGO_PREFIX: &str = "/sigle/";

/// File extensions listed as logos.
pub const LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg"];

/// Resolves an asset reference (path or URL) to its bytes.
pub trait AssetSource: Send + Sync {
    /// Fetch the bytes behind a reference.
    fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}

impl<T: AssetSource + ?Sized> AssetSource for Box<T> {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        (**self).fetch(reference)
    }
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Assets read from a directory. `/fonts/x.ttf` maps to `<root>/fonts/x.ttf`.
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        if is_url(reference) {
            return Err(Error::asset(reference, "not a local path"));
        }
        let relative = Path::new(reference.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::asset(reference, "path escapes the asset directory"));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for FsAssets {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        debug!("Reading asset {}", path.display());
        fs::read(&path).map_err(|e| Error::asset(reference, e))
    }
}

/// Assets fetched over HTTP(S), relative references resolved against a base URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpAssets {
    base: Option<url::Url>,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpAssets {
    /// Create a source with an optional base URL and a per-request timeout.
    pub fn new(base: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = base
            .map(|b| url::Url::parse(b).map_err(|e| Error::asset(b, e)))
            .transpose()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bicp-render/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("HTTP client: {}", e)))?;
        Ok(Self { base, client })
    }

    /// Absolute URL of a reference.
    pub fn resolve(&self, reference: &str) -> Result<url::Url> {
        if is_url(reference) {
            return url::Url::parse(reference).map_err(|e| Error::asset(reference, e));
        }
        match &self.base {
            Some(base) => base.join(reference).map_err(|e| Error::asset(reference, e)),
            None => Err(Error::asset(reference, "relative reference without a base URL")),
        }
    }
}

#[cfg(feature = "http")]
impl AssetSource for HttpAssets {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let url = self.resolve(reference)?;
        debug!("Fetching asset {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::asset(reference, e))?;
        let bytes = response.bytes().map_err(|e| Error::asset(reference, e))?;
        Ok(bytes.to_vec())
    }
}

/// Tries each source in order; the first success wins.
#[derive(Default)]
pub struct AssetChain {
    sources: Vec<Box<dyn AssetSource>>,
}

impl AssetChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    pub fn with(mut self, source: impl AssetSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Check if the chain has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl AssetSource for AssetChain {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let mut last_err = None;
        for source in &self.sources {
            match source.fetch(reference) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::asset(reference, "no asset source configured")))
    }
}

/// In-memory assets keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(reference.into(), bytes);
    }

    /// Add an asset, builder style.
    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        self.entries
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::asset(reference, "not found"))
    }
}

/// A source with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        Err(Error::asset(reference, "no asset source configured"))
    }
}

/// List the logos of a directory as `/sigle/<file>` references, sorted.
pub fn list_logos<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let mut logos = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let is_logo = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| LOGO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_logo {
            logos.push(format!("{}{}", LOGO_PREFIX, name));
        }
    }
    logos.sort();
    Ok(logos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_assets_resolve() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("fonts")).unwrap();
        fs::write(dir.path().join("fonts").join("a.ttf"), b"font").unwrap();

        let assets = FsAssets::new(dir.path());
        assert_eq!(assets.fetch("/fonts/a.ttf").unwrap(), b"font");
        assert_eq!(assets.fetch("fonts/a.ttf").unwrap(), b"font");
        assert!(assets.fetch("/fonts/missing.ttf").is_err());
        assert!(assets.fetch("/../secret").is_err());
        assert!(assets.fetch("https://example.org/a.png").is_err());
    }

    #[test]
    fn test_chain_first_success_wins() {
        let chain = AssetChain::new()
            .with(NoAssets)
            .with(MemoryAssets::new().with("/sigle/a.png", vec![1, 2, 3]));
        assert_eq!(chain.fetch("/sigle/a.png").unwrap(), vec![1, 2, 3]);

        let err = chain.fetch("/sigle/b.png").unwrap_err();
        assert!(matches!(err, Error::Asset { .. }));
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain = AssetChain::new();
        assert!(chain.is_empty());
        assert!(chain.fetch("x").is_err());
    }

    #[test]
    fn test_list_logos() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.svg", "c.jpeg", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let logos = list_logos(dir.path()).unwrap();
        assert_eq!(logos, vec!["/sigle/a.svg", "/sigle/b.PNG", "/sigle/c.jpeg"]);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_resolve() {
        let assets = HttpAssets::new(Some("https://portal.example.ro/"), Duration::from_secs(1)).unwrap();
        assert_eq!(
            assets.resolve("/fonts/NotoSerif-Regular.ttf").unwrap().as_str(),
            "https://portal.example.ro/fonts/NotoSerif-Regular.ttf"
        );
        assert_eq!(
            assets.resolve("https://cdn.example.ro/logo.png").unwrap().as_str(),
            "https://cdn.example.ro/logo.png"
        );

        let no_base = HttpAssets::new(None, Duration::from_secs(1)).unwrap();
        assert!(no_base.resolve("/fonts/x.ttf").is_err());
    }
}
