//! Locating and fetching documents.
//!
//! A location is a file path, `-` for standard input, an `http(s)://` URL,
//! or an `ipfs:/` / `fs:/` gateway path. HTML pages (fetched with a
//! `text/html` content type, or local files ending in `.html`) are not
//! documents themselves: the loader follows their
//! `<link rel="alternate" type="application/asciicast+json" href="...">`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::Asciicast;
use crate::error::{CastError, Result};

/// Gateway that `ipfs:/` and `fs:/` locations are rewritten to.
pub const IPFS_GATEWAY: &str = "https://ipfs.io";

/// Media type of the alternate link that points at the document.
pub const ASCIICAST_MEDIA_TYPE: &str = "application/asciicast+json";

/// Default bound on HTML-to-document redirections.
pub const DEFAULT_MAX_HOPS: usize = 5;

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<link\b[^>]*>").expect("link tag pattern is a valid regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is a valid regex")
});

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local file.
    Path(PathBuf),
    /// Standard input.
    Stdin,
    /// A remote resource.
    Url(Url),
}

impl Source {
    /// Classify a location string.
    pub fn parse(location: &str) -> Result<Self> {
        if location == "-" {
            return Ok(Self::Stdin);
        }

        let gateway_path = location
            .strip_prefix("ipfs:/")
            .or_else(|| location.strip_prefix("fs:/"));
        if let Some(path) = gateway_path {
            let url = format!("{IPFS_GATEWAY}/{}", path.trim_start_matches('/'));
            return Self::url(&url);
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::url(location);
        }

        Ok(Self::Path(PathBuf::from(location)))
    }

    fn url(location: &str) -> Result<Self> {
        Url::parse(location)
            .map(Self::Url)
            .map_err(|e| CastError::format(format!("invalid URL {location:?}: {e}")))
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("-"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Result of fetching one location.
enum Fetched {
    Document(Vec<u8>),
    Html { body: String, base: Base },
}

/// What a relative alternate link is resolved against.
enum Base {
    Url(Url),
    Dir(PathBuf),
}

/// Fetches documents, following HTML wrappers.
#[derive(Debug, Clone)]
pub struct Loader {
    client: reqwest::Client,
    max_hops: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Create a loader with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a loader around an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Set the redirection bound.
    #[must_use]
    pub const fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Load and decode the document behind `source`.
    pub async fn load(&self, source: &Source) -> Result<Asciicast> {
        let mut current = source.clone();

        for _ in 0..=self.max_hops {
            debug!(source = %current, "loading asciicast");
            match self.fetch(&current).await? {
                Fetched::Document(bytes) => return Asciicast::decode(&bytes),
                Fetched::Html { body, base } => {
                    let href = find_alternate_link(&body).ok_or_else(|| {
                        CastError::format(format!(
                            "expected alternate <link> not found in HTML document {current}"
                        ))
                    })?;
                    debug!(%href, "following alternate link");
                    current = resolve(&href, &base)?;
                }
            }
        }

        Err(CastError::format(format!(
            "gave up after {} HTML redirections starting at {source}",
            self.max_hops
        )))
    }

    async fn fetch(&self, source: &Source) -> Result<Fetched> {
        match source {
            Source::Stdin => {
                let mut bytes = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(|e| CastError::io_context("reading standard input", e))?;
                Ok(Fetched::Document(bytes))
            }
            Source::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    CastError::io_context(format!("reading {}", path.display()), e)
                })?;
                if path.extension().is_some_and(|ext| ext == "html") {
                    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                    return Ok(Fetched::Html {
                        body: String::from_utf8_lossy(&bytes).into_owned(),
                        base: Base::Dir(dir),
                    });
                }
                Ok(Fetched::Document(bytes))
            }
            Source::Url(url) => self.fetch_url(url).await,
        }
    }

    async fn fetch_url(&self, url: &Url) -> Result<Fetched> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CastError::network(format!(
                "got status {status} when requesting {url}"
            )));
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"));
        let base = response.url().clone();
        let bytes = response.bytes().await?;

        if is_html {
            Ok(Fetched::Html {
                body: String::from_utf8_lossy(&bytes).into_owned(),
                base: Base::Url(base),
            })
        } else {
            Ok(Fetched::Document(bytes.to_vec()))
        }
    }
}

fn resolve(href: &str, base: &Base) -> Result<Source> {
    match base {
        Base::Url(page) => page
            .join(href)
            .map(Source::Url)
            .map_err(|e| CastError::format(format!("invalid alternate link {href:?}: {e}"))),
        Base::Dir(dir) => match Source::parse(href)? {
            Source::Path(path) if path.is_relative() => Ok(Source::Path(dir.join(path))),
            other => Ok(other),
        },
    }
}

/// Find the `href` of the first asciicast alternate link in `html`.
#[must_use]
pub fn find_alternate_link(html: &str) -> Option<String> {
    LINK_TAG.find_iter(html).find_map(|tag| {
        let tag = tag.as_str();
        let rel = attribute(tag, "rel")?;
        let kind = attribute(tag, "type")?;
        if rel.eq_ignore_ascii_case("alternate") && kind.eq_ignore_ascii_case(ASCIICAST_MEDIA_TYPE) {
            attribute(tag, "href")
        } else {
            None
        }
    })
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    ATTRIBUTE.captures_iter(tag).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|value| value.as_str().to_string())
    })
}

/// Load a document from a location string.
pub async fn load(location: &str) -> Result<Asciicast> {
    Loader::new().load(&Source::parse(location)?).await
}
