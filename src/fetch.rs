use log::{error, info};
use std::{fs, path::PathBuf};

use crate::errors::{NdmiError, Result};

/// Fetches the body behind a URL.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url)
    }
}

/// Plain blocking HTTP GET, one attempt.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(NdmiError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Download directory where an entry that exists is complete.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{scene_id}_{basename}`, with any query string removed from the URL.
    pub fn entry_name(scene_id: &str, url: &str) -> String {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let basename = path.rsplit('/').next().unwrap_or(path);
        format!("{scene_id}_{basename}")
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn lookup(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_of(name);
        path.is_file().then_some(path)
    }

    /// Writes through a `.part` sibling so a partial body is never looked up.
    pub fn store(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_of(name);
        let partial = self.path_of(&format!("{name}.part"));
        fs::write(&partial, contents)?;
        fs::rename(&partial, &path)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cached,
    Downloaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRaster {
    pub url: String,
    pub path: PathBuf,
    pub origin: FetchOrigin,
}

#[derive(Debug)]
pub struct RasterFetcher<T> {
    transport: T,
    cache: LocalCache,
}

impl<T: Transport> RasterFetcher<T> {
    pub fn new(transport: T, cache: LocalCache) -> Self {
        Self { transport, cache }
    }

    /// Local copies of `urls`, downloading only what the cache lacks.
    ///
    /// A URL that fails is logged and left out of the result.
    pub fn fetch<S: AsRef<str>>(&self, urls: &[S], scene_id: &str) -> Vec<FetchedRaster> {
        urls.iter()
            .filter_map(|url| match self.fetch_one(url.as_ref(), scene_id) {
                Ok(fetched) => Some(fetched),
                Err(err) => {
                    error!("failed to download {}: {err}", url.as_ref());
                    None
                }
            })
            .collect()
    }

    fn fetch_one(&self, url: &str, scene_id: &str) -> Result<FetchedRaster> {
        let name = LocalCache::entry_name(scene_id, url);
        if let Some(path) = self.cache.lookup(&name) {
            info!("file already exists: {}", path.display());
            return Ok(FetchedRaster {
                url: url.to_string(),
                path,
                origin: FetchOrigin::Cached,
            });
        }
        let body = self.transport.get(url)?;
        let path = self.cache.store(&name, &body)?;
        info!("downloaded: {}", path.display());
        Ok(FetchedRaster {
            url: url.to_string(),
            path,
            origin: FetchOrigin::Downloaded,
        })
    }
}
