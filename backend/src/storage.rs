use futures::FutureExt;

use crate::analysis::AnalysisData;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid demo location {0:?}, only paths inside the demo folder are allowed")]
    InvalidLocation(String),
    #[error("reading {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching {url}: server responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("fetching {url}: demo is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },
    #[error("loading demo: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Somewhere demos can be loaded from
pub trait DemoStorage: Send + Sync {
    fn load<'f, 'own>(
        &'own self,
        location: String,
    ) -> futures::future::BoxFuture<'f, Result<AnalysisData, StorageError>>
    where
        'own: 'f;
}

pub struct FileStorage {
    folder: std::sync::Arc<std::path::PathBuf>,
}

impl FileStorage {
    pub fn new<P>(folder: P) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self {
            folder: std::sync::Arc::new(folder.into()),
        }
    }
}

/// Only plain relative paths stay inside the folder, anything rooted or
/// walking upwards is rejected.
pub fn is_contained(location: &str) -> bool {
    let path = std::path::Path::new(location);
    if location.is_empty() || path.has_root() || path.is_absolute() {
        return false;
    }

    path.components().all(|c| {
        matches!(
            c,
            std::path::Component::Normal(_) | std::path::Component::CurDir
        )
    })
}

fn map_file(path: std::path::PathBuf) -> Result<AnalysisData, StorageError> {
    let mmap = std::fs::File::open(path.as_path())
        .and_then(|file| unsafe { memmap2::MmapOptions::new().map(&file) })
        .map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::debug!("Mapped {:?} with {} bytes", path, mmap.len());

    Ok(AnalysisData::MemMapped(std::sync::Arc::new(mmap)))
}

impl DemoStorage for FileStorage {
    fn load<'f, 'own>(
        &'own self,
        location: String,
    ) -> futures::future::BoxFuture<'f, Result<AnalysisData, StorageError>>
    where
        'own: 'f,
    {
        async move {
            if !is_contained(&location) {
                return Err(StorageError::InvalidLocation(location));
            }

            let demo_file_path = self.folder.join(&location);

            // Opening may block indefinitely, e.g. on a FIFO
            tokio::task::spawn_blocking(move || map_file(demo_file_path)).await?
        }
        .boxed()
    }
}

pub struct HttpStorage {
    http: reqwest::Client,
    max_bytes: usize,
}

impl HttpStorage {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            max_bytes,
        }
    }
}

impl DemoStorage for HttpStorage {
    fn load<'f, 'own>(
        &'own self,
        location: String,
    ) -> futures::future::BoxFuture<'f, Result<AnalysisData, StorageError>>
    where
        'own: 'f,
    {
        async move {
            let mut response = self
                .http
                .get(&location)
                .send()
                .await
                .map_err(|source| StorageError::Http {
                    url: location.clone(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(StorageError::Status {
                    url: location,
                    status: response.status(),
                });
            }

            let too_large = |url: String| StorageError::TooLarge {
                url,
                limit: self.max_bytes,
            };

            let announced = response.content_length().unwrap_or(0);
            if announced > self.max_bytes as u64 {
                return Err(too_large(location));
            }

            let mut body = Vec::with_capacity(announced as usize);
            loop {
                let chunk = response.chunk().await.map_err(|source| StorageError::Http {
                    url: location.clone(),
                    source,
                })?;
                let chunk = match chunk {
                    Some(c) => c,
                    None => break,
                };

                if body.len() + chunk.len() > self.max_bytes {
                    return Err(too_large(location));
                }
                body.extend_from_slice(&chunk);
            }

            tracing::debug!("Fetched {} bytes from {:?}", body.len(), location);

            Ok(AnalysisData::Preloaded(body.into()))
        }
        .boxed()
    }
}

/// Loads `http://` and `https://` locations over the network and everything
/// else from the local demo folder.
pub struct SourceStorage {
    files: FileStorage,
    http: HttpStorage,
}

impl SourceStorage {
    pub fn new<P>(folder: P, max_bytes: usize) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self {
            files: FileStorage::new(folder),
            http: HttpStorage::new(max_bytes),
        }
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl DemoStorage for SourceStorage {
    fn load<'f, 'own>(
        &'own self,
        location: String,
    ) -> futures::future::BoxFuture<'f, Result<AnalysisData, StorageError>>
    where
        'own: 'f,
    {
        if is_remote(&location) {
            self.http.load(location)
        } else {
            self.files.load(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_folder(name: &str) -> std::path::PathBuf {
        let folder = std::env::temp_dir().join(format!("backend-storage-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&folder).unwrap();
        folder
    }

    #[test]
    fn remote_locations() {
        assert!(is_remote("https://utfs.io/f/demo.dem"));
        assert!(is_remote("http://localhost:8080/demo.dem"));
        assert!(!is_remote("demos/match.dem"));
        assert!(!is_remote("/tmp/http.dem"));
    }

    #[test]
    fn contained_locations() {
        assert!(is_contained("match.dem"));
        assert!(is_contained("./season/match.dem"));
        assert!(!is_contained("/etc/hostname"));
        assert!(!is_contained("../x.dem"));
        assert!(!is_contained("season/../../x.dem"));
        assert!(!is_contained(""));
    }

    #[tokio::test]
    async fn loads_file_relative_to_folder() {
        let folder = scratch_folder("relative");
        std::fs::write(folder.join("match.dem"), b"PBDEMS2\0content").unwrap();

        let storage = SourceStorage::new(&folder, 1024);
        let data = storage.load("match.dem".to_owned()).await.unwrap();

        assert_eq!(b"PBDEMS2\0content".as_slice(), data.data());
    }

    #[tokio::test]
    async fn absolute_path_is_rejected() {
        let folder = scratch_folder("absolute");
        let target = folder.join("outside.dem");
        std::fs::write(&target, b"PBDEMS2\0content").unwrap();

        let storage = FileStorage::new(folder.join("nested"));
        let result = storage.load(target.to_string_lossy().into_owned()).await;

        assert!(matches!(result, Err(StorageError::InvalidLocation(_))));
    }

    async fn serve_bytes(size: usize) -> String {
        let router = axum::Router::new().route(
            "/match.dem",
            axum::routing::get(move || async move { vec![7_u8; size] }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        format!("http://{}/match.dem", addr)
    }

    #[tokio::test]
    async fn remote_within_limit() {
        let url = serve_bytes(512).await;

        let data = HttpStorage::new(1024).load(url).await.unwrap();
        assert_eq!(512, data.data().len());
    }

    #[tokio::test]
    async fn remote_over_limit() {
        let url = serve_bytes(4096).await;

        let result = HttpStorage::new(1024).load(url).await;
        assert!(
            matches!(result, Err(StorageError::TooLarge { limit: 1024, .. })),
            "{:?}",
            result.map(|d| d.data().len())
        );
    }

    #[tokio::test]
    async fn missing_file() {
        let folder = scratch_folder("missing");

        let storage = FileStorage::new(&folder);
        let result = storage.load("does-not-exist.dem".to_owned()).await;

        match result {
            Err(StorageError::Io { path, .. }) => {
                assert_eq!(folder.join("does-not-exist.dem"), path);
            }
            other => panic!("Unexpected result: {:?}", other.map(|d| d.data().len())),
        }
    }
}
