use crate::loading::data_loader::DatasetLoader;
use crate::loading::error::DataError;
use crate::types::dataset::DatasetKind;
use crate::types::station::Station;
use log::debug;
use polars::prelude::DataFrame;
use std::collections::{hash_map::Entry, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;

type FrameKey = (Option<Station>, DatasetKind);

/// Loads normalized tables off the async runtime and memoizes them per
/// (station, dataset). Source files are read-only, so a cached table stays valid
/// for the lifetime of the fetcher.
pub struct FrameFetcher {
    loader: Arc<DatasetLoader>,
    frame_cache: Mutex<HashMap<FrameKey, DataFrame>>,
    use_cache: bool,
}

impl FrameFetcher {
    pub fn new(data_dir: &Path, use_cache: bool) -> Self {
        Self {
            loader: Arc::new(DatasetLoader::new(data_dir)),
            frame_cache: Mutex::new(HashMap::new()),
            use_cache,
        }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// Gets the table for a station dataset (or a shared dataset when `station` is
    /// `None`), reading the file on the blocking pool on a cache miss.
    pub async fn get_frame(
        &self,
        station: Option<Station>,
        kind: DatasetKind,
    ) -> Result<DataFrame, DataError> {
        let station = if kind.is_shared() { None } else { station };
        let key = (station, kind);

        if self.use_cache {
            let cache = self.frame_cache.lock().await;
            if let Some(frame) = cache.get(&key) {
                return Ok(frame.clone());
            }
        }

        let loader = Arc::clone(&self.loader);
        let frame = task::spawn_blocking(move || loader.load(station, kind)).await??;

        if !self.use_cache {
            return Ok(frame);
        }

        let mut cache = self.frame_cache.lock().await;
        match cache.entry(key) {
            // Another request loaded the same file while we were reading it.
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                debug!("Caching {} for {:?}", kind, station);
                entry.insert(frame.clone());
                Ok(frame)
            }
        }
    }

    /// Drops every cached table.
    pub async fn clear(&self) {
        self.frame_cache.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_cached_frame_survives_file_removal() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = root.path().join("Estacion 1");
        fs::create_dir_all(&dir)?;
        let file = dir.join("SPI.csv");
        fs::write(&file, "FECHA,SPI\n1992-01-01,0.5\n")?;

        let fetcher = FrameFetcher::new(root.path(), true);
        let first = fetcher.get_frame(Station::new(1), DatasetKind::Spi).await?;
        fs::remove_file(&file)?;
        let second = fetcher.get_frame(Station::new(1), DatasetKind::Spi).await?;
        assert_eq!(first.height(), second.height());

        fetcher.clear().await;
        let result = fetcher.get_frame(Station::new(1), DatasetKind::Spi).await;
        assert!(matches!(result, Err(DataError::DataUnavailable(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_uncached_fetcher_rereads() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = root.path().join("Estacion 2");
        fs::create_dir_all(&dir)?;
        let file = dir.join("SPI.csv");
        fs::write(&file, "FECHA,SPI\n1992-01-01,0.5\n")?;

        let fetcher = FrameFetcher::new(root.path(), false);
        assert_eq!(fetcher.get_frame(Station::new(2), DatasetKind::Spi).await?.height(), 1);
        fs::write(&file, "FECHA,SPI\n1992-01-01,0.5\n1992-02-01,0.7\n")?;
        assert_eq!(fetcher.get_frame(Station::new(2), DatasetKind::Spi).await?.height(), 2);
        Ok(())
    }
}
