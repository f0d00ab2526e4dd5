//! On-disk tile store with LRU caching.
//!
//! [`TileStore`] resolves grid square names against an unpacked Terrain 50
//! download and caches parsed tiles so that repeated assemblies over
//! overlapping areas do not re-read and re-parse the same squares.
//!
//! # Data layout
//!
//! The store points at the `data` folder of the unpacked download, which
//! contains one sub-folder per 100x100km square (e.g. `ny/`) holding one
//! zip archive per 10x10km square (e.g. `ny12_OST50GRID_20180619.zip`,
//! containing `NY12.asc`). A plain `NY12.asc` next to the archives is also
//! accepted. A missing folder or archive is not an error: it means the
//! square holds no land and is treated as sea.
//!
//! # Example
//!
//! ```ignore
//! use terr50::TileStore;
//!
//! let store = TileStore::new("./OSData/Altitudes/terr50_gagg_gb/data", 100);
//! let tile = store.load_square("NY12")?;
//! let stats = store.cache_stats();
//! println!("Cache hit rate: {:.1}%", stats.hit_rate() * 100.0);
//! ```

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::assemble::TileSource;
use crate::error::{Result, Terr50Error};
use crate::squares::{archive_prefix, asc_entry_name, canonical_square_name, data_folder_name};
use crate::tile::AscTile;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of loads served from cache.
    pub hit_count: u64,
    /// Number of loads that went to disk.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no loads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// A tile source rooted at a Terrain 50 data directory, with an LRU cache
/// of parsed tiles.
///
/// The cache is an explicit, caller-owned object: drop the store and its
/// memory goes with it, share it (it is `Sync`) and assemblies share the
/// parsed tiles.
pub struct TileStore {
    /// The unpacked download's `data` directory.
    data_dir: PathBuf,
    /// LRU cache of parsed tiles, keyed by canonical square name.
    tile_cache: Cache<String, Arc<AscTile>>,
    /// Number of cache hits.
    hit_count: AtomicU64,
    /// Number of cache misses.
    miss_count: AtomicU64,
}

impl TileStore {
    /// Create a new store.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - The unpacked download's `data` directory
    /// * `cache_size` - Maximum number of parsed tiles to keep in memory
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            tile_cache: Cache::builder().max_capacity(cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Load the tile for a square, from cache or disk.
    ///
    /// Returns `Ok(None)` when no source data exists for the square — the
    /// square is entirely sea.
    ///
    /// # Errors
    ///
    /// - [`Terr50Error::SquareName`] for a malformed square name
    /// - [`Terr50Error::AmbiguousArchive`] if several archives match
    /// - [`Terr50Error::Io`] for file or archive access problems
    /// - the [`AscTile::parse`] error kinds for malformed tile contents
    pub fn load_square(&self, square: &str) -> Result<Option<Arc<AscTile>>> {
        let name = canonical_square_name(square).ok_or_else(|| Terr50Error::SquareName {
            name: square.to_string(),
        })?;

        if let Some(tile) = self.tile_cache.get(&name) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(tile));
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let text = match self.read_square_file(&name)? {
            Some(text) => text,
            None => return Ok(None),
        };

        let tile = Arc::new(AscTile::parse(&name, &text)?);
        self.tile_cache.insert(name, tile.clone());
        Ok(Some(tile))
    }

    /// Locate and read a square's `.asc` contents.
    ///
    /// Checks for a plain `.asc` file first, then for exactly one matching
    /// zip archive. `Ok(None)` means no data exists for the square.
    fn read_square_file(&self, name: &str) -> Result<Option<String>> {
        let folder = self.data_dir.join(data_folder_name(name));
        if !folder.is_dir() {
            // No folder for the 100x100km square: all of it is sea.
            return Ok(None);
        }

        let asc_path = folder.join(asc_entry_name(name));
        if asc_path.is_file() {
            return Ok(Some(fs::read_to_string(asc_path)?));
        }

        // Archives carry an unpredictable date suffix, so scan by prefix.
        let prefix = archive_prefix(name);
        let mut archives: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&prefix)
                && file_name.ends_with(".zip")
                && entry.file_type()?.is_file()
            {
                archives.push(entry.path());
            }
        }

        match archives.len() {
            0 => Ok(None),
            1 => read_asc_from_zip(&archives[0], name).map(Some),
            count => Err(Terr50Error::AmbiguousArchive {
                square: name.to_string(),
                count,
            }),
        }
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.tile_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached tile.
    pub fn clear_cache(&self) {
        self.tile_cache.invalidate_all();
    }

    /// The data directory this store reads from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl TileSource for TileStore {
    fn load_square(&self, square: &str) -> Result<Option<Arc<AscTile>>> {
        TileStore::load_square(self, square)
    }
}

/// Read the square's `.asc` entry out of its zip archive.
fn read_asc_from_zip(zip_path: &Path, name: &str) -> Result<String> {
    let file = fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Terr50Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let entry_name = asc_entry_name(name);
    let mut entry = archive.by_name(&entry_name).map_err(|e| {
        Terr50Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No {} in {}: {}", entry_name, zip_path.display(), e),
        ))
    })?;

    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const TILE_TEXT: &str =
        "ncols 2\nnrows 2\nxllcorner 320000\nyllcorner 520000\ncellsize 50\n1.0 2.0\n3.0 4.0\n";

    fn write_zip(folder: &Path, zip_name: &str, entry_name: &str, contents: &str) {
        let file = fs::File::create(folder.join(zip_name)).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(entry_name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    fn store_with_square(contents: &str) -> (TempDir, TileStore) {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("ny");
        fs::create_dir(&folder).unwrap();
        write_zip(&folder, "ny12_OST50GRID_20180619.zip", "NY12.asc", contents);
        let store = TileStore::new(tmp.path(), 10);
        (tmp, store)
    }

    #[test]
    fn test_load_from_zip() {
        let (_tmp, store) = store_with_square(TILE_TEXT);
        let tile = store.load_square("NY12").unwrap().unwrap();
        assert_eq!(tile.header.name, "NY12");
        assert_eq!(tile.grid.row(0), &[3.0, 4.0]);

        // Lower-case input resolves to the same square.
        let again = store.load_square("ny12").unwrap().unwrap();
        assert_eq!(again.header, tile.header);
    }

    #[test]
    fn test_load_plain_asc_file() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("sd");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("SD34.asc"), TILE_TEXT).unwrap();

        let store = TileStore::new(tmp.path(), 10);
        let tile = store.load_square("SD34").unwrap().unwrap();
        assert_eq!(tile.header.name, "SD34");
    }

    #[test]
    fn test_missing_folder_means_sea() {
        let tmp = TempDir::new().unwrap();
        let store = TileStore::new(tmp.path(), 10);
        assert!(store.load_square("NY12").unwrap().is_none());
    }

    #[test]
    fn test_missing_archive_means_sea() {
        let (_tmp, store) = store_with_square(TILE_TEXT);
        // The ny folder exists but holds nothing for NY99.
        assert!(store.load_square("NY99").unwrap().is_none());
    }

    #[test]
    fn test_invalid_name_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = TileStore::new(tmp.path(), 10);
        assert!(matches!(
            store.load_square("bogus").unwrap_err(),
            Terr50Error::SquareName { .. }
        ));
    }

    #[test]
    fn test_multiple_archives_is_an_error() {
        let (tmp, store) = store_with_square(TILE_TEXT);
        let folder = tmp.path().join("ny");
        write_zip(&folder, "ny12_OST50GRID_20190701.zip", "NY12.asc", TILE_TEXT);

        match store.load_square("NY12").unwrap_err() {
            Terr50Error::AmbiguousArchive { square, count } => {
                assert_eq!(square, "NY12");
                assert_eq!(count, 2);
            }
            other => panic!("expected AmbiguousArchive, got {:?}", other),
        }
    }

    #[test]
    fn test_archive_without_expected_entry() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("ny");
        fs::create_dir(&folder).unwrap();
        write_zip(&folder, "ny12_OST50GRID_20180619.zip", "WRONG.asc", TILE_TEXT);

        let store = TileStore::new(tmp.path(), 10);
        assert!(matches!(
            store.load_square("NY12").unwrap_err(),
            Terr50Error::Io(_)
        ));
    }

    #[test]
    fn test_malformed_tile_propagates_parse_error() {
        let (_tmp, store) = store_with_square("ncols 2\nnrows 2\nbroken header\n");
        assert!(matches!(
            store.load_square("NY12").unwrap_err(),
            Terr50Error::HeaderFormat { .. }
        ));
    }

    #[test]
    fn test_cache_hits_and_misses() {
        let (_tmp, store) = store_with_square(TILE_TEXT);

        let _ = store.load_square("NY12").unwrap();
        let _ = store.load_square("NY12").unwrap();
        let _ = store.load_square("ny12").unwrap();

        let stats = store.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 2);
        assert!(stats.hit_rate() > 0.6);

        store.clear_cache();
        let _ = store.load_square("NY12").unwrap();
        assert_eq!(store.cache_stats().miss_count, 2);
    }
}
