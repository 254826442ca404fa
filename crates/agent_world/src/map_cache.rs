//! Per-tile map cache with TTL freshness, expanding-ring search, and
//! boundary detection (§4.2). Backed by [`crate::persistence`] for atomic
//! JSON writes.

use crate::persistence::{load_if_present, save_atomic};
use agent_client::{GameClient, MapTile, Position, TileContent, TileContentType};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_TTL_SECONDS: u64 = 180;

/// Rejections required along one cardinal direction within a radius band
/// before that band is treated as off-map (§4.2).
const BOUNDARY_REJECTION_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTile {
    tile: MapTile,
    last_scanned: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MapCacheData {
    tiles: BTreeMap<String, CachedTile>,
    /// Direction string ("+x","-x","+y","-y") → rejection count, keyed
    /// further by coarse radius band so a boundary in one band doesn't
    /// suppress searches well beyond it. Key shape: "direction:band".
    boundary_rejections: BTreeMap<String, u32>,
}

pub struct MapCache {
    data: MapCacheData,
    ttl: Duration,
    path: Option<PathBuf>,
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

impl MapCache {
    pub fn new() -> Self {
        Self { data: MapCacheData::default(), ttl: Duration::from_secs(DEFAULT_TTL_SECONDS), path: None }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = load_if_present(&path)?.unwrap_or_default();
        Ok(Self { data, ttl: Duration::from_secs(DEFAULT_TTL_SECONDS), path: Some(path) })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            save_atomic(path, &self.data)?;
        }
        Ok(())
    }

    fn is_fresh(&self, cached: &CachedTile) -> bool {
        now_unix().saturating_sub(cached.last_scanned) <= self.ttl.as_secs()
    }

    /// Returns the cached tile if present; when `require_fresh` is set,
    /// a stale entry is treated as absent.
    pub fn get(&self, x: i32, y: i32, require_fresh: bool) -> Option<MapTile> {
        let cached = self.data.tiles.get(&Position::new(x, y).key())?;
        if require_fresh && !self.is_fresh(cached) {
            return None;
        }
        Some(cached.tile.clone())
    }

    pub fn put(&mut self, tile: MapTile) {
        let key = Position::new(tile.x, tile.y).key();
        self.data.tiles.insert(key, CachedTile { tile, last_scanned: now_unix() });
    }

    /// Marks a coordinate the server rejected as off-map, bucketed by
    /// cardinal direction and a coarse radius band relative to the
    /// character's home region (the origin, by convention — callers that
    /// track an explicit home tile should translate before calling).
    pub fn record_boundary(&mut self, x: i32, y: i32) {
        let direction = if x.abs() >= y.abs() {
            if x >= 0 { "+x" } else { "-x" }
        } else if y >= 0 {
            "+y"
        } else {
            "-y"
        };
        let band = (x.abs().max(y.abs()) as u32) / 10;
        let key = format!("{direction}:{band}");
        *self.data.boundary_rejections.entry(key).or_insert(0) += 1;
    }

    fn is_boundary(&self, x: i32, y: i32) -> bool {
        let direction = if x.abs() >= y.abs() {
            if x >= 0 { "+x" } else { "-x" }
        } else if y >= 0 {
            "+y"
        } else {
            "-y"
        };
        let band = (x.abs().max(y.abs()) as u32) / 10;
        let key = format!("{direction}:{band}");
        self.data.boundary_rejections.get(&key).copied().unwrap_or(0) >= BOUNDARY_REJECTION_THRESHOLD
    }

    /// Coordinates at exactly Chebyshev distance `ring` from `center`, in a
    /// stable clockwise order starting due north.
    fn ring_coordinates(center: Position, ring: u32) -> Vec<Position> {
        if ring == 0 {
            return vec![center];
        }
        let r = ring as i32;
        let mut coords = Vec::new();
        for dx in -r..=r {
            coords.push(Position::new(center.x + dx, center.y - r));
            coords.push(Position::new(center.x + dx, center.y + r));
        }
        for dy in (-r + 1)..r {
            coords.push(Position::new(center.x - r, center.y + dy));
            coords.push(Position::new(center.x + r, center.y + dy));
        }
        coords
    }

    /// Expanding-ring search out to `radius`, consulting the cache first
    /// (honoring TTL) and falling back to `client` on a miss. Matches are
    /// returned nearest-first; skips coordinates known to be off-map.
    pub async fn search(
        &mut self,
        client: &dyn GameClient,
        center: Position,
        radius: u32,
        filter: impl Fn(&TileContent) -> bool,
        nearest_only: bool,
    ) -> Result<Vec<MapTile>> {
        let mut matches = Vec::new();
        for ring in 0..=radius {
            let mut ring_matches = Vec::new();
            for coord in Self::ring_coordinates(center, ring) {
                if self.is_boundary(coord.x, coord.y) {
                    continue;
                }
                let tile = match self.get(coord.x, coord.y, true) {
                    Some(tile) => tile,
                    None => match client.get_map(coord.x, coord.y).await {
                        Ok(tile) => {
                            self.put(tile.clone());
                            tile
                        }
                        Err(_) => {
                            self.record_boundary(coord.x, coord.y);
                            continue;
                        }
                    },
                };
                if let Some(content) = &tile.content {
                    if filter(content) {
                        ring_matches.push(tile);
                    }
                }
            }
            if !ring_matches.is_empty() {
                matches.extend(ring_matches);
                if nearest_only {
                    return Ok(matches);
                }
            }
        }
        matches.sort_by_key(|t| center.chebyshev_distance(&Position::new(t.x, t.y)));
        Ok(matches)
    }
}

impl Default for MapCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;

    fn resource_tile(x: i32, y: i32, code: &str) -> MapTile {
        MapTile { x, y, content: Some(TileContent { content_type: TileContentType::Resource, code: code.into() }) }
    }

    #[test]
    fn stale_tile_is_hidden_when_freshness_required() {
        let mut cache = MapCache::new().with_ttl(Duration::from_secs(0));
        cache.put(resource_tile(1, 1, "copper_rocks"));
        std::thread::sleep(Duration::from_millis(1100));
        assert!(cache.get(1, 1, true).is_none());
        assert!(cache.get(1, 1, false).is_some());
    }

    #[test]
    fn radius_zero_returns_only_center_ring() {
        assert_eq!(MapCache::ring_coordinates(Position::new(0, 0), 0), vec![Position::new(0, 0)]);
    }

    #[test]
    fn boundary_marked_after_threshold_rejections() {
        let mut cache = MapCache::new();
        assert!(!cache.is_boundary(100, 0));
        cache.record_boundary(100, 0);
        assert!(!cache.is_boundary(100, 0));
        cache.record_boundary(100, 0);
        assert!(cache.is_boundary(100, 0));
    }

    #[tokio::test]
    async fn search_finds_resource_via_client_fallback_and_caches_it() {
        let client = MockGameClient::new().with_tile(resource_tile(2, 0, "copper_rocks"));
        let mut cache = MapCache::new();
        let results = cache
            .search(&client, Position::new(0, 0), 2, |c| c.content_type == TileContentType::Resource, true)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].x, 2);
        assert!(cache.get(2, 0, true).is_some());
    }

    #[tokio::test]
    async fn save_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let mut cache = MapCache::load(&path).unwrap();
        cache.put(resource_tile(3, 4, "ash_tree"));
        cache.save().unwrap();

        let reloaded = MapCache::load(&path).unwrap();
        assert!(reloaded.get(3, 4, false).is_some());
    }
}
