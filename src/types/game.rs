//! Game collection types for playtime aggregation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::types::{Result, ShelfError};

/// A single per-ROM playtime record as written by the tracker.
///
/// Counts are deserialized as signed integers so that corrupt negative
/// values can be rejected with a proper error instead of wrapping.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub total_time: i64,
    pub launches: i64,
    /// Stale derived field; ignored once any merge happens
    #[serde(default)]
    pub avg_time: f64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub last_session: i64,
    #[serde(default)]
    pub device_launches: HashMap<String, i64>,
}

impl RawRecord {
    /// Reject negative counters, naming the offending source key.
    /// Negative values indicate upstream corruption and must not be summed.
    pub fn validate(&self, key: &str) -> Result<()> {
        let fail = |reason: String| {
            Err(ShelfError::Record {
                key: key.to_string(),
                reason,
            })
        };

        if self.total_time < 0 {
            return fail(format!("negative total_time ({})", self.total_time));
        }
        if self.launches < 0 {
            return fail(format!("negative launches ({})", self.launches));
        }
        for (device, count) in &self.device_launches {
            if *count < 0 {
                return fail(format!("negative launch count for device '{}'", device));
            }
        }
        Ok(())
    }
}

/// Opaque handle to a cover-art asset. The aggregator only carries it;
/// reading the bytes is the renderer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub path: PathBuf,
}

/// One deduplicated game: all raw records sharing the same
/// (canonical platform, name) pair folded together.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameSummary {
    pub name: String,
    pub platform: String,
    pub platform_short: String,
    pub platform_color: String,
    pub total_time: u64,
    pub launches: u64,
    pub avg_time: f64,
    pub start_time: i64,
    pub last_session: i64,
    pub device_launches: BTreeMap<String, u64>,
    #[serde(skip)]
    pub cover: Option<CoverArt>,
}

impl GameSummary {
    /// Fold another validated record for the same dedup key into this summary.
    ///
    /// `start_time`/`last_session` only move forward on a strictly greater
    /// `start_time`; equal timestamps keep the value seen first.
    pub fn absorb(&mut self, record: &RawRecord) {
        self.total_time = self.total_time.saturating_add(record.total_time as u64);
        self.launches = self.launches.saturating_add(record.launches as u64);

        if record.start_time > self.start_time {
            self.start_time = record.start_time;
            self.last_session = record.last_session;
        }

        for (device, count) in &record.device_launches {
            let entry = self.device_launches.entry(device.clone()).or_insert(0);
            *entry = entry.saturating_add(*count as u64);
        }

        self.recompute_avg();
    }

    /// Recompute `avg_time` from the merged totals. The input-provided
    /// value is never trusted.
    pub fn recompute_avg(&mut self) {
        self.avg_time = if self.launches > 0 {
            self.total_time as f64 / self.launches as f64
        } else {
            0.0
        };
    }
}

/// Collection-wide totals shown in the page hero and the stats report
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total_games: usize,
    pub total_time: u64,
    pub total_launches: u64,
    /// Most-played platform and its playtime (ties keep the first seen)
    pub top_platform: Option<(String, u64)>,
}

impl CollectionStats {
    pub fn from_summaries(summaries: &[GameSummary]) -> Self {
        if summaries.is_empty() {
            return Self {
                total_games: 0,
                total_time: 0,
                total_launches: 0,
                top_platform: None,
            };
        }

        let mut total_time: u64 = 0;
        let mut total_launches: u64 = 0;

        // Per-platform playtime in first-seen order so ties stay stable
        let mut platform_order: Vec<String> = Vec::new();
        let mut platform_time: HashMap<String, u64> = HashMap::new();

        for game in summaries {
            total_time = total_time.saturating_add(game.total_time);
            total_launches = total_launches.saturating_add(game.launches);

            if !platform_time.contains_key(&game.platform) {
                platform_order.push(game.platform.clone());
            }
            let entry = platform_time.entry(game.platform.clone()).or_insert(0);
            *entry = entry.saturating_add(game.total_time);
        }

        let mut top_platform: Option<(String, u64)> = None;
        for platform in &platform_order {
            let time = platform_time[platform];
            match &top_platform {
                None => top_platform = Some((platform.clone(), time)),
                Some((_, max_time)) if time > *max_time => {
                    top_platform = Some((platform.clone(), time));
                }
                _ => {}
            }
        }

        Self {
            total_games: summaries.len(),
            total_time,
            total_launches,
            top_platform,
        }
    }
}
