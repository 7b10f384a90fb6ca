//! Playtime record aggregation and deduplication
//!
//! Folds the tracker's per-ROM records into one summary per
//! (canonical platform, game name) pair. Counters are summed, the
//! latest session wins on a strictly newer `start_time`, and the
//! average is always recomputed from the merged totals.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

use crate::services::assets::CoverArtProvider;
use crate::services::platform::PlatformMap;
use crate::types::{GameSummary, RawRecord, Result};

/// Path marker separating storage prefix from platform/game segments
pub const ROM_MARKER: &str = "/ROMS/";

/// Separator between canonical platform and game name in the dedup key
const DEDUP_SEP: &str = "::";

/// Split a source key into (raw platform label, file base name).
///
/// Keys without the ROM marker carry no game identity and are filtered
/// out, not treated as errors.
fn split_source_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.splitn(2, ROM_MARKER).nth(1)?;
    let platform = rest.split('/').next().unwrap_or(rest);
    let file = rest.rsplit('/').next().unwrap_or(rest);
    let base = Path::new(file)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(file);
    Some((platform, base))
}

/// Aggregator folding raw playtime records into per-game summaries
pub struct Aggregator<'a> {
    platforms: &'a PlatformMap,
}

impl<'a> Aggregator<'a> {
    pub fn new(platforms: &'a PlatformMap) -> Self {
        Self { platforms }
    }

    /// Aggregate records in input order into a deduplicated summary list,
    /// sorted by total playtime descending (stable on ties).
    ///
    /// The cover provider is probed once per distinct game, never on
    /// merges. A pure transform otherwise: no state survives the call.
    pub fn aggregate(
        &self,
        records: &[(String, RawRecord)],
        covers: &dyn CoverArtProvider,
    ) -> Result<Vec<GameSummary>> {
        let mut games: Vec<GameSummary> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (key, record) in records {
            let Some((raw_platform, base_name)) = split_source_key(key) else {
                continue;
            };

            record.validate(key)?;

            let platform = self.platforms.canonical(raw_platform);
            let dedup_key = format!("{}{}{}", platform, DEDUP_SEP, record.name);

            if let Some(&index) = seen.get(&dedup_key) {
                games[index].absorb(record);
                continue;
            }

            // The tracker's `name` field is authoritative; the file base
            // name only serves as the cover lookup fallback.
            let probe_name = if base_name.is_empty() {
                record.name.as_str()
            } else {
                base_name
            };
            let cover = covers.find(platform, probe_name);

            let mut summary = GameSummary {
                name: record.name.clone(),
                platform: platform.to_string(),
                platform_short: self.platforms.short_label(platform).to_string(),
                platform_color: self.platforms.color(platform).to_string(),
                total_time: record.total_time as u64,
                launches: record.launches as u64,
                avg_time: 0.0,
                start_time: record.start_time,
                last_session: record.last_session,
                device_launches: record
                    .device_launches
                    .iter()
                    .map(|(device, count)| (device.clone(), *count as u64))
                    .collect(),
                cover,
            };
            summary.recompute_avg();

            seen.insert(dedup_key, games.len());
            games.push(summary);
        }

        // Vec::sort_by is stable: ties keep encounter order
        games.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::assets::NoCovers;
    use crate::types::CoverArt;
    use std::collections::HashMap as StdHashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn record(name: &str, total_time: i64, launches: i64) -> RawRecord {
        RawRecord {
            name: name.into(),
            total_time,
            launches,
            avg_time: 0.0,
            start_time: 0,
            last_session: 0,
            device_launches: StdHashMap::new(),
        }
    }

    fn aggregate(records: Vec<(&str, RawRecord)>) -> Vec<GameSummary> {
        let platforms = PlatformMap::default();
        let owned: Vec<(String, RawRecord)> = records
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Aggregator::new(&platforms)
            .aggregate(&owned, &NoCovers)
            .unwrap()
    }

    /// Provider that records every probe and always returns a cover
    struct RecordingCovers {
        probes: Mutex<Vec<(String, String)>>,
    }

    impl RecordingCovers {
        fn new() -> Self {
            Self {
                probes: Mutex::new(Vec::new()),
            }
        }
    }

    impl CoverArtProvider for RecordingCovers {
        fn find(&self, platform: &str, base_name: &str) -> Option<CoverArt> {
            self.probes
                .lock()
                .unwrap()
                .push((platform.to_string(), base_name.to_string()));
            Some(CoverArt {
                path: PathBuf::from(format!("{}/box/{}.png", platform, base_name)),
            })
        }
    }

    // ========== split_source_key ==========

    #[test]
    fn test_split_source_key() {
        let (platform, base) =
            split_source_key("/mnt/sdcard/ROMS/Nintendo NES - Famicom/mario.nes").unwrap();
        assert_eq!(platform, "Nintendo NES - Famicom");
        assert_eq!(base, "mario");
    }

    #[test]
    fn test_split_source_key_nested_subdir() {
        let (platform, base) =
            split_source_key("/mnt/sdcard/ROMS/NES/usa/subdir/mario2.nes").unwrap();
        assert_eq!(platform, "NES");
        assert_eq!(base, "mario2");
    }

    #[test]
    fn test_split_source_key_no_marker() {
        assert!(split_source_key("/mnt/sdcard/saves/mario.srm").is_none());
    }

    #[test]
    fn test_split_source_key_multi_dot_strips_last_extension() {
        let (_, base) = split_source_key("/sd/ROMS/PS1/Final Fantasy VII.disc1.chd").unwrap();
        assert_eq!(base, "Final Fantasy VII.disc1");
    }

    // ========== merge semantics ==========

    #[test]
    fn test_merge_same_game_across_paths() {
        // Scenario A: same name + platform under different paths folds
        // into one summary with summed counters and a recomputed average
        let games = aggregate(vec![
            ("/sd/ROMS/NES/mario.nes", {
                let mut r = record("Super Mario Bros", 100, 2);
                r.avg_time = 50.0;
                r
            }),
            ("/sd/ROMS/NES/subdir/mario2.nes", {
                let mut r = record("Super Mario Bros", 50, 1);
                r.avg_time = 999.0; // stale input value, must be discarded
                r
            }),
        ]);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].platform, "NES");
        assert_eq!(games[0].total_time, 150);
        assert_eq!(games[0].launches, 3);
        assert!((games[0].avg_time - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_marker_key_skipped_silently() {
        // Scenario B
        let games = aggregate(vec![
            ("/sd/ROMS/NES/mario.nes", record("Super Mario Bros", 100, 2)),
            ("/sd/saves/backup.json", record("Not A Game", 999, 9)),
        ]);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Super Mario Bros");
    }

    #[test]
    fn test_device_launches_merged_per_device() {
        // Scenario C
        let mut first = record("Tetris", 10, 1);
        first.device_launches.insert("deviceA".into(), 3);
        let mut second = record("Tetris", 10, 1);
        second.device_launches.insert("deviceA".into(), 2);
        second.device_launches.insert("deviceB".into(), 1);

        let games = aggregate(vec![
            ("/sd/ROMS/GBC/tetris.gbc", first),
            ("/sd/ROMS/GBC/tetris-rev2.gbc", second),
        ]);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].device_launches["deviceA"], 5);
        assert_eq!(games[0].device_launches["deviceB"], 1);
    }

    #[test]
    fn test_platform_rename_applied() {
        // Scenario D: mapped label canonicalized, unmapped passes through
        let games = aggregate(vec![
            ("/sd/ROMS/Ports/doom.sh", record("Doom", 100, 1)),
            ("/sd/ROMS/Atari Lynx/pong.lnx", record("Pong", 50, 1)),
        ]);

        assert_eq!(games[0].platform, "External - Ports");
        assert_eq!(games[1].platform, "Atari Lynx");
    }

    #[test]
    fn test_rename_merges_across_raw_labels() {
        // Two raw labels mapping to the same canonical platform share a
        // dedup key
        let games = aggregate(vec![
            ("/sd/ROMS/Symbian/snake.jar", record("Snake", 60, 2)),
            ("/sd/ROMS/Java J2ME/snake2.jar", record("Snake", 40, 1)),
        ]);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].platform, "Java J2ME");
        assert_eq!(games[0].total_time, 100);
    }

    #[test]
    fn test_older_start_time_does_not_override() {
        // Scenario E: 500 is not strictly greater than 1000
        let mut first = record("Zelda", 10, 1);
        first.start_time = 1000;
        first.last_session = 111;
        let mut second = record("Zelda", 10, 1);
        second.start_time = 500;
        second.last_session = 222;

        let games = aggregate(vec![
            ("/sd/ROMS/NES/zelda.nes", first),
            ("/sd/ROMS/NES/us/zelda.nes", second),
        ]);

        assert_eq!(games[0].start_time, 1000);
        assert_eq!(games[0].last_session, 111);
    }

    #[test]
    fn test_start_time_tie_is_order_dependent() {
        // Equal timestamps never update, so whichever record arrives
        // first keeps its last_session
        let mut a = record("Zelda", 10, 1);
        a.start_time = 1000;
        a.last_session = 111;
        let mut b = record("Zelda", 10, 1);
        b.start_time = 1000;
        b.last_session = 222;

        let forward = aggregate(vec![
            ("/sd/ROMS/NES/zelda.nes", a.clone()),
            ("/sd/ROMS/NES/us/zelda.nes", b.clone()),
        ]);
        let reversed = aggregate(vec![
            ("/sd/ROMS/NES/us/zelda.nes", b),
            ("/sd/ROMS/NES/zelda.nes", a),
        ]);

        assert_eq!(forward[0].last_session, 111);
        assert_eq!(reversed[0].last_session, 222);
    }

    #[test]
    fn test_single_record_avg_recomputed_not_inherited() {
        let mut r = record("Tetris", 100, 4);
        r.avg_time = 999.0;
        let games = aggregate(vec![("/sd/ROMS/GBC/tetris.gbc", r)]);
        assert!((games[0].avg_time - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_launches_avg_is_zero() {
        let games = aggregate(vec![("/sd/ROMS/GBC/tetris.gbc", record("Tetris", 100, 0))]);
        assert_eq!(games[0].avg_time, 0.0);
    }

    // ========== validation ==========

    #[test]
    fn test_negative_counter_fails_with_key() {
        let platforms = PlatformMap::default();
        let records = vec![(
            "/sd/ROMS/NES/mario.nes".to_string(),
            record("Super Mario Bros", -5, 1),
        )];
        let err = Aggregator::new(&platforms)
            .aggregate(&records, &NoCovers)
            .unwrap_err();
        assert!(err.to_string().contains("/sd/ROMS/NES/mario.nes"));
    }

    #[test]
    fn test_negative_counter_under_skipped_key_is_ignored() {
        // Key rejection happens before validation: a marker-less entry
        // contributes nothing, corrupt or not
        let games = aggregate(vec![
            ("/sd/saves/broken.json", record("Broken", -5, 1)),
            ("/sd/ROMS/NES/mario.nes", record("Super Mario Bros", 100, 2)),
        ]);
        assert_eq!(games.len(), 1);
    }

    // ========== ordering ==========

    #[test]
    fn test_sorted_by_total_time_descending() {
        let games = aggregate(vec![
            ("/sd/ROMS/NES/a.nes", record("A", 50, 1)),
            ("/sd/ROMS/NES/b.nes", record("B", 200, 1)),
            ("/sd/ROMS/NES/c.nes", record("C", 100, 1)),
        ]);

        let times: Vec<u64> = games.iter().map(|g| g.total_time).collect();
        assert_eq!(times, vec![200, 100, 50]);
    }

    #[test]
    fn test_sort_ties_keep_encounter_order() {
        let games = aggregate(vec![
            ("/sd/ROMS/NES/b.nes", record("B", 100, 1)),
            ("/sd/ROMS/NES/a.nes", record("A", 100, 1)),
            ("/sd/ROMS/NES/c.nes", record("C", 100, 1)),
        ]);

        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    // ========== aggregate-level properties ==========

    #[test]
    fn test_idempotent_merge_doubles_counters() {
        let mut base = record("Super Mario Bros", 100, 2);
        base.device_launches.insert("deviceA".into(), 3);

        let single = aggregate(vec![("/sd/ROMS/NES/mario.nes", base.clone())]);
        // Same values fed twice under distinct source keys with the same
        // game identity
        let doubled = aggregate(vec![
            ("/sd/ROMS/NES/mario.nes", base.clone()),
            ("/sd/ROMS/NES/copy/mario.nes", base),
        ]);

        assert_eq!(doubled.len(), 1);
        assert_eq!(doubled[0].total_time, single[0].total_time * 2);
        assert_eq!(doubled[0].launches, single[0].launches * 2);
        assert!((doubled[0].avg_time - single[0].avg_time).abs() < f64::EPSILON);
        assert_eq!(
            doubled[0].device_launches["deviceA"],
            single[0].device_launches["deviceA"] * 2
        );
    }

    #[test]
    fn test_order_invariance_of_merged_values() {
        let entries = vec![
            ("/sd/ROMS/NES/mario.nes", record("Super Mario Bros", 100, 2)),
            ("/sd/ROMS/GBC/tetris.gbc", record("Tetris", 300, 6)),
            (
                "/sd/ROMS/NES/us/mario.nes",
                record("Super Mario Bros", 50, 1),
            ),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();

        let forward = aggregate(entries);
        let backward = aggregate(reversed);

        let key = |games: &[GameSummary]| {
            let mut v: Vec<(String, String, u64, u64)> = games
                .iter()
                .map(|g| {
                    (
                        g.platform.clone(),
                        g.name.clone(),
                        g.total_time,
                        g.launches,
                    )
                })
                .collect();
            v.sort();
            v
        };
        assert_eq!(key(&forward), key(&backward));
    }

    #[test]
    fn test_dedup_keys_unique_in_output() {
        let games = aggregate(vec![
            ("/sd/ROMS/NES/mario.nes", record("Super Mario Bros", 100, 2)),
            (
                "/sd/ROMS/NES/a/mario.nes",
                record("Super Mario Bros", 10, 1),
            ),
            ("/sd/ROMS/GBC/mario.gbc", record("Super Mario Bros", 10, 1)),
            ("/sd/ROMS/NES/zelda.nes", record("Zelda", 10, 1)),
        ]);

        let mut keys: Vec<(String, String)> = games
            .iter()
            .map(|g| (g.platform.clone(), g.name.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), games.len());
    }

    #[test]
    fn test_sum_conservation_over_non_skipped_records() {
        let entries = vec![
            ("/sd/ROMS/NES/mario.nes", record("Super Mario Bros", 100, 2)),
            ("/sd/saves/skip.me", record("Skipped", 777, 7)),
            ("/sd/ROMS/GBC/tetris.gbc", record("Tetris", 300, 6)),
            (
                "/sd/ROMS/NES/us/mario.nes",
                record("Super Mario Bros", 50, 1),
            ),
        ];
        let expected: u64 = 100 + 300 + 50;

        let games = aggregate(entries);
        let total: u64 = games.iter().map(|g| g.total_time).sum();
        assert_eq!(total, expected);
    }

    // ========== cover probing ==========

    #[test]
    fn test_cover_probed_once_per_game_with_file_base_name() {
        let platforms = PlatformMap::default();
        let covers = RecordingCovers::new();
        let records = vec![
            (
                "/sd/ROMS/NES/mario.nes".to_string(),
                record("Super Mario Bros", 100, 2),
            ),
            (
                "/sd/ROMS/NES/us/mario2.nes".to_string(),
                record("Super Mario Bros", 50, 1),
            ),
        ];

        let games = Aggregator::new(&platforms)
            .aggregate(&records, &covers)
            .unwrap();

        // Merged entry never re-probes
        let probes = covers.probes.lock().unwrap();
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0], ("NES".to_string(), "mario".to_string()));
        assert!(games[0].cover.is_some());
    }
}
