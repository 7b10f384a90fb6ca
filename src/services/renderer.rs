//! Static HTML collection page renderer
//!
//! Produces a single self-contained page: hero stats, per-platform
//! filter buttons and one card per game. Cover art is inlined as base64
//! data URIs so the page has no external asset dependencies; encoding
//! runs in parallel across cards.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rayon::prelude::*;
use std::collections::HashMap;

use crate::types::{CollectionStats, CoverArt, GameSummary};

/// Short duration label for card stats ("45s", "12m", "3h 22m")
pub fn format_time(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Long duration label for the hero ("3 hr 22 min", "12 min")
pub fn format_time_full(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{} hr {} min", hours, mins)
    } else {
        format!("{} min", mins)
    }
}

/// Escape text for interpolation into HTML content and attributes
fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shorten tracker device identifiers for the card tags
fn device_label(device: &str) -> String {
    device.replace("rg40xx-v", "RG40").replace("rg35xx-pro", "RG30")
}

/// Read and base64-encode a cover image. Unreadable files degrade to the
/// no-art placeholder.
fn encode_cover(cover: &CoverArt) -> Option<String> {
    match std::fs::read(&cover.path) {
        Ok(bytes) => Some(STANDARD.encode(bytes)),
        Err(e) => {
            eprintln!(
                "[retroshelf] Warning: failed to read cover {:?}: {}",
                cover.path, e
            );
            None
        }
    }
}

/// Per-platform playtime in first-seen order, for the filter button row
fn platform_times(games: &[GameSummary]) -> Vec<(String, u64)> {
    let mut order: Vec<String> = Vec::new();
    let mut times: HashMap<String, u64> = HashMap::new();
    for game in games {
        if !times.contains_key(&game.platform) {
            order.push(game.platform.clone());
        }
        *times.entry(game.platform.clone()).or_insert(0) += game.total_time;
    }
    let mut result: Vec<(String, u64)> = order
        .into_iter()
        .map(|p| {
            let t = times[&p];
            (p, t)
        })
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

fn render_card(game: &GameSummary, cover_b64: Option<&str>) -> String {
    let name = html_escape(&game.name);

    let img = match cover_b64 {
        Some(b64) => format!(r#"<img src="data:image/png;base64,{}" alt="{}" />"#, b64, name),
        None => {
            let initial = game.name.chars().next().unwrap_or('?');
            format!(
                r#"<div class="no-art"><span>{}</span></div>"#,
                html_escape(&initial.to_string())
            )
        }
    };

    let mut devices = String::new();
    for (device, count) in &game.device_launches {
        devices.push_str(&format!(
            r#"<span class="device-tag">{}: {}</span>"#,
            html_escape(&device_label(device)),
            count
        ));
    }

    format!(
        r#"
        <div class="game-card" data-system="{platform}" data-time="{total_time}">
            <div class="card-art">{img}</div>
            <div class="card-info">
                <div class="card-name" title="{name}">{name}</div>
                <span class="system-badge" style="background:{color}">{short}</span>
                <div class="card-stats">
                    <div class="stat">
                        <span class="stat-val">{time}</span>
                        <span class="stat-label">played</span>
                    </div>
                    <div class="stat">
                        <span class="stat-val">{launches}</span>
                        <span class="stat-label">runs</span>
                    </div>
                    <div class="stat">
                        <span class="stat-val">{avg}</span>
                        <span class="stat-label">avg</span>
                    </div>
                </div>
                <div class="card-devices">{devices}</div>
            </div>
        </div>"#,
        platform = html_escape(&game.platform),
        total_time = game.total_time,
        img = img,
        name = name,
        color = game.platform_color,
        short = html_escape(&game.platform_short),
        time = format_time(game.total_time),
        launches = game.launches,
        avg = format_time(game.avg_time as u64),
        devices = devices,
    )
}

/// Render the full collection page
pub fn render(games: &[GameSummary]) -> String {
    let stats = CollectionStats::from_summaries(games);

    // Covers are the heavy part of the page; encode them in parallel
    let covers: Vec<Option<String>> = games
        .par_iter()
        .map(|g| g.cover.as_ref().and_then(encode_cover))
        .collect();

    let mut cards = String::new();
    for (game, cover) in games.iter().zip(&covers) {
        cards.push_str(&render_card(game, cover.as_deref()));
    }

    // Display metadata is carried per game; index it by platform for the
    // button row and the hero
    let display: HashMap<&str, (&str, &str)> = games
        .iter()
        .map(|g| {
            (
                g.platform.as_str(),
                (g.platform_short.as_str(), g.platform_color.as_str()),
            )
        })
        .collect();

    let mut buttons =
        String::from(r#"<button class="filter-btn active" data-filter="all">All</button>"#);
    for (platform, _) in platform_times(games) {
        let (short, color) = display
            .get(platform.as_str())
            .copied()
            .unwrap_or((platform.as_str(), "#666"));
        let count = games.iter().filter(|g| g.platform == platform).count();
        buttons.push_str(&format!(
            r#"<button class="filter-btn" data-filter="{}" style="--btn-color:{}">{} ({})</button>"#,
            html_escape(&platform),
            color,
            html_escape(short),
            count
        ));
    }

    let top_platform = stats
        .top_platform
        .as_ref()
        .map(|(platform, _)| {
            display
                .get(platform.as_str())
                .map(|(short, _)| (*short).to_string())
                .unwrap_or_else(|| platform.clone())
        })
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        include_str!("page_template.html"),
        total_games = stats.total_games,
        total_time = format_time_full(stats.total_time),
        total_launches = stats.total_launches,
        top_platform = html_escape(&top_platform),
        buttons = buttons,
        cards = cards,
    )
}
