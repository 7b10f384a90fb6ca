use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::services::{
    loader, renderer, Aggregator, CatalogueCovers, CoverArtProvider, NoCovers, PlatformMap,
    PublishTarget,
};
use crate::types::{CollectionStats, GameSummary, Result};

/// muOS paths the tracker and catalogue live at on-device
const DEFAULT_PLAYTIME_FILE: &str = "/mnt/sdcard/MUOS/info/track/playtime_data.json";
const DEFAULT_CATALOGUE_DIR: &str = "/mnt/sdcard/MUOS/info/catalogue";
const DEFAULT_OUTPUT_FILE: &str = "/tmp/collection.html";

const DEFAULT_HOST: &str = "orion.artfaal.ru";
const DEFAULT_PORT: u16 = 22124;
const DEFAULT_USER: &str = "artfaal";
const DEFAULT_REMOTE_PATH: &str = "/var/docker/compose/retro/html/index.html";

/// Game collection page builder for muOS playtime data
#[derive(Parser)]
#[command(name = "retroshelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the collection HTML page (default)
    Build(BuildArgs),

    /// Show collection statistics
    Stats {
        /// Playtime data file
        #[arg(long, default_value = DEFAULT_PLAYTIME_FILE)]
        data: PathBuf,

        /// Platform map override file (JSON)
        #[arg(long)]
        platforms: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Playtime data file
    #[arg(long, default_value = DEFAULT_PLAYTIME_FILE)]
    data: PathBuf,

    /// Box-art catalogue directory
    #[arg(long, default_value = DEFAULT_CATALOGUE_DIR)]
    covers: PathBuf,

    /// Platform map override file (JSON)
    #[arg(long)]
    platforms: Option<PathBuf>,

    /// Output HTML file
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Skip cover art entirely
    #[arg(long)]
    no_covers: bool,

    /// Upload the page after building
    #[arg(short, long)]
    publish: bool,

    /// Remote host to publish to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Remote SSH port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Remote user
    #[arg(long, default_value = DEFAULT_USER)]
    user: String,

    /// Remote file path
    #[arg(long, default_value = DEFAULT_REMOTE_PATH)]
    remote_path: String,

    /// SSH identity file (staged with 0600 permissions before use)
    #[arg(long)]
    identity: Option<PathBuf>,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_PLAYTIME_FILE),
            covers: PathBuf::from(DEFAULT_CATALOGUE_DIR),
            platforms: None,
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            no_covers: false,
            publish: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            identity: None,
        }
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            None => run_build(BuildArgs::default()),
            Some(Commands::Build(args)) => run_build(args),
            Some(Commands::Stats {
                data,
                platforms,
                json,
            }) => run_stats(&data, platforms.as_deref(), json),
        }
    }
}

fn load_platforms(path: Option<&Path>) -> Result<PlatformMap> {
    match path {
        Some(p) => PlatformMap::from_file(p),
        None => Ok(PlatformMap::default()),
    }
}

fn aggregate_file(
    data: &Path,
    platforms: &PlatformMap,
    covers: &dyn CoverArtProvider,
) -> Result<Vec<GameSummary>> {
    let records = loader::load_records(data)?;
    Aggregator::new(platforms).aggregate(&records, covers)
}

fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    println!("Loading playtime data from {} ...", args.data.display());
    let platforms = load_platforms(args.platforms.as_deref())?;

    let covers: Box<dyn CoverArtProvider> = if args.no_covers {
        Box::new(NoCovers)
    } else {
        Box::new(CatalogueCovers::new(args.covers.clone()))
    };

    let games = aggregate_file(&args.data, &platforms, covers.as_ref())?;

    println!("Building HTML...");
    let html = renderer::render(&games);
    std::fs::write(&args.output, &html)?;

    println!(
        "Built collection: {} games -> {}",
        games.len(),
        args.output.display()
    );
    println!("File size: {:.1} MB", html.len() as f64 / 1024.0 / 1024.0);

    if args.publish {
        let target = PublishTarget {
            host: args.host,
            port: args.port,
            user: args.user,
            remote_path: args.remote_path,
            identity: args.identity,
        };
        println!("Publishing to {} ...", target.destination());
        target.publish(&args.output)?;
        println!("Published to {}", target.destination());
    }

    Ok(())
}

fn run_stats(data: &Path, platforms: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let platforms = load_platforms(platforms)?;
    let games = aggregate_file(data, &platforms, &NoCovers)?;
    let stats = CollectionStats::from_summaries(&games);

    if json {
        let doc = serde_json::json!({
            "stats": stats,
            "games": games,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Games played:   {}", stats.total_games);
    println!(
        "Total playtime: {}",
        renderer::format_time_full(stats.total_time)
    );
    println!("Total launches: {}", stats.total_launches);
    if let Some((platform, time)) = &stats.top_platform {
        println!(
            "Top platform:   {} ({})",
            platform,
            renderer::format_time_full(*time)
        );
    }

    println!();
    for game in &games {
        println!(
            "{:>9}  {:>4} runs  {} [{}]  last played {}",
            renderer::format_time(game.total_time),
            game.launches,
            game.name,
            game.platform_short,
            last_played(game.start_time),
        );
    }

    Ok(())
}

/// Format an epoch start_time as a local calendar date
fn last_played(start_time: i64) -> String {
    if start_time <= 0 {
        return "never".to_string();
    }
    chrono::DateTime::from_timestamp(start_time, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d")
                .to_string()
        })
        .unwrap_or_else(|| "never".to_string())
}
