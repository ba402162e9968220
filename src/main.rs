//! FreeKeys - play, record and convert keyboard performances over MIDI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freekeys::config::{AppConfig, KeymapWatcher};
use freekeys::keymap;
use freekeys::output::{self, ConsoleOutput, PortOutput};
use freekeys::paths::AppPaths;
use freekeys::song;
use freekeys::{EngineHandle, EngineHost, EventEngine};

/// FreeKeys - keyboard-to-MIDI performance engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (detected when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available MIDI ports
    Ports,

    /// Parse a keymap and report skipped lines
    Check {
        map: PathBuf,
        /// Print the keymap as it would be saved
        #[arg(long)]
        print: bool,
    },

    /// Show song metadata
    Info {
        song: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Convert a .lyt or older .fpm song into a current .fpm file
    Convert { input: PathBuf, output: PathBuf },

    /// Play a song to a MIDI output port (printed when no port is given)
    Play {
        song: PathBuf,
        #[arg(short, long)]
        port: Option<String>,
        /// Playback speed factor (engine.play_speed from config when omitted)
        #[arg(short, long)]
        speed: Option<f64>,
    },

    /// Route MIDI input through the keymap to the output port
    Live {
        /// Save a recording of the session to this file on exit
        #[arg(short, long)]
        record: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    match args.command {
        Command::Ports => output::print_ports(),
        Command::Check { map, print } => check_keymap(&map, print),
        Command::Info { song, json } => show_info(&song, json),
        Command::Convert { input, output } => convert_song(&input, &output),
        Command::Play { song, port, speed } => {
            let config = load_config(args.config.as_deref()).await?;
            play_song(&config, &song, port, speed).await
        }
        Command::Live { record } => {
            let (config, config_path) = match args.config {
                Some(path) => (AppConfig::load(&path).await?, path),
                None => {
                    let paths = AppPaths::detect();
                    paths.ensure_directories()?;
                    let config = load_config(Some(paths.config.as_path())).await?;
                    let config = AppConfig {
                        keymap: config.keymap.or_else(|| Some(paths.default_keymap())),
                        ..config
                    };
                    (config, paths.config)
                }
            };
            run_live(&config, &config_path, record).await
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist
async fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) if path.exists() => {
            info!("Configuration file: {}", path.display());
            AppConfig::load(path).await
        }
        _ => Ok(AppConfig::default()),
    }
}

fn check_keymap(path: &Path, print: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keymap: {}", path.display()))?;
    let (store, report) = keymap::parse(&text);

    println!(
        "{} version {}, {} lines, {} applied, {} groups",
        path.display().to_string().bold(),
        report.version,
        report.lines,
        report.applied,
        store.group_count()
    );
    for skipped in &report.skipped {
        println!("  {} {:>4}: {}", "skipped".yellow(), skipped.line, skipped.text);
    }
    if report.is_clean() {
        println!("{}", "OK".green());
    }

    if print {
        print!("{}", keymap::serialize(&store));
    }
    Ok(())
}

fn show_info(path: &Path, json: bool) -> Result<()> {
    let song = song::open(path, song::DEFAULT_MAX_EVENTS)
        .with_context(|| format!("Failed to open song: {}", path.display()))?;

    if json {
        let value = serde_json::json!({
            "info": song.info,
            "events": song.len(),
            "length_ms": song.length_ms(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let info = &song.info;
    println!("{:<10} {}", "title".dimmed(), info.title);
    println!("{:<10} {}", "author".dimmed(), info.author);
    println!("{:<10} {}", "comment".dimmed(), info.comment);
    println!("{:<10} {}", "version".dimmed(), info.version);
    println!("{:<10} {}", "events".dimmed(), song.len());
    println!("{:<10} {:.1}s", "length".dimmed(), song.length_ms() / 1000.0);
    if !info.compatible {
        println!("{}", "uses obsolete settings, playback may differ".yellow());
    }
    Ok(())
}

fn convert_song(input: &Path, output: &Path) -> Result<()> {
    let song = song::open(input, song::DEFAULT_MAX_EVENTS)
        .with_context(|| format!("Failed to open song: {}", input.display()))?;
    song::save(output, &song).with_context(|| format!("Failed to save song: {}", output.display()))?;
    println!("{} -> {} ({} events)", input.display(), output.display(), song.len());
    Ok(())
}

async fn play_song(config: &AppConfig, path: &Path, port: Option<String>, speed: Option<f64>) -> Result<()> {
    let speed = speed.unwrap_or(config.engine.play_speed);
    let song = song::open(path, config.engine.max_events)
        .with_context(|| format!("Failed to open song: {}", path.display()))?;
    let port = port.or_else(|| config.midi.output_port.clone());
    let tick = Duration::from_millis(config.engine.tick_ms);

    match port {
        Some(pattern) => {
            let host = PortOutput::connect(&pattern)?;
            playback(EventEngine::new(host, config.engine.options()), song, speed, tick).await
        }
        None => {
            let host = ConsoleOutput::default();
            playback(EventEngine::new(host, config.engine.options()), song, speed, tick).await
        }
    }
}

async fn playback<H: EngineHost + 'static>(
    engine: EventEngine<H>,
    song: song::Song,
    speed: f64,
    tick: Duration,
) -> Result<()> {
    let engine = engine.into_handle();
    {
        let mut engine = engine.lock();
        engine.set_song(song);
        engine.start_playback();
        engine.set_play_speed(speed);
        info!("Playing {:.1}s at x{}", engine.length_ms() / 1000.0, engine.play_speed());
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(tick);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let mut engine = engine.lock();
                engine.update(now.duration_since(last).as_secs_f64() * 1000.0);
                last = now;
                if !engine.is_playing() {
                    break;
                }
            }
            _ = &mut shutdown => {
                engine.lock().stop_playback();
                break;
            }
        }
    }

    info!("Playback finished");
    Ok(())
}

async fn run_live(config: &AppConfig, config_path: &Path, record: Option<PathBuf>) -> Result<()> {
    match config.midi.output_port.as_deref() {
        Some(pattern) => {
            let host = PortOutput::connect(pattern)?;
            live(EventEngine::new(host, config.engine.options()), config, config_path, record).await
        }
        None => {
            warn!("No MIDI output port configured, printing messages");
            let host = ConsoleOutput::default();
            live(EventEngine::new(host, config.engine.options()), config, config_path, record).await
        }
    }
}

async fn live<H: EngineHost + 'static>(
    engine: EventEngine<H>,
    config: &AppConfig,
    config_path: &Path,
    record: Option<PathBuf>,
) -> Result<()> {
    let engine: EngineHandle<H> = engine.into_handle();

    let mut watcher = match config.keymap_path(config_path) {
        Some(path) => {
            let (watcher, text) = KeymapWatcher::new(path).await?;
            apply_keymap(&engine, &text);
            Some(watcher)
        }
        None => {
            apply_keymap(&engine, keymap::DEFAULT_KEYMAP);
            None
        }
    };

    let _input = match config.midi.input_port.as_deref() {
        Some(pattern) => Some(output::connect_input(pattern, engine.clone())?),
        None => {
            warn!("No MIDI input port configured");
            None
        }
    };

    if record.is_some() {
        engine.lock().start_record();
    }

    info!("Live mode running, press Ctrl+C to exit");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(Duration::from_millis(config.engine.tick_ms));
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                engine.lock().update(now.duration_since(last).as_secs_f64() * 1000.0);
                last = now;
            }
            Some(text) = next_keymap(&mut watcher) => {
                apply_keymap(&engine, &text);
            }
            _ = &mut shutdown => break,
        }
    }

    let mut engine = engine.lock();
    engine.stop_record();
    if let Some(path) = record {
        match engine.save_song(&path) {
            Ok(()) => println!("Recording saved to {}", path.display()),
            Err(e) => warn!("Recording not saved: {}", e),
        }
    }
    Ok(())
}

async fn next_keymap(watcher: &mut Option<KeymapWatcher>) -> Option<String> {
    match watcher {
        Some(watcher) => watcher.next_keymap().await,
        None => std::future::pending().await,
    }
}

fn apply_keymap<H: EngineHost>(engine: &EngineHandle<H>, text: &str) {
    let report = engine.lock().load_keymap(text);
    for skipped in &report.skipped {
        warn!("Keymap line {} skipped: {}", skipped.line, skipped.text);
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
