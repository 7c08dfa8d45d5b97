//! lamco-display-manager - Display configuration inspector
//!
//! Entry point for the command line tool. Builds a display manager from the
//! configuration, brings up the requested displays, optionally replays a
//! hardware change, and prints the resulting layout.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_display_manager::config::Config;
use lamco_display_manager::display::{
    parse_display_specs, Display, DisplayId, DisplayIdAllocator, Rect,
};
use lamco_display_manager::multimon::{
    virtual_desktop_bounds, DisplayEvent, DisplayManager, EventRecorder, SecondDisplayMode,
};
use lamco_display_manager::utils::format_user_error;

/// Command-line arguments for lamco-display-manager
#[derive(Parser, Debug)]
#[command(name = "lamco-display-manager")]
#[command(version, about = "Display configuration manager", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "LAMCO_DISPLAY_CONFIG")]
    pub config: Option<String>,

    /// Displays to start with, as a comma-separated spec list
    /// (e.g. "1920x1080,1920+0-1280x1024*2/r")
    #[arg(short, long, env = "LAMCO_DISPLAYS")]
    pub displays: Option<String>,

    /// Replay a hardware report after startup. Entries keep the ids of the
    /// startup displays in order; displays sharing a native origin are
    /// treated as hardware mirrors.
    #[arg(short, long)]
    pub update: Option<String>,

    /// Second display mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Id of the built-in display
    #[arg(long)]
    pub internal_display_id: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the configuration, including the resulting layouts, to a file
    #[arg(long)]
    pub save_config: Option<String>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<String>,
}

/// Second display mode as accepted on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Extend the desktop
    Extended,
    /// Mirror the first display
    Mirroring,
    /// Host a virtual keyboard on the second display
    VirtualKeyboard,
}

impl From<ModeArg> for SecondDisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Extended => SecondDisplayMode::Extended,
            ModeArg::Mirroring => SecondDisplayMode::Mirroring,
            ModeArg::VirtualKeyboard => SecondDisplayMode::VirtualKeyboard,
        }
    }
}

/// What gets printed at the end
#[derive(Serialize)]
struct Report<'a> {
    displays: &'a [Display],
    primary_display_id: Option<DisplayId>,
    virtual_desktop: Rect,
    second_display_mode: SecondDisplayMode,
    mirrored_display_id: Option<DisplayId>,
    non_desktop_display_id: Option<DisplayId>,
    events: Vec<DisplayEvent>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path).inspect_err(|e| eprintln!("{}", format_user_error(e)))?,
        None => Config::default_config(),
    };

    // Override config with CLI args
    let config = config.with_overrides(
        args.displays.clone(),
        args.mode.map(SecondDisplayMode::from),
        args.internal_display_id,
    );

    let _log_guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-display-manager v{}", env!("CARGO_PKG_VERSION"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = run(&args, &config) {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    Ok(())
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let mut manager = config.build_display_manager()?;

    let recorder = Arc::new(EventRecorder::new());
    manager.add_observer(recorder.clone());
    manager.set_delegate(Some(recorder.clone()));

    manager.init_from_spec(&config.bootstrap.displays);
    info!("Started with {} display(s)", manager.num_displays());

    if let Some(update) = &args.update {
        let mut ids = DisplayIdAllocator::default();
        let report =
            parse_display_specs(update, &mut ids).context("Invalid --update display list")?;
        info!("Replaying hardware report with {} display(s)", report.len());
        recorder.take();
        manager.on_native_displays_changed(report);
    }

    if let Some(path) = &args.save_config {
        let mut saved = config.clone();
        saved.capture_layouts(manager.layout_store());
        saved.save(path)?;
        info!("Saved configuration with {} layout(s) to {}", saved.layouts.len(), path);
    }

    let events = recorder.take();
    if args.json {
        print_json(&manager, events)
    } else {
        print_table(&manager, &events);
        Ok(())
    }
}

fn print_json(manager: &DisplayManager, events: Vec<DisplayEvent>) -> Result<()> {
    let report = Report {
        displays: manager.displays(),
        primary_display_id: manager.primary_display().map(Display::id),
        virtual_desktop: virtual_desktop_bounds(manager.displays()),
        second_display_mode: manager.second_display_mode(),
        mirrored_display_id: manager.mirrored_display_id(),
        non_desktop_display_id: manager.non_desktop_display_id(),
        events,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_table(manager: &DisplayManager, events: &[DisplayEvent]) {
    let primary = manager.primary_display().map(Display::id);

    println!(
        "{:<12} {:>7} {:>7} {:>7} {:>7} {:>6} {:>4}  WORK AREA",
        "ID", "X", "Y", "WIDTH", "HEIGHT", "SCALE", "ROT"
    );
    for display in manager.displays() {
        let bounds = display.bounds();
        println!(
            "{:<12} {:>7} {:>7} {:>7} {:>7} {:>6} {:>4}  {}{}",
            display.id().to_string(),
            bounds.x(),
            bounds.y(),
            bounds.width(),
            bounds.height(),
            display.device_scale_factor(),
            display.rotation().degrees(),
            display.work_area(),
            if Some(display.id()) == primary { "  (primary)" } else { "" }
        );
    }

    println!();
    println!("Virtual desktop: {}", virtual_desktop_bounds(manager.displays()));
    println!("Mode: {:?}", manager.second_display_mode());
    if let Some(id) = manager.mirrored_display_id() {
        println!("Mirrored display: {}", id);
    }
    if let Some(id) = manager.non_desktop_display_id() {
        println!("Non-desktop display: {}", id);
    }

    if !events.is_empty() {
        println!();
        println!("Events:");
        for event in events {
            println!("  {:?}", event);
        }
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let log_format = args.log_format.as_deref().unwrap_or(config.logging.format.as_str());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lamco={},warn", log_level))
    });

    // If log file is specified, write to both stderr and file
    if let Some(log_file_path) = &args.log_file {
        let file = std::fs::File::create(log_file_path)
            .context(format!("Failed to create log file: {}", log_file_path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        match log_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                    .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
        Ok(Some(guard))
    } else {
        // Stderr only, stdout carries the report
        match log_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
        }
        Ok(None)
    }
}
