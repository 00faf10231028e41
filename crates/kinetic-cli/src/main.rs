//! # Kinetic CLI
//!
//! Drives the animation engine headlessly.
//!
//! ## Commands
//! - `run`: Build a scene, play the intro and replay an input trace
//! - `intro`: Run the intro sequencer alone against a session file
//! - `list`: Print the effect and easing registry
//! - `check`: Validate a scene file

mod report;


use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kinetic_core::config::SceneConfig;
use kinetic_core::intro::{IntroPhase, IntroSequencer};
use kinetic_core::registry;
use kinetic_core::replay::{replay, Trace};
use kinetic_core::session::{FileSessionStore, MemorySessionStore, SessionStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Frame rate of the standalone intro run.
const INTRO_FRAME_RATE: f64 = 60.0;

/// Replay length when no trace is given: long enough for the default intro.
const IDLE_TRACE_SECONDS: f64 = 5.0;

#[derive(Parser)]
#[command(name = "kinetic")]
#[command(about = "Headless scroll and pointer animation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Listing {
    Effects,
    Easings,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a trace against a scene and print the final state
    Run {
        /// Scene description (.json)
        #[arg(short, long)]
        scene: PathBuf,

        /// Input trace (.json); the scene idles when absent
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Session file holding the intro flag; in-memory when absent
        #[arg(long)]
        session: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Run the intro sequencer and print its transitions
    Intro {
        /// Session file holding the intro flag; in-memory when absent
        #[arg(long)]
        session: Option<PathBuf>,

        /// Delete the session file first
        #[arg(long)]
        reset: bool,

        /// Number of letters in the name
        #[arg(short, long, default_value = "8")]
        letters: usize,
    },

    /// List registered effects or easings
    List {
        #[arg(value_enum, default_value = "effects")]
        what: Listing,
    },

    /// Validate a scene file
    Check {
        #[arg(short, long)]
        scene: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kinetic=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scene,
            trace,
            session,
            format,
        } => cmd_run(&scene, trace.as_deref(), session.as_deref(), format),
        Commands::Intro {
            session,
            reset,
            letters,
        } => cmd_intro(session.as_deref(), reset, letters),
        Commands::List { what } => cmd_list(what),
        Commands::Check { scene } => cmd_check(&scene),
    }
}

fn open_store(session: Option<&Path>) -> Box<dyn SessionStore> {
    match session {
        Some(path) => Box::new(FileSessionStore::new(path)),
        None => Box::new(MemorySessionStore::new()),
    }
}

fn load_scene(path: &Path) -> Result<SceneConfig> {
    let config = SceneConfig::from_path(path)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid scene {}", path.display()))?;
    Ok(config)
}

/// Build the scene, start the intro and replay the trace.
fn cmd_run(
    scene_path: &Path,
    trace_path: Option<&Path>,
    session: Option<&Path>,
    format: Format,
) -> Result<()> {
    let config = load_scene(scene_path)?;
    let trace = match trace_path {
        Some(path) => Trace::from_path(path)
            .with_context(|| format!("Failed to load trace {}", path.display()))?,
        None => Trace {
            frame_rate: 60.0,
            duration: Some(IDLE_TRACE_SECONDS),
            events: Vec::new(),
        },
    };

    let mut scene = config.build().context("Failed to build scene")?;
    info!(
        scene = %scene_path.display(),
        components = scene.components.len(),
        events = trace.events.len(),
        "scene ready"
    );
    if let Some(phase) = scene.begin_intro(open_store(session)) {
        info!(?phase, "intro started");
    }
    let result = replay(&mut scene, &trace).context("Replay failed")?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print!("{}", report::render_text(&result)),
    }
    Ok(())
}

/// Plays the intro alone at 60 Hz and prints each transition.
fn cmd_intro(session: Option<&Path>, reset: bool, letters: usize) -> Result<()> {
    if reset {
        if let Some(path) = session {
            FileSessionStore::new(path)
                .clear()
                .with_context(|| format!("Failed to reset session {}", path.display()))?;
        }
    }
    let mut store = open_store(session);
    let mut intro = IntroSequencer::new(letters);
    intro.begin(&*store);

    let step = 1.0 / INTRO_FRAME_RATE;
    let mut frame = 0u64;
    while !intro.is_done() {
        intro.advance(frame as f64 * step, &mut *store);
        frame += 1;
    }

    println!("Intro transitions:");
    println!("==================");
    println!("  {}", report::render_phases(intro.history()));
    if intro.phase() == IntroPhase::Complete {
        println!("  finished after {} frames", frame);
    } else {
        println!("  skipped: intro already played this session");
    }
    Ok(())
}

fn cmd_list(what: Listing) -> Result<()> {
    match what {
        Listing::Effects => {
            println!("Available Effects:");
            println!("==================");
            for effect in registry::list_effects() {
                println!(
                    "  • {} [{:?}] - {}",
                    effect.name, effect.driver, effect.description
                );
                println!("      writes: {}", effect.properties.join(", "));
                if !effect.params.is_empty() {
                    let params: Vec<String> = effect
                        .params
                        .iter()
                        .map(|(name, ty)| format!("{name}: {ty}"))
                        .collect();
                    println!("      params: {}", params.join(", "));
                }
            }
        }
        Listing::Easings => {
            println!("Available Easings:");
            println!("==================");
            for easing in registry::list_easings() {
                println!("  • {} - {}", easing.name, easing.description);
            }
        }
    }
    Ok(())
}

fn cmd_check(scene_path: &Path) -> Result<()> {
    let config = load_scene(scene_path)?;
    println!("✓ {}", scene_path.display());
    println!(
        "  {} elements, {} effects, intro: {}",
        config.elements.len(),
        config.effects.len(),
        if config.intro.is_some() { "yes" } else { "no" }
    );
    for entry in &config.effects {
        let gate = if entry.after_intro { " (after intro)" } else { "" };
        println!(
            "  • {}{} -> {}",
            entry.effect.kind(),
            gate,
            entry.effect.element_refs().join(", ")
        );
    }
    Ok(())
}
