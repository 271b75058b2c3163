mod config;
mod script;
mod session;

use clap::{Parser, Subcommand};
use glam::Vec3;
use scenery_common::{ContentBinding, ContentRef, ObjectSnapshot, RegionRect, ShapeKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use script::{Script, ScriptRunner};
use session::EditorSession;

#[derive(Parser)]
#[command(name = "scenery-cli", about = "Drive the scene editor's undo/redo history")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML session config
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective configuration
    Info,
    /// Run a built-in editing session with undo and redo
    Demo,
    /// Run a JSON editing script
    Run {
        /// Path to the script
        script: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("scenery-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("history: capacity={}", config.history.capacity);
            println!(
                "terrain: {}x{}, layers={}",
                config.terrain.width,
                config.terrain.height,
                config.terrain.layers.join(",")
            );
            if config.content.is_empty() {
                println!("content: any");
            } else {
                let refs: Vec<&str> = config.content.iter().map(ContentRef::as_str).collect();
                println!("content: {}", refs.join(","));
            }
        }
        Commands::Demo => {
            let mut session = EditorSession::new(&config)?;
            pollster::block_on(demo(&mut session))?;
            println!("Final: {}", session.summary());
        }
        Commands::Run { script } => {
            let script = Script::load(&script)?;
            println!("Running {} steps", script.steps.len());
            let mut runner = ScriptRunner::new(EditorSession::new(&config)?);
            pollster::block_on(runner.run(&script))?;
            let session = runner.into_session();
            println!("Final: {}", session.summary());
            if session.history.has_unsaved_changes() {
                println!("Unsaved changes: {}", session.history.change_count());
            }
        }
    }

    Ok(())
}

async fn demo(session: &mut EditorSession) -> anyhow::Result<()> {
    let oak = ContentBinding {
        content: ContentRef::parse("forest/oak")?,
        address: "packs/forest/oak".to_string(),
    };

    let tree = session.spawn(
        &ObjectSnapshot::prop("Oak", oak.clone()).with_position(Vec3::new(5.0, 0.0, 5.0)),
    )?;
    session.move_to(tree, Vec3::ZERO)?;
    println!("Placed and moved: {}", session.summary());

    let area = session.spawn(&ObjectSnapshot::prop("Meadow", oak).with_handles(
        ShapeKind::FreeformArea,
        vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)],
    ))?;
    session.add_handle(area, 3, Vec3::new(4.0, 0.0, 4.0))?;
    session.paint("grass", RegionRect::new(0, 0, 8, 8), 1.0)?;
    session.delete(tree)?;
    println!("Edited: {}", session.summary());

    while session.history.can_undo() {
        let outcome = session.undo().await?;
        println!("Undo {outcome:?}: {}", session.summary());
    }
    while session.history.can_redo() {
        let outcome = session.redo().await?;
        println!("Redo {outcome:?}: {}", session.summary());
    }

    session.save_completed(true);
    println!("Saved: {}", session.summary());
    Ok(())
}
