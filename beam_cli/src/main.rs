//! # Vigas CLI
//!
//! Terminal front-end for the beam editor core: an editing session that
//! replaces the browser forms, SVG and 3D scene export, and the calculation
//! request against the external structural API.
//!
//! Logs go to stderr (`RUST_LOG`, default `beam_cli=info,beam_core=info`)
//! so stdout stays machine-readable.

mod calc_client;
mod repl;

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use beam_core::diagram::{AliasConfig, DiagramKind, DiagramOverlay, SeriesExtractor};
use beam_core::editing::{EditCommand, ModelStore};
use beam_core::file_io::{load_json, save_json};
use beam_core::render3d::{build_scene, SceneInput};
use beam_core::{
    Beam2DView, CalcEndpointConfig, CalcError, CalcResult, CalculationRequest, StructuralModel, Viewport,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use repl::Session;

#[derive(Parser, Debug)]
#[command(author, version, about = "Structural beam editor: edit, render and calculate")]
struct Args {
    /// Calculation API base URL (overrides ESTRUTURA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Calculation API path (overrides ESTRUTURA_API_PATH)
    #[arg(long, global = true)]
    api_path: Option<String>,

    /// JSON file with extra result-payload key aliases
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive (or scripted) editing session
    Edit {
        /// Read commands from a file instead of the terminal
        #[arg(long)]
        script: Option<PathBuf>,

        /// Start from an existing model file
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Apply a JSON array of edit commands to a model and print the result
    Apply {
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        commands: PathBuf,
    },

    /// Render the 2D elevation as SVG
    Svg {
        #[arg(long)]
        model: PathBuf,

        /// Calculation result payload (JSON)
        #[arg(long)]
        result: Option<PathBuf>,

        /// Show a diagram instead of loads: shear | moment
        #[arg(long)]
        diagram: Option<DiagramKind>,

        #[arg(long, default_value_t = 800.0)]
        width: f64,

        #[arg(long, default_value_t = 300.0)]
        height: f64,

        /// Write the SVG here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dump the 3D scene graph as JSON
    Scene {
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        result: Option<PathBuf>,

        #[arg(long)]
        diagram: Option<DiagramKind>,

        /// Print node and resource counts only
        #[arg(long)]
        stats: bool,
    },

    /// Post the structure to the calculation endpoint
    Calc {
        #[arg(long)]
        model: PathBuf,

        /// Save the result payload here
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beam_cli=info,beam_core=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> CalcResult<()> {
    let extractor = match &args.aliases {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
            SeriesExtractor::new(AliasConfig::from_json(&json)?)
        }
        None => SeriesExtractor::default(),
    };
    let endpoint = CalcEndpointConfig::from_env()
        .with_base_url(args.api_url)
        .with_path(args.api_path);

    match args.command {
        Command::Edit { script, model } => edit(script.as_deref(), model.as_deref()),
        Command::Apply { model, commands } => apply(&model, &commands),
        Command::Svg { model, result, diagram, width, height, out } => {
            let model: StructuralModel = load_json(&model)?;
            let overlay = overlay_for(&model, result.as_deref(), diagram, &extractor)?;
            let mut view = Beam2DView::new(&model, Viewport::new(width, height));
            if diagram.is_some() {
                view = view.with_diagram(overlay.as_ref());
            }
            let svg = view.render()?;
            match out {
                Some(path) => {
                    fs::write(&path, svg)
                        .map_err(|e| CalcError::file_error("write", path.display().to_string(), e.to_string()))?;
                    info!(path = %path.display(), "SVG written");
                }
                None => println!("{}", svg),
            }
            Ok(())
        }
        Command::Scene { model, result, diagram, stats } => {
            let model: StructuralModel = load_json(&model)?;
            let overlay = overlay_for(&model, result.as_deref(), diagram, &extractor)?;
            let input = match diagram {
                Some(_) => SceneInput::diagram(&model, overlay.as_ref()),
                None => SceneInput::loads(&model),
            };
            let scene = build_scene(&input);
            let json = if stats {
                serde_json::to_string_pretty(&scene.stats())?
            } else {
                serde_json::to_string_pretty(&scene)?
            };
            println!("{}", json);
            Ok(())
        }
        Command::Calc { model, out } => {
            let model: StructuralModel = load_json(&model)?;
            let request = CalculationRequest::from_model(&model)?;
            let payload = calc_client::post_calculation(&endpoint, &request)?;
            match out {
                Some(path) => {
                    save_json(&payload, &path)?;
                    info!(path = %path.display(), "result saved");
                }
                None => println!("{}", serde_json::to_string_pretty(&payload)?),
            }
            Ok(())
        }
    }
}

fn edit(script: Option<&Path>, model: Option<&Path>) -> CalcResult<()> {
    let store = match model {
        Some(path) => ModelStore::with_model(load_json(path)?),
        None => ModelStore::new(),
    };

    let io_error = |e: io::Error| CalcError::Internal { message: format!("session I/O failed: {}", e) };
    let stdout = io::stdout();

    match script {
        Some(path) => {
            let file = fs::File::open(path)
                .map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;
            let mut session = Session::new(store, false);
            session.run(io::BufReader::new(file), stdout.lock()).map_err(io_error)?;
            debug!(version = session.store().version(), "script finished");
        }
        None => {
            let interactive = io::stdin().is_terminal();
            if interactive {
                println!("Vigas - structural beam editor");
                println!("==============================");
                println!("{}", repl::HELP);
                println!();
            }
            let mut session = Session::new(store, interactive);
            session.run(io::stdin().lock(), stdout.lock()).map_err(io_error)?;
        }
    }
    Ok(())
}

fn apply(model: &Path, commands: &Path) -> CalcResult<()> {
    let mut store = ModelStore::with_model(load_json(model)?);
    let commands: Vec<EditCommand> = load_json(commands)?;

    for (index, command) in commands.iter().enumerate() {
        store.apply(command).map_err(|e| {
            eprintln!("command #{} ({}) rejected", index + 1, command.name());
            e
        })?;
    }

    println!("{}", serde_json::to_string_pretty(store.model())?);
    Ok(())
}

/// Overlay for `--diagram`, or `None` when there is nothing to show
fn overlay_for(
    model: &StructuralModel,
    result: Option<&Path>,
    diagram: Option<DiagramKind>,
    extractor: &SeriesExtractor,
) -> CalcResult<Option<DiagramOverlay>> {
    let (Some(kind), Some(path)) = (diagram, result) else {
        return Ok(None);
    };
    let payload: Value = load_json(path)?;
    let overlay = DiagramOverlay::build(model, &payload, kind, extractor);
    if overlay.is_empty() {
        info!(%kind, "no diagram data found in result payload");
    }
    Ok(Some(overlay))
}
