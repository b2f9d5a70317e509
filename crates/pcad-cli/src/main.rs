//! PCAD command-line tool
//!
//! Creates, inspects and evaluates parametric documents from the shell.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pcad_cad::{Op, PartStudio, ResolvedKind, ResolvedOp};
use pcad_core::{Document, EngineConfig, Session};
use pcad_params::{ParamEnv, safe_evaluate};

#[derive(Parser)]
#[command(name = "pcad")]
#[command(about = "Parametric CAD document tool")]
struct Cli {
    /// Engine configuration file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty document
    New {
        /// Output file
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the parameters and feature tree of a document
    Inspect {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Evaluate an expression
    Eval {
        expression: String,

        /// Variable binding, repeatable
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, f64)>,
    },

    /// Show what would be sent to a geometry kernel
    Plan { file: PathBuf },
}

fn parse_var(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.trim().to_string(), value))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_ron(&content).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_document(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pcad_core::from_bytes(&bytes).with_context(|| format!("Failed to load {}", path.display()))
}

fn run(cli: Cli, config: EngineConfig, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::New { file, force } => {
            if file.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", file.display());
            }
            let session = Session::new(config);
            let bytes = pcad_core::to_bytes(session.document())?;
            std::fs::write(&file, bytes)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            tracing::info!("Created {}", file.display());
            writeln!(out, "Created {}", file.display())?;
        }
        Commands::Inspect { file, json } => {
            let doc = load_document(&file)?;
            if json {
                let value = inspect_json(&doc);
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                write_inspect(&doc, out)?;
            }
        }
        Commands::Eval { expression, vars } => {
            let vars: HashMap<String, f64> = vars.into_iter().collect();
            let value = safe_evaluate(&expression, &vars)
                .with_context(|| format!("Failed to evaluate '{}'", expression))?;
            writeln!(out, "{}", value)?;
        }
        Commands::Plan { file } => {
            let doc = load_document(&file)?;
            for studio in doc.part_studios() {
                writeln!(out, "{}", studio.name)?;
                for op in studio.rebuild_plan(&doc.params) {
                    writeln!(out, "  {}", describe_resolved(&op))?;
                }
            }
        }
    }

    Ok(())
}

fn write_params(env: &ParamEnv, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Parameters ({})", env.len())?;
    for p in env.iter() {
        let unit = p.unit.as_deref().unwrap_or("");
        match env.error(p.id) {
            Some(e) => writeln!(out, "  {} = {}  [error: {}]", p.name, p.expression, e)?,
            None => writeln!(out, "  {} = {}  -> {}{}", p.name, p.expression, p.value, unit)?,
        }
    }
    Ok(())
}

fn write_studio(studio: &PartStudio, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} ({} ops)", studio.name, studio.len())?;
    let cutoff = studio.effective_len();
    for (i, node) in studio.ops().enumerate() {
        let mut flags = Vec::new();
        if node.op.is_suppressed() {
            flags.push("suppressed");
        }
        if i >= cutoff {
            flags.push("rolled back");
        }
        if node.inputs().iter().any(|d| !studio.contains_op(*d)) {
            flags.push("dangling");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        writeln!(
            out,
            "  {}. {} {}{}",
            i + 1,
            node.op.type_name(),
            node.op.name(),
            flags
        )?;
        if let Op::Sketch { sketch_id, .. } = &node.op
            && let Some(sketch) = studio.sketch(*sketch_id)
        {
            writeln!(out, "     {} primitives", sketch.len())?;
        }
    }
    Ok(())
}

fn write_inspect(doc: &Document, out: &mut impl Write) -> Result<()> {
    write_params(&doc.params, out)?;
    for studio in doc.part_studios() {
        write_studio(studio, out)?;
    }
    Ok(())
}

fn inspect_json(doc: &Document) -> serde_json::Value {
    let params: Vec<_> = doc
        .params
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "expression": p.expression,
                "value": p.value,
                "unit": p.unit,
                "error": doc.params.error(p.id).map(|e| e.to_string()),
            })
        })
        .collect();

    let studios: Vec<_> = doc
        .part_studios()
        .map(|studio| {
            let ops: Vec<_> = studio
                .ops()
                .map(|node| {
                    serde_json::json!({
                        "id": node.op.id().to_string(),
                        "type": node.op.type_name(),
                        "name": node.op.name(),
                        "suppressed": node.op.is_suppressed(),
                        "deps": node.deps.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            serde_json::json!({
                "id": studio.id.to_string(),
                "name": studio.name,
                "timeline_position": studio.timeline_position(),
                "ops": ops,
            })
        })
        .collect();

    serde_json::json!({
        "parameters": params,
        "part_studios": studios,
    })
}

fn describe_resolved(op: &ResolvedOp) -> String {
    match &op.kind {
        ResolvedKind::Sketch {
            plane, primitives, ..
        } => format!("{}: sketch on {} ({} primitives)", op.name, plane.name, primitives.len()),
        ResolvedKind::Extrude {
            direction, depth, ..
        } => format!("{}: extrude {:?} {}", op.name, direction, depth),
        ResolvedKind::Revolve { axis, angle, .. } => format!(
            "{}: revolve {:.4} rad about {:?}",
            op.name, angle, axis.direction
        ),
        ResolvedKind::Fillet { edges, radius, .. } => {
            format!("{}: fillet {} edges r={}", op.name, edges.len(), radius)
        }
        ResolvedKind::Boolean { operation, .. } => {
            format!("{}: boolean {}", op.name, operation.name())
        }
    }
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut stdout = std::io::stdout().lock();
    run(cli, config, &mut stdout)
}
