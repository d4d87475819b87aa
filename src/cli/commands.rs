//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::PathBuf;

use anyhow::Result;
use log::info;

use super::{excerpt, RecipeArgs};
use crate::config::RenderConfig;
use crate::error::StemweaveError;
use crate::plan::ExecutionPlan;
use crate::recipe::{parse, ActionName, RecipeDocument};
use crate::render::{compile, Renderer};
use crate::stems::{Stem, StemDirectory};

/// Options for the render command
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub stems: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub bit_depth: Option<u16>,
    pub normalize: bool,
    pub report: Option<PathBuf>,
}

/// Print the caret excerpt for syntax errors before handing the error up
fn with_excerpt(text: &str, err: StemweaveError) -> anyhow::Error {
    if let StemweaveError::Syntax(syntax) = &err {
        if let Some(snippet) = excerpt(text, syntax.span) {
            eprintln!("{}", snippet);
        }
    }
    err.into()
}

fn compile_recipe(text: &str) -> Result<ExecutionPlan> {
    compile(text).map_err(|e| with_excerpt(text, e))
}

/// Parse and validate a recipe, printing the plan.
pub fn check(recipe: &RecipeArgs) -> Result<()> {
    let text = recipe.load()?;
    let plan = compile_recipe(&text)?;

    println!("Recipe OK: {} statements", plan.len());
    println!("{:-<60}", "");
    for statement in &plan.statements {
        let actions: Vec<&str> = statement.actions.iter().map(|a| a.keyword()).collect();
        let chain = if actions.is_empty() {
            String::from("(unchanged)")
        } else {
            actions.join(" -> ")
        };
        println!(
            "{:>3}  {:<22} {:<32} {}",
            statement.index,
            statement.source.to_string(),
            chain,
            statement.sink
        );
    }
    println!("{:-<60}", "");

    let stems: Vec<&str> = plan.required_stems().iter().map(|s| s.name()).collect();
    println!("Stems used: {}", stems.join(", "));
    println!("Saved: {}", plan.retained.join(", "));

    let dead = plan.dead_sinks();
    if !dead.is_empty() {
        println!("Unused sinks: {}", dead.join(", "));
    }

    Ok(())
}

/// Print the canonical form of a recipe.
pub fn fmt(recipe: &RecipeArgs) -> Result<()> {
    let text = recipe.load()?;
    let document: RecipeDocument = parse(&text)
        .map_err(|e| with_excerpt(&text, StemweaveError::from(e)))?;
    print!("{}", document);
    Ok(())
}

/// Render a recipe against a stem directory.
pub fn render(recipe: &RecipeArgs, args: &RenderArgs) -> Result<()> {
    let text = recipe.load()?;
    let plan = compile_recipe(&text)?;

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(bit_depth) = args.bit_depth {
        config.bit_depth = bit_depth;
    }
    if args.normalize {
        config.normalize = true;
    }

    let separator = StemDirectory::new().only(plan.required_stems());
    let renderer = Renderer::new(separator, config)?;

    info!("Rendering {} -> {}", args.stems.display(), args.output.display());
    let report = renderer.render_to_file(&text, &args.stems, &args.output)?;

    println!("Rendered: {}", args.output.display());
    println!("  Mixed: {}", report.retained.join(", "));
    println!(
        "  Length: {:.2}s @ {} Hz, {} channel(s)",
        report.duration_secs, report.sample_rate, report.channels
    );
    if report.normalization_gain < 1.0 {
        println!("  Normalized by {:.3}x", report.normalization_gain);
    }
    println!("  SHA-256: {}", report.checksum);

    if let Some(path) = &args.report {
        report.save(path)?;
        println!("Report: {}", path.display());
    }

    Ok(())
}

/// List the action vocabulary and stem names.
pub fn actions() -> Result<()> {
    println!("Actions:");
    for action in ActionName::ALL {
        println!("  {:<12} {}", action.keyword(), action.description());
    }
    println!();

    let stems: Vec<&str> = Stem::ALL.iter().map(|s| s.name()).collect();
    println!("Stems: {}", stems.join(", "));
    println!("Sinks: <name> (temporary), save(<name>) (mixed), drop (discarded)");

    Ok(())
}
