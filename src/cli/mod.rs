//! CLI Module
//!
//! Command-line interface for compiling and rendering stem recipes.

pub mod commands;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::error::StemweaveError;
use crate::recipe::Span;

/// Stemweave - rearrange separated stems with a recipe
#[derive(Parser, Debug)]
#[command(name = "stemweave-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a recipe, then print its plan
    #[command(name = "check")]
    Check {
        #[command(flatten)]
        recipe: RecipeArgs,
    },

    /// Print a recipe in canonical form
    #[command(name = "fmt")]
    Fmt {
        #[command(flatten)]
        recipe: RecipeArgs,
    },

    /// Render a recipe against a directory of stems
    #[command(name = "render")]
    Render {
        /// Directory holding <stem>.wav files
        #[arg(short, long)]
        stems: PathBuf,

        #[command(flatten)]
        recipe: RecipeArgs,

        /// Output WAV file
        output: PathBuf,

        /// JSON render configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output bit depth (16, 24 or 32)
        #[arg(long)]
        bit_depth: Option<u16>,

        /// Scale the mix down if it would clip
        #[arg(long)]
        normalize: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List the recipe actions
    #[command(name = "actions")]
    Actions,
}

/// Where the recipe text comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RecipeArgs {
    /// Recipe text
    #[arg(short, long)]
    pub recipe: Option<String>,

    /// File containing the recipe
    #[arg(short = 'f', long)]
    pub recipe_file: Option<PathBuf>,
}

impl RecipeArgs {
    pub fn load(&self) -> anyhow::Result<String> {
        match (&self.recipe, &self.recipe_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read recipe file {}", path.display())),
            (None, None) => anyhow::bail!("either --recipe or --recipe-file is required"),
        }
    }
}

/// Process exit code for a failed command
///
/// 2 for recipe errors, 3 for failures while rendering, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StemweaveError>() {
        Some(e) if e.is_recipe_error() => 2,
        Some(StemweaveError::Runtime(_)) => 3,
        _ => 1,
    }
}

/// The recipe line containing `span` with a caret under the column
pub fn excerpt(text: &str, span: Span) -> Option<String> {
    let line = text.lines().nth(span.line.checked_sub(1)?)?;
    let pad = " ".repeat(span.column.saturating_sub(1));
    Some(format!("{:>4} | {}\n     | {}^", span.line, line, pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RuntimeError, SemanticError};

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recipe_sources_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "stemweave-cli",
            "check",
            "--recipe",
            "vocals -> save(v);",
            "--recipe-file",
            "r.txt",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["stemweave-cli", "fmt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_render_arguments() {
        let cli = Cli::try_parse_from([
            "stemweave-cli",
            "render",
            "--stems",
            "out/song",
            "-r",
            "vocals -> save(v);",
            "mix.wav",
            "--bit-depth",
            "16",
            "--normalize",
        ])
        .unwrap();

        match cli.command {
            Commands::Render {
                stems,
                output,
                bit_depth,
                normalize,
                ..
            } => {
                assert_eq!(stems, PathBuf::from("out/song"));
                assert_eq!(output, PathBuf::from("mix.wav"));
                assert_eq!(bit_depth, Some(16));
                assert!(normalize);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes() {
        let recipe = anyhow::Error::from(StemweaveError::from(SemanticError::EmptyOutput));
        assert_eq!(exit_code(&recipe), 2);

        let runtime = anyhow::Error::from(StemweaveError::from(RuntimeError::NothingToMix));
        assert_eq!(exit_code(&runtime), 3);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(exit_code(&other), 1);
    }

    #[test]
    fn test_excerpt_points_at_column() {
        let text = "vocals -> save(v);\nbass -> -> x;";
        let span = Span {
            offset: 27,
            line: 2,
            column: 9,
        };
        assert_eq!(
            excerpt(text, span).unwrap(),
            "   2 | bass -> -> x;\n     |         ^"
        );
    }
}
