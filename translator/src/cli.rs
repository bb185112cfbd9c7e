use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log phase progress")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Exit with an error if the translation log has errors")]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate a diagram of a PSM project to XML Schema
    Export(ExportArgs),
    /// Read an XML Schema into a new diagram of a PSM project
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(help = "The PSM project (JSON)")]
    pub project: PathBuf,

    #[arg(long, default_value_t = 0, help = "Index of the diagram to translate")]
    pub diagram: usize,

    #[arg(short, long, help = "Output file; the schema is printed if omitted")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Replacement for whitespace in names")]
    pub whitespace_replacement: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    #[arg(help = "The XML Schema document")]
    pub schema: PathBuf,

    #[arg(short, long, help = "Project to add the diagram to; created if missing")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Name of the new diagram; defaults to the schema file name")]
    pub name: Option<String>,

    #[arg(long, help = "Keep single-use structural representatives")]
    pub no_resolve_srs: bool,

    #[arg(long, help = "Keep the representatives created when relocating extensions")]
    pub keep_extension_srs: bool,

    #[arg(long, help = "Write the model directly instead of journaling commands")]
    pub direct: bool,

    #[arg(long, help = "Lay out the new diagram")]
    pub layout: bool,
}
