use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use filing_items::FilingKind;

#[derive(Parser, Debug)]
#[command(
    name = "filing-items",
    version,
    about = "Table-of-contents driven item extraction for filing HTML"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Toc(TocArgs),
    Items(ItemsArgs),
    Structure(StructureArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "10-K")]
    pub filing: FilingKind,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TocArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ItemsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long = "item")]
    pub items: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long = "item")]
    pub items: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub root_heading: bool,
}
