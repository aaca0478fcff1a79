use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "terrace",
    about = "Terrace: layered, delta-encoded triple store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory.
    #[arg(short, long, global = true, default_value = ".terrace")]
    pub store: PathBuf,

    /// TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty store
    Init,
    /// Create a named graph
    CreateGraph(GraphArgs),
    /// Delete a named graph (its layers stay in the store)
    DeleteGraph(GraphArgs),
    /// List named graphs
    Graphs,
    /// Show a graph's head layer and version
    Head(GraphArgs),
    /// Add a triple to a graph as a new layer
    Add(TripleArgs),
    /// Remove a triple from a graph as a new layer
    Remove(TripleArgs),
    /// Load a CSV file into a graph as a new layer
    ImportCsv(ImportCsvArgs),
    /// List the triples of a graph's head or of a specific layer
    Triples(TriplesArgs),
    /// Show a graph's layer history
    Log(LogArgs),
    /// Replace a graph's head with a single flattened layer
    Squash(GraphArgs),
    /// Write layers and their ancestors to a pack file
    Export(ExportArgs),
    /// Load layers from a pack file
    Import(ImportArgs),
    /// Show the layers in a pack file without loading them
    Manifest(ManifestArgs),
}

#[derive(Args)]
pub struct GraphArgs {
    pub graph: String,
}

#[derive(Args)]
#[command(group(ArgGroup::new("object_kind").required(true).args(["node", "value"])))]
pub struct TripleArgs {
    pub graph: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// Treat the object as a node
    #[arg(long)]
    pub node: bool,
    /// Treat the object as a literal value
    #[arg(long)]
    pub value: bool,
}

#[derive(Args)]
pub struct ImportCsvArgs {
    pub graph: String,
    pub path: PathBuf,
    /// Prefix for row subjects
    #[arg(long, default_value = "")]
    pub data_prefix: String,
    /// Prefix for column predicates
    #[arg(long, default_value = "")]
    pub predicate_prefix: String,
    /// The first row is data, not column names
    #[arg(long, conflicts_with = "skip_header")]
    pub no_header: bool,
    /// Drop the header row and name columns col0, col1, ...
    #[arg(long)]
    pub skip_header: bool,
}

#[derive(Args)]
pub struct TriplesArgs {
    pub graph: Option<String>,
    /// Read this layer instead of a graph head
    #[arg(long, conflicts_with = "graph", required_unless_present = "graph")]
    pub layer: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    pub graph: String,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct ExportArgs {
    pub out: PathBuf,
    #[arg(required = true)]
    pub layers: Vec<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub pack: PathBuf,
    /// Layers to import; all layers when empty
    pub layers: Vec<String>,
}

#[derive(Args)]
pub struct ManifestArgs {
    pub pack: PathBuf,
}
