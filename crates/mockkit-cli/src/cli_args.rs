use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mockkit", version, about = "Generate expectation-driven mocks for Rust traits")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log resolution and generation details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Generate a mock for one trait
    Gen(GenArgs),

    /// Generate every mock listed in a config file
    Batch {
        /// Config file (default: ./mockkit.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub(crate) struct GenArgs {
    /// Module holding the trait: a path or a module path like `app::store`
    #[arg(long)]
    pub src: String,

    /// Module the mock belongs to; the mock is written as its child module
    #[arg(long)]
    pub dst: String,

    /// Trait to mock
    #[arg(long = "trait", value_name = "NAME")]
    pub trait_name: String,

    /// Output file, `-` for stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name of the mock type (default: <Trait>Mock)
    #[arg(long)]
    pub name: Option<String>,

    /// Emit `on_<method>` helpers registering expectations
    #[arg(long)]
    pub on_helpers: bool,

    /// Alias to import the tester module under
    #[arg(long, env = "MOCKKIT_TESTER_ALIAS")]
    pub tester_alias: Option<String>,

    /// Record the elements of a trailing `&[T]` parameter one by one
    #[arg(long)]
    pub variadic_slices: bool,
}
