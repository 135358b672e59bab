use clap::{Parser, Subcommand};
use eyre::Result;

use dircache::subcommand;

#[derive(Debug, Parser)]
#[command(name = "dircache", about = "A content-addressed object store and directory cache")]
struct App {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the object database.
    InitDb,

    /// Stage one or more paths into the index.
    UpdateCache { paths: Vec<String> },

    /// Build a tree object from the current index.
    WriteTree,

    /// Create a commit object from a tree and zero or more parents.
    CommitTree {
        tree: String,

        #[arg(short = 'p', value_name = "PARENT")]
        parents: Vec<String>,

        #[arg(short = 'm', value_name = "MESSAGE")]
        message: Option<String>,
    },

    /// List the entries of a tree object.
    ReadTree { tree: String },

    /// Write a stored object's raw payload to a temp file and report its type.
    CatFile { digest: String },

    /// Compare staged entries against the working tree.
    ShowDiff,

    /// Print the current index in a human-readable form.
    IndexDump,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let app = App::parse();
    match app.command {
        Command::InitDb => subcommand::init_db::run(),
        Command::UpdateCache { paths } => subcommand::update_cache::run(&paths),
        Command::WriteTree => subcommand::write_tree::run().map(|_| ()),
        Command::CommitTree {
            tree,
            parents,
            message,
        } => subcommand::commit_tree::run(&tree, &parents, message).map(|_| ()),
        Command::ReadTree { tree } => subcommand::read_tree::run(&tree),
        Command::CatFile { digest } => subcommand::cat_file::run(&digest),
        Command::ShowDiff => subcommand::show_diff::run(),
        Command::IndexDump => subcommand::index_dump::run(),
    }
}
