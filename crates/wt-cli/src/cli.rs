use clap::{Args, Parser, Subcommand};
use wt_diff::DiffFormat;

#[derive(Parser)]
#[command(
    name = "wt",
    about = "worktally: working-directory state and diffs over a content-addressed store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: String,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Show changed, untracked and ignored files
    Status(StatusArgs),
    /// List files in the working directory
    LsFiles(LsFilesArgs),
    /// Record every trackable file as a new commit
    Commit(CommitArgs),
    /// Resolve a reference to a commit id
    RevParse(RevParseArgs),
    /// Show first-parent history
    Log(LogArgs),
    /// Show changes between commits or against the working directory
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Also list ignored files
    #[arg(long)]
    pub ignored: bool,
}

#[derive(Args)]
pub struct LsFilesArgs {
    #[arg(long, conflicts_with_all = ["untracked", "raw", "tracked"])]
    pub ignored: bool,
    #[arg(long, conflicts_with_all = ["raw", "tracked"])]
    pub untracked: bool,
    /// Every file, ignored or not
    #[arg(long, conflicts_with = "tracked")]
    pub raw: bool,
    /// Files in the index
    #[arg(long)]
    pub tracked: bool,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    /// `Name <email>`; defaults to $WT_AUTHOR
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct RevParseArgs {
    pub reference: String,
}

#[derive(Args)]
pub struct LogArgs {
    /// Start here instead of HEAD
    pub reference: Option<String>,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Old side; HEAD when omitted
    pub old: Option<String>,
    /// New side; the working directory when omitted
    pub new: Option<String>,
    /// records, by-path or classic
    #[arg(long, default_value = "classic")]
    pub format: DiffFormat,
}
