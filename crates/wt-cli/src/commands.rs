use std::collections::BTreeSet;

use colored::Colorize;
use tracing::debug;
use wt_diff::{DiffOutput, DiffRecord};
use wt_sdk::{ChangeKind, ErrorCategory, Repository, SdkError};

use crate::cli::*;

const DEFAULT_AUTHOR: &str = "wt <wt@localhost>";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    debug!(repo = %cli.repo, json, "running command");
    match cli.command {
        Command::Init(args) => cmd_init(args, &cli.repo),
        Command::Status(args) => cmd_status(&open(&cli.repo)?, args, json),
        Command::LsFiles(args) => cmd_ls_files(&open(&cli.repo)?, args, json),
        Command::Commit(args) => cmd_commit(&mut open(&cli.repo)?, args),
        Command::RevParse(args) => cmd_rev_parse(&open(&cli.repo)?, args),
        Command::Log(args) => cmd_log(&open(&cli.repo)?, args, json),
        Command::Diff(args) => cmd_diff(&open(&cli.repo)?, args, json),
    }
}

fn open(path: &str) -> anyhow::Result<Repository> {
    Ok(Repository::from_source(path)?)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(args: InitArgs, default_path: &str) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| default_path.to_string());
    let repo = Repository::init(&path)?;
    println!(
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        repo.control_dir().display().to_string().bold()
    );
    println!("  Branch: {}", wt_sdk::DEFAULT_BRANCH.yellow());
    Ok(())
}

fn cmd_status(repo: &Repository, args: StatusArgs, json: bool) -> anyhow::Result<()> {
    let status = repo.status()?;
    if json {
        return print_json(&status);
    }

    match repo.current_branch()? {
        Some(branch) => println!("On branch {}", branch.yellow().bold()),
        None => println!("{}", "HEAD detached".red()),
    }
    if repo.head()?.is_none() {
        println!("\nNo commits yet");
    }

    if !status.changes.is_empty() {
        println!("\nChanges:");
        for entry in &status.changes {
            let label = format!("{:>9}:", entry.status.to_string());
            let line = format!("  {label} {}", entry.path);
            println!("{}", paint(entry.status, &line));
        }
    }
    if !status.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &status.untracked {
            println!("  {}", path.red());
        }
    }
    if args.ignored && !status.ignored.is_empty() {
        println!("\nIgnored files:");
        for path in &status.ignored {
            println!("  {}", path.dimmed());
        }
    }
    if status.is_clean() {
        println!("\nNothing to commit, working directory clean.");
    }
    Ok(())
}

fn paint(kind: ChangeKind, text: &str) -> colored::ColoredString {
    match kind {
        ChangeKind::Added => text.green(),
        ChangeKind::Removed => text.red(),
        ChangeKind::Modified => text.yellow(),
    }
}

fn cmd_ls_files(repo: &Repository, args: LsFilesArgs, json: bool) -> anyhow::Result<()> {
    let files: BTreeSet<String> = if args.ignored {
        repo.ignored_files()
    } else if args.untracked {
        repo.untracked_files()
    } else if args.raw {
        repo.raw_files()
    } else if args.tracked {
        repo.tracked_files()
    } else {
        repo.trackable_files()
    };
    if json {
        return print_json(&files);
    }
    for path in files {
        println!("{path}");
    }
    Ok(())
}

fn cmd_commit(repo: &mut Repository, args: CommitArgs) -> anyhow::Result<()> {
    let author = args
        .author
        .or_else(|| std::env::var("WT_AUTHOR").ok())
        .unwrap_or_else(|| DEFAULT_AUTHOR.into());
    let id = repo.commit(&author, &args.message)?;
    let info = repo.commit_info(&id.to_hex())?;
    let branch = repo.current_branch()?.unwrap_or_else(|| "detached".into());
    println!(
        "[{} {}] {}",
        branch.yellow(),
        id.short_hex().dimmed(),
        info.summary
    );
    println!("  {} files tracked", repo.tracked_files().len().to_string().bold());
    Ok(())
}

fn cmd_rev_parse(repo: &Repository, args: RevParseArgs) -> anyhow::Result<()> {
    println!("{}", repo.resolve(&args.reference)?);
    Ok(())
}

fn cmd_log(repo: &Repository, args: LogArgs, json: bool) -> anyhow::Result<()> {
    let log = match &args.reference {
        Some(reference) => repo.log_from(reference, args.limit)?,
        None => repo.log(args.limit)?,
    };
    if json {
        return print_json(&log);
    }
    if log.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for info in &log {
        if args.oneline {
            println!("{} {}", info.sha.short_hex().yellow(), info.summary);
            continue;
        }
        println!("{} {}", "commit".yellow(), info.sha.to_hex().yellow());
        println!("Author: {} <{}>", info.author_name, info.author_email);
        println!("Date:   {}", info.time.to_rfc2822());
        println!("\n    {}", info.summary.bold());
        if !info.description.is_empty() {
            println!();
            for line in info.description.lines() {
                println!("    {line}");
            }
        }
        println!();
    }
    Ok(())
}

fn cmd_diff(repo: &Repository, args: DiffArgs, json: bool) -> anyhow::Result<()> {
    let result = match (&args.old, &args.new) {
        (Some(old), Some(new)) => repo.diff(old, new),
        (Some(old), None) => repo.diff_working(old),
        (None, _) => repo.diff_head(),
    };
    let records: Vec<DiffRecord> = match result {
        Ok(records) => records,
        Err(e) if e.category() == ErrorCategory::NothingToCompare => {
            println!("No commits yet, nothing to compare.");
            return Ok(());
        }
        Err(e) => return Err(describe(e)),
    };
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    let output = DiffOutput::new(records, args.format);
    for line in output.render().lines() {
        println!("{}", paint_diff_line(line));
    }
    Ok(())
}

fn paint_diff_line(line: &str) -> colored::ColoredString {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold()
    } else if line.starts_with("@@") {
        line.cyan()
    } else if line.starts_with('+') {
        line.green()
    } else if line.starts_with('-') {
        line.red()
    } else {
        line.normal()
    }
}

fn describe(err: SdkError) -> anyhow::Error {
    let hint = match err.category() {
        ErrorCategory::InvalidInput => "check the reference or path",
        ErrorCategory::StorageInconsistency => "the object store is missing data",
        ErrorCategory::Io => "the filesystem refused access",
        ErrorCategory::NothingToCompare => "make a first commit",
    };
    anyhow::anyhow!("{err} ({hint})")
}
