use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use runseq::config::{Config, TaskFile};
use runseq::host::ProcessScheduler;
use runseq::{rlog, rlog_warn, Error, Result, TaskGroup};

/// runseq - run task groups one after another
#[derive(Parser, Debug)]
#[command(name = "runseq")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "GROUPS:\n    Each group is a task name, or a comma-separated set run concurrently:\n        runseq clean build,lint test\n\nENVIRONMENT:\n    RUNSEQ_DEBUG=1  Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Task file (defaults to ./runseq.toml)
    #[arg(short = 'f', long, global = true)]
    pub file: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.runseq/runseq.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Groups to run in order; uses the task file's sequence when omitted
    #[arg(value_name = "GROUP")]
    pub groups: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List configured tasks and the default sequence
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    runseq::log::init(cli.debug);

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported by the sequence's diagnostic.
        Err(Error::TaskFailed(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        rlog_warn!("Ignoring user config: {}", e);
        Config::default()
    });
    let path = cli.file.unwrap_or_else(|| config.effective_task_file());
    let file = TaskFile::load(&path)?;
    let host = ProcessScheduler::from_task_file(&file, config.effective_shell());

    if cli.command == Some(Command::List) {
        print_tasks(&host, &file);
        return Ok(());
    }

    let groups: Vec<TaskGroup> = if cli.groups.is_empty() {
        file.groups()
    } else {
        cli.groups.iter().map(|arg| parse_group(arg)).collect()
    };

    rlog!("Running {} groups from {}", groups.len(), path.display());
    let runner = runseq::bind(Arc::new(host));
    runner.run(&groups, None)?.wait().await
}

/// `a` is a single task; `a,b` is a concurrent set.
fn parse_group(arg: &str) -> TaskGroup {
    if arg.contains(',') {
        TaskGroup::Set(
            arg.split(',')
                .map(|name| TaskGroup::Name(name.trim().to_string()))
                .collect(),
        )
    } else {
        TaskGroup::Name(arg.trim().to_string())
    }
}

fn print_tasks(host: &ProcessScheduler, file: &TaskFile) {
    let names = host.task_names();
    if names.is_empty() {
        println!("No tasks configured.");
    }
    for name in names {
        let Some(spec) = host.task(name) else {
            continue;
        };
        match &spec.cwd {
            Some(cwd) => println!("{:<20} {}  (in {})", name, spec.command, cwd.display()),
            None => println!("{:<20} {}", name, spec.command),
        }
    }
    if !file.sequence.is_empty() {
        let groups: Vec<String> = file.groups().iter().map(ToString::to_string).collect();
        println!();
        println!("sequence: {}", groups.join(" -> "));
    }
}
