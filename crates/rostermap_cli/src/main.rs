//! rostermap command line.
//!
//! # Responsibility
//! - Parse flags into a reconciliation session for the map or list layout.
//! - Print a key=value summary; report any failure on stderr with exit code 1.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::info;

use rostermap_core::{
    default_log_level, init_logging, read_roster, ListTemplate, MapTemplate, Orientation,
    ReconcileOptions, ReconcileReport, ReconcileService, TemplateFactory,
};

#[derive(Parser)]
#[command(
    name = "rostermap",
    version,
    about = "Merge an address roster into an Inkscape map or list"
)]
struct Cli {
    /// Log level: trace|debug|info|warn|error (default depends on build mode)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Write rotating log files to this directory instead of stderr only
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update a map of boxed addresses laid out in a grid
    Map(MapArgs),
    /// Update a one-line-per-address list
    List(ListArgs),
}

#[derive(Args)]
struct SessionArgs {
    /// Roster CSV with a `rapid` column
    #[arg(value_name = "ROSTER.csv")]
    roster: PathBuf,

    /// Leave addresses missing from the roster in place
    #[arg(long)]
    no_deletes: bool,

    /// Overwrite the document without keeping a .bak copy
    #[arg(long)]
    no_backup: bool,
}

#[derive(Parser)]
struct MapArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Map document to update or create
    #[arg(value_name = "MAP.svg", default_value = "map.svg")]
    output: PathBuf,

    /// Use landscape pages when creating a new map
    #[arg(long)]
    landscape: bool,
}

#[derive(Parser)]
struct ListArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// List document to update or create
    #[arg(value_name = "LIST.svg", default_value = "list.svg")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = setup_logging(cli.log_level.as_deref(), cli.log_dir.as_deref()) {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Map(args) => {
            let orientation = if args.landscape {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            };
            run_session(MapTemplate, &args.session, &args.output, orientation)
        }
        Commands::List(args) => run_session(
            ListTemplate,
            &args.session,
            &args.output,
            Orientation::Portrait,
        ),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn setup_logging(level: Option<&str>, log_dir: Option<&Path>) -> Result<(), String> {
    let level = level.unwrap_or(default_log_level());
    let log_dir = match log_dir {
        Some(dir) if dir.is_relative() => {
            let cwd = std::env::current_dir()
                .map_err(|err| format!("cannot resolve current directory: {err}"))?;
            Some(cwd.join(dir))
        }
        Some(dir) => Some(dir.to_path_buf()),
        None => None,
    };
    let log_dir = log_dir
        .map(|dir| {
            dir.to_str()
                .map(str::to_string)
                .ok_or_else(|| format!("log directory is not valid UTF-8: {}", dir.display()))
        })
        .transpose()?;
    init_logging(level, log_dir.as_deref())
}

fn run_session<T: TemplateFactory + Clone>(
    template: T,
    session: &SessionArgs,
    output: &Path,
    orientation: Orientation,
) -> Result<(), String> {
    let kind = template.kind();
    let options = ReconcileOptions {
        prune_stale: !session.no_deletes,
        backup: !session.no_backup,
        orientation,
    };
    // Keyless rows are reported through `roster_row_skipped` warnings.
    let roster = read_roster(&session.roster).map_err(|err| err.to_string())?;

    let service = ReconcileService::new(template, options);
    let report = service
        .run(output, &roster)
        .map_err(|err| err.to_string())?;
    info!(
        "event=cli_session module=cli status=ok kind={} output={}",
        kind,
        output.display()
    );
    print_report(kind, &report);
    Ok(())
}

fn print_report(kind: &str, report: &ReconcileReport) {
    println!("kind={kind}");
    if let Some(path) = &report.saved_to {
        println!("output={}", path.display());
    }
    if let Some(path) = &report.backup_path {
        println!("backup={}", path.display());
    }
    println!("created={}", report.created.len());
    println!("updated={}", report.updated.len());
    println!("pruned={}", report.pruned.len());
    println!("skipped={}", report.skipped.len());
    for key in &report.pruned {
        println!("pruned_key={key}");
    }
}
