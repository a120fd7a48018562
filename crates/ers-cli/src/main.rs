use clap::{Args as ClapArgs, Parser, Subcommand};
use ers_core::{Command, ProcessGuard, Severity, Status, SwapEngine, SystemOpener};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "ers-cli",
    about = "Swap Elden Ring saves between named slots with timestamped backups",
    version
)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show current save, locations and slots
    Status,
    /// First-run setup: locations plus an initial backup of the current save
    Setup(SetupArgs),
    /// Set the Elden Ring save directory
    SetSaveLocation { dir: PathBuf },
    /// Set the backup directory
    SetBackupLocation { dir: PathBuf },
    /// List archived saves
    List,
    /// Swap the active save for an archived one
    Swap { name: String },
    /// Back up and clear the active save, starting a fresh named one
    Fresh(FreshArgs),
    /// Back up a save file or folder from anywhere under a new name
    Add(AddArgs),
    /// Rename an archived save
    Rename { old: String, new: String },
    /// Re-prefix files left behind by an interrupted rename
    Repair(RepairArgs),
    /// List timestamped backups of a save (defaults to the current one)
    Backups { name: Option<String> },
    /// Open the save location in the file browser
    OpenSave,
    /// Open the backup location in the file browser
    OpenBackup,
    /// Wait for the game to write a new save file
    WaitForSave(WaitArgs),
}

#[derive(ClapArgs, Debug)]
struct SetupArgs {
    /// Elden Ring save directory (the one holding ER0000.sl2)
    #[arg(long, value_name = "DIR")]
    save_location: PathBuf,
    /// Where timestamped backups go
    #[arg(long, value_name = "DIR")]
    backup_location: PathBuf,
    /// Name for the save currently in the game directory
    #[arg(long, default_value = "")]
    name: String,
}

#[derive(ClapArgs, Debug)]
struct FreshArgs {
    name: String,
    /// After clearing, wait this many seconds for the game to create the new save
    #[arg(long)]
    wait: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
    /// Save file (.sl2) or folder containing one
    source: PathBuf,
    /// Name to file the backup under
    #[arg(long)]
    name: String,
}

#[derive(ClapArgs, Debug)]
struct RepairArgs {
    /// Current slot name
    name: String,
    /// Prefix still carried by some files (the pre-rename name)
    #[arg(long)]
    stale: String,
}

#[derive(ClapArgs, Debug)]
struct WaitArgs {
    /// Seconds to wait
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    log::debug!("config file {}", config_path.display());
    let mut engine = SwapEngine::load(&config_path, ProcessGuard).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });

    let statuses = match cli.cmd.unwrap_or(Cmd::Status) {
        Cmd::Status => cmd_status(&engine),
        Cmd::Setup(a) => run(
            &mut engine,
            Command::InitialSetup {
                save_location: a.save_location,
                backup_location: a.backup_location,
                name: a.name,
            },
        ),
        Cmd::SetSaveLocation { dir } => run(&mut engine, Command::SetSaveLocation(dir)),
        Cmd::SetBackupLocation { dir } => run(&mut engine, Command::SetBackupLocation(dir)),
        Cmd::List => run(&mut engine, Command::ListSaves),
        Cmd::Swap { name } => run(&mut engine, Command::SelectSave(name)),
        Cmd::Fresh(a) => cmd_fresh(&mut engine, a),
        Cmd::Add(a) => run(&mut engine, Command::AddExistingSave { source: a.source, name: a.name }),
        Cmd::Rename { old, new } => run(&mut engine, Command::RenameSave { old, new }),
        Cmd::Repair(a) => run(&mut engine, Command::RepairSave { name: a.name, stale: a.stale }),
        Cmd::Backups { name } => cmd_backups(&engine, name),
        Cmd::OpenSave => run(&mut engine, Command::OpenSaveLocation),
        Cmd::OpenBackup => run(&mut engine, Command::OpenBackupLocation),
        Cmd::WaitForSave(a) => cmd_wait(&engine, a.timeout),
    };

    let failed = print_statuses(&statuses);
    if failed {
        std::process::exit(1);
    }
}

fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(d) => d.join("elden-ring-save-swapper").join("config.json"),
        None => PathBuf::from(ers_core::config::CONFIG_FILE_NAME),
    }
}

fn run(engine: &mut SwapEngine<ProcessGuard>, cmd: Command) -> Vec<Status> {
    if engine.needs_setup() && !matches!(cmd, Command::InitialSetup { .. }) {
        log::warn!("setup has not been completed; run `ers-cli setup` first");
    }
    ers_core::execute(engine, cmd, &SystemOpener)
}

fn cmd_status(engine: &SwapEngine<ProcessGuard>) -> Vec<Status> {
    let cfg = engine.config();
    let mut out = vec![Status::info(format!("Currently loaded save: {}", engine.current_slot()))];
    if engine.needs_setup() {
        out.push(Status::warning("Setup has not been completed; run `ers-cli setup`"));
    }
    out.push(Status::info(format!("Save location: {}", cfg.save_location)));
    out.push(Status::info(format!("Backup location: {}", cfg.backup_location)));
    match engine.list_slots() {
        Ok(names) => out.push(Status::info(format!("Saves: {}", names.join(", ")))),
        Err(e) => out.push(Status::warning(e.to_string())),
    }
    out
}

fn cmd_fresh(engine: &mut SwapEngine<ProcessGuard>, args: FreshArgs) -> Vec<Status> {
    let mut out = run(engine, Command::CreateFreshSave(args.name));
    let Some(secs) = args.wait else { return out };
    if out.iter().any(|s| s.severity == Severity::Error) {
        return out;
    }
    out.extend(cmd_wait(engine, secs));
    out
}

fn cmd_backups(engine: &SwapEngine<ProcessGuard>, name: Option<String>) -> Vec<Status> {
    let name = name.unwrap_or_else(|| engine.current_slot().to_string());
    match engine.list_backups(&name) {
        Ok(entries) if entries.is_empty() => vec![Status::info(format!("No backups for '{}'", name))],
        Ok(entries) => entries
            .into_iter()
            .map(|b| Status::info(format!("{}\t{}", b.timestamp, b.file_name)))
            .collect(),
        Err(e) => vec![Status::from(&e)],
    }
}

fn cmd_wait(engine: &SwapEngine<ProcessGuard>, secs: u64) -> Vec<Status> {
    println!("Waiting up to {}s for the game to write a save...", secs);
    match engine.wait_for_active_save(Duration::from_secs(secs), Duration::from_secs(1)) {
        Ok(true) => vec![Status::success("New save file detected")],
        Ok(false) => vec![Status::warning(format!("No save file appeared within {}s", secs))],
        Err(e) => vec![Status::from(&e)],
    }
}

fn print_statuses(statuses: &[Status]) -> bool {
    let mut failed = false;
    for s in statuses {
        match s.severity {
            Severity::Error => {
                failed = true;
                eprintln!("{}", s);
            }
            Severity::Warning => eprintln!("{}", s),
            _ => println!("{}", s),
        }
    }
    failed
}
