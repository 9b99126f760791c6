mod render;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use netprof_core::{ApplyStatus, ProfilerConfig, ScriptKey, Session, SyncFilter, SyncTarget};
use netprof_project::{ensure_config_toml, load_config, load_config_file};
use netprof_snapshot::SnapshotHost;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "netprof", version, about = "Network sync profiler for scene snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default netprof.toml into a directory
    Init {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Behaviour counts, framework breakdown and the intensity estimate
    Summary(SceneArgs),
    /// Objects by estimated bandwidth, with their synced components
    Objects(SceneArgs),
    /// Script groups by estimated bandwidth
    Scripts(SceneArgs),
    /// Set the sync mode of every instance of one script
    Apply {
        #[command(flatten)]
        scene: SceneArgs,

        /// Script key as printed by `scripts`
        #[arg(long)]
        script: String,

        /// none, manual or continuous
        #[arg(long)]
        mode: SyncTarget,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Write the edited snapshot here instead of over the input
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SceneArgs {
    /// Scene snapshot (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Config file; defaults to netprof.toml next to the scene
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma separated categories to show, `all` or `none-selected`
    #[arg(long, default_value = "all", value_parser = SyncFilter::parse_list)]
    filter: SyncFilter,
}

impl SceneArgs {
    fn load_config(&self) -> Result<ProfilerConfig> {
        let config = match &self.config {
            Some(path) => load_config_file(path),
            None => load_config(self.scene.parent().unwrap_or(Path::new("."))),
        };
        config.context("failed to load profiler config")
    }

    fn open(&self) -> Result<Session<SnapshotHost>> {
        let config = self.load_config()?;
        let host = SnapshotHost::open(&self.scene)
            .with_context(|| format!("failed to open snapshot {}", self.scene.display()))?;
        let mut session = Session::new(host, config);
        session.filter = self.filter;
        Ok(session)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Init { dir } => {
            let created = ensure_config_toml(&dir)
                .with_context(|| format!("failed to write config in {}", dir.display()))?;
            if created {
                println!("created {}", netprof_project::config_path(&dir).display());
            } else {
                println!("config already exists, left untouched");
            }
        }
        Command::Summary(args) => {
            let mut session = args.open()?;
            print!("{}", render::summary(session.analyze()));
        }
        Command::Objects(args) => {
            let mut session = args.open()?;
            print!("{}", render::objects(session.analyze(), args.filter));
        }
        Command::Scripts(args) => {
            let mut session = args.open()?;
            session.analyze();
            if let Some(result) = session.result() {
                print!("{}", render::scripts(result, args.filter, session.host()));
            }
        }
        Command::Apply {
            scene,
            script,
            mode,
            yes,
            out,
        } => apply(&scene, &script, mode, yes, out)?,
    }
    Ok(())
}

fn apply(
    scene: &SceneArgs,
    script: &str,
    mode: SyncTarget,
    yes: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut session = scene.open()?;
    session.analyze();

    let key = ScriptKey::parse(script);
    let status = session.apply(&key, mode, |request| yes || prompt(&request.prompt()));

    match status {
        ApplyStatus::NotFound => bail!("no script group `{key}` in the current view"),
        ApplyStatus::Declined => {
            println!("cancelled, nothing changed");
            return Ok(());
        }
        ApplyStatus::Applied { written, skipped } => {
            println!("{written} written, {skipped} skipped");
        }
    }

    let mut host = session.into_host();
    match write_back(&mut host, out.as_deref())? {
        WriteBack::Saved(path) => println!("saved {}", path.display()),
        WriteBack::Unchanged => println!("no changes, {} left untouched", scene.scene.display()),
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum WriteBack {
    Saved(PathBuf),
    Unchanged,
}

/// An explicit `--out` is always written. Otherwise the input is rewritten only when
/// the apply changed something.
fn write_back(host: &mut SnapshotHost, out: Option<&Path>) -> Result<WriteBack> {
    if let Some(path) = out {
        host.save_as(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        return Ok(WriteBack::Saved(path.to_path_buf()));
    }
    if !host.is_dirty() {
        return Ok(WriteBack::Unchanged);
    }
    host.save().context("failed to save snapshot")?;
    Ok(WriteBack::Saved(
        host.path().map(Path::to_path_buf).unwrap_or_default(),
    ))
}

fn prompt(message: &str) -> bool {
    print!("{message} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
