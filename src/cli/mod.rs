#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config;
use crate::error::FocusworkError;
use crate::logging;
use crate::output::table::Table;
use crate::profile::ProfileDirectory;
use crate::session::{self, SessionManager};
use crate::store::StoreClient;
use crate::task::directory::TaskDirectory;
use crate::task::filter::{self, StatusFilter};
use crate::task::model::{Priority, Task, TaskStatus};
use crate::tui;

#[derive(Debug, Parser)]
#[command(
    name = "focuswork",
    version,
    about = "Shared task board for named profiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Profile(ProfileArgs),
    Task(TaskArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub cmd: ProfileCmd,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCmd {
    List(ProfileListArgs),
    Add(ProfileAddArgs),
}

#[derive(Debug, Parser)]
pub struct ProfileListArgs {
    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,
    /// Output in CSV format
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct ProfileAddArgs {
    /// Profile name
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub cmd: TaskCmd,
}

#[derive(Debug, Subcommand)]
pub enum TaskCmd {
    List(TaskListArgs),
    Add(TaskAddArgs),
    Start(TaskIdArgs),
    Finish(TaskIdArgs),
    Reset(TaskIdArgs),
    #[command(alias = "rm")]
    Delete(TaskIdArgs),
}

#[derive(Debug, Parser)]
pub struct TaskListArgs {
    /// Show only this profile's tasks
    #[arg(short = 'o', long = "owner")]
    pub owner: Option<String>,
    /// Filter by status (all, pending, in-progress, done)
    #[arg(short = 's', long = "status", default_value = "all")]
    pub status: String,
    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,
    /// Output in CSV format
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct TaskAddArgs {
    /// Task text
    pub text: String,
    /// Owning profile name
    #[arg(short = 'o', long = "owner")]
    pub owner: String,
    /// Priority (low, medium, high)
    #[arg(short = 'p', long = "priority", default_value = "medium")]
    pub priority: String,
}

#[derive(Debug, Parser)]
pub struct TaskIdArgs {
    /// Task id
    pub id: String,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Get(ConfigGetArgs),
    Set(ConfigSetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    /// Dot-separated key, e.g. ui.dark_mode
    pub key: String,
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => cmd_default().await,
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "focuswork", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => {
                let val = config::get_value_string(&get.key)?;
                match val {
                    Some(v) => {
                        println!("{v}");
                        Ok(ExitCode::SUCCESS)
                    }
                    None => anyhow::bail!(
                        "configuration key '{}' not found - use 'focuswork config list' to see available keys",
                        get.key
                    ),
                }
            }
        },
        Some(Commands::Profile(args)) => cmd_profile(args).await,
        Some(Commands::Task(args)) => cmd_task(args).await,
        Some(Commands::Version) => Ok(cmd_version()),
    }
}

/// Everything a command needs: config, diagnostics, an open store, a
/// signed-in (or absent) session, and the two directories.
struct AppContext {
    cfg: crate::config::Config,
    sessions: SessionManager,
    store: StoreClient,
    profiles: ProfileDirectory,
    tasks: TaskDirectory,
    _log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

async fn load_cfg() -> anyhow::Result<crate::config::Config> {
    let cfg = tokio::task::spawn_blocking(|| -> anyhow::Result<crate::config::Config> {
        let (cfg, _doc, _paths) = config::load()?;
        Ok(cfg)
    })
    .await??;
    Ok(cfg)
}

async fn open_context() -> anyhow::Result<AppContext> {
    let cfg = load_cfg().await?;

    let data_dir = config::expand_path(&cfg.store.data_dir)?;
    let log_guard = logging::init(&data_dir.join("logs"));

    let store = StoreClient::open(&data_dir, &cfg.store.namespace)?;

    let sessions = SessionManager::new();
    let token = session::resolve_token(&cfg.session.token);
    if let Err(e) = sessions.begin(token.as_deref()) {
        // Non-fatal: operations that need a session become no-ops.
        tracing::error!(error = %e, "sign-in failed");
    }

    let profiles = ProfileDirectory::new(&store);
    profiles.bootstrap_defaults(&cfg.profiles.defaults)?;

    let tasks = TaskDirectory::new(&store, sessions.subscribe());

    Ok(AppContext {
        cfg,
        sessions,
        store,
        profiles,
        tasks,
        _log_guard: log_guard,
    })
}

async fn cmd_default() -> anyhow::Result<ExitCode> {
    let ctx = open_context().await?;

    if tui::is_tty() {
        tui::app::run(ctx.cfg.clone(), ctx.store.clone(), &ctx.sessions).await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Non-TTY fallback: print the full task list once.
    let args = TaskListArgs {
        owner: None,
        status: "all".to_owned(),
        json: false,
        csv: false,
    };
    print_task_list(&ctx, &args)?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_profile(args: ProfileArgs) -> anyhow::Result<ExitCode> {
    let ctx = open_context().await?;
    match args.cmd {
        ProfileCmd::List(list) => {
            ctx.store.refresh()?;
            let profiles = ctx.profiles.list();
            if list.json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(ExitCode::SUCCESS);
            }
            let mut table = Table::new(["NAME", "ID"]);
            for p in &profiles {
                table.row([p.name.as_str(), p.id.as_str()]);
            }
            if list.csv {
                table.print_csv()?;
            } else {
                table.print()?;
            }
            Ok(ExitCode::SUCCESS)
        }
        ProfileCmd::Add(add) => {
            match ctx.profiles.create(&add.name)? {
                Some(p) => println!("Added profile {} ({})", p.name, p.id),
                None => println!("Profile name is empty; nothing added."),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_task(args: TaskArgs) -> anyhow::Result<ExitCode> {
    let ctx = open_context().await?;
    match args.cmd {
        TaskCmd::List(list) => {
            ctx.store.refresh()?;
            print_task_list(&ctx, &list)?;
            Ok(ExitCode::SUCCESS)
        }
        TaskCmd::Add(add) => {
            let priority = Priority::parse(&add.priority)
                .ok_or_else(|| FocusworkError::UnknownPriority(add.priority.clone()))?;
            match ctx.tasks.create(&add.text, priority, &add.owner)? {
                Some(task) => println!("Added task {} for {}", task.id, task.owner),
                None => println!("Nothing added (empty text or no active session)."),
            }
            Ok(ExitCode::SUCCESS)
        }
        TaskCmd::Start(id) => {
            let task = require_task(&ctx, &id.id)?;
            if task.status != TaskStatus::Pending {
                anyhow::bail!("task {} is {}, not Pending", task.id, task.status.label());
            }
            ctx.tasks.advance(&task.id)?;
            println!("Started {}", task.id);
            Ok(ExitCode::SUCCESS)
        }
        TaskCmd::Finish(id) => {
            let task = require_task(&ctx, &id.id)?;
            if task.status != TaskStatus::InProgress {
                anyhow::bail!(
                    "task {} is {}, not In Progress",
                    task.id,
                    task.status.label()
                );
            }
            ctx.tasks.advance(&task.id)?;
            println!("Finished {}", task.id);
            Ok(ExitCode::SUCCESS)
        }
        TaskCmd::Reset(id) => {
            let task = require_task(&ctx, &id.id)?;
            if !ctx.tasks.reset(&task.id)? {
                anyhow::bail!("task {} is {}, only Done tasks reset", task.id, task.status.label());
            }
            println!("Reset {} to Pending", task.id);
            Ok(ExitCode::SUCCESS)
        }
        TaskCmd::Delete(id) => {
            // Idempotent by design; deleting an unknown id is not an error.
            ctx.tasks.delete(&id.id)?;
            println!("Deleted {}", id.id);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn require_task(ctx: &AppContext, id: &str) -> anyhow::Result<Task> {
    ctx.store.refresh()?;
    ctx.tasks
        .get(id)
        .ok_or_else(|| FocusworkError::TaskNotFound(id.to_owned()).into())
}

fn print_task_list(ctx: &AppContext, args: &TaskListArgs) -> anyhow::Result<()> {
    let filter = StatusFilter::parse(&args.status)
        .ok_or_else(|| FocusworkError::UnknownFilter(args.status.clone()))?;

    let tasks = match &args.owner {
        Some(owner) => ctx.tasks.list(owner),
        None => ctx.tasks.list_all(),
    };
    let tasks = filter::apply_filter(&tasks, filter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let mut table = Table::new(["ID", "STATUS", "PRIO", "OWNER", "CREATED", "START", "END", "TEXT"]);
    for t in &tasks {
        table.row([
            t.id.as_str(),
            t.status.label(),
            t.priority.label(),
            t.owner.as_str(),
            t.created_at.as_str(),
            t.start_time.as_deref().unwrap_or("-"),
            t.end_time.as_deref().unwrap_or("-"),
            t.text.as_str(),
        ]);
    }
    if args.csv {
        table.print_csv()?;
    } else {
        table.print()?;
    }
    Ok(())
}

fn cmd_version() -> ExitCode {
    println!("focuswork version {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("FOCUSWORK_GIT_COMMIT") {
        println!("  commit: {commit}");
    }
    if let Some(date) = option_env!("FOCUSWORK_BUILD_DATE") {
        println!("  built: {date}");
    }
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}
