use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use dayplan::config::{self, AppConfig};
use dayplan::models::*;
use dayplan::store::TaskStore;
use dayplan::{api, export, scheduler};

#[derive(Parser)]
#[command(name = "dayplan")]
#[command(about = "Time-weighted task scheduler")]
struct Cli {
    /// Task file to use instead of the configured one
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    Serve {
        /// Port for HTTP
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },
    /// Add a task
    Add {
        #[arg(short, long)]
        title: String,

        /// Estimated duration in minutes
        #[arg(short, long, allow_hyphen_values = true)]
        minutes: i64,

        /// Impact weight (higher is more valuable)
        #[arg(short, long, allow_hyphen_values = true)]
        impact: f64,

        /// Due date, YYYY-MM-DD
        #[arg(short, long)]
        deadline: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Allow this task to be split across slots
        #[arg(short, long)]
        splittable: bool,
    },
    /// List tasks, soonest deadline first
    List {
        /// Order by priority score instead, as the scheduler would
        #[arg(long)]
        ranked: bool,
    },
    /// Remove a task by id
    Remove { id: Uuid },
    /// Print a schedule
    Plan {
        /// Working hours available
        #[arg(long)]
        hours: Option<f64>,

        /// Start of the day, HH:MM
        #[arg(long)]
        start: Option<String>,

        /// Allow splitting any task
        #[arg(long)]
        split: bool,

        /// Urgency window in days
        #[arg(long)]
        window: Option<u32>,

        /// Plan this many consecutive days, carrying leftovers forward
        #[arg(long)]
        days: Option<u32>,

        /// Day to plan (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print CSV instead of a table (with a date column when --days is set)
        #[arg(long)]
        csv: bool,
    },
    /// Write a CSV export
    Export {
        #[arg(value_enum)]
        what: ExportKind,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Tasks,
    Schedule,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the effective configuration to the configuration file
    Init,
}

/// Initialize tracing with output to stderr (for CLI commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| {
            if use_stderr {
                "dayplan=warn".into()
            } else {
                "dayplan=debug,tower_http=debug".into()
            }
        }),
    );

    if use_stderr {
        // CLI output (tables, CSV) goes to stdout, so keep logs out of it
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<TaskStore> {
    match &config.data_file {
        Some(path) => TaskStore::open(path.clone()),
        None => TaskStore::open_default(),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = AppConfig::load();
    if let Some(path) = cli.data_file {
        config.data_file = Some(path);
    }

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            serve(config).await?;
        }
        None => serve(config).await?,
        Some(Commands::Add {
            title,
            minutes,
            impact,
            deadline,
            notes,
            splittable,
        }) => {
            let store = open_store(&config)?;
            let task = store.create_task(CreateTaskInput {
                title,
                minutes,
                impact,
                deadline,
                notes,
                splittable,
            })?;
            println!("Added task: \"{}\" ({})", task.title, task.id);
        }
        Some(Commands::List { ranked }) => {
            let store = open_store(&config)?;
            let mut tasks = store.list_tasks_by_deadline()?;
            if ranked {
                let params = config.schedule_defaults();
                let options = ScheduleOptions::from_params(today(), &params)?;
                tasks = scheduler::rank(&store.list_tasks()?, &options)
                    .into_iter()
                    .map(|r| r.task.clone())
                    .collect();
            }
            if tasks.is_empty() {
                println!("No tasks.");
            }
            let window = config.urgency_window_days;
            for task in tasks {
                println!(
                    "{}  {:<32} {:>4} min  impact {:<5} due {:<10}  score {:.3}",
                    task.id,
                    task.title,
                    task.minutes,
                    task.impact,
                    task.deadline
                        .map(|d| d.format(DATE_FORMAT).to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    scheduler::score(&task, today(), window),
                );
            }
        }
        Some(Commands::Remove { id }) => {
            let store = open_store(&config)?;
            let removed = store.delete_task(id)?;
            println!("Removed {} task(s).", usize::from(removed));
        }
        Some(Commands::Plan {
            hours,
            start,
            split,
            window,
            days,
            date,
            csv,
        }) => {
            let params = ScheduleParams {
                hours,
                budget_minutes: None,
                start,
                allow_split: split.then_some(true),
                urgency_window: window,
            }
            .or(&config.schedule_defaults());
            let options = ScheduleOptions::from_params(date.unwrap_or_else(today), &params)?;

            let store = open_store(&config)?;
            let tasks = store.list_tasks()?;
            let plans = match days {
                Some(days) => scheduler::schedule_days(&tasks, &options, validate_plan_days(days)?),
                None => vec![scheduler::schedule_day(&tasks, &options)],
            };

            if csv && days.is_some() {
                print!("{}", export::schedules_csv(&plans)?);
            } else if csv {
                for plan in &plans {
                    print!("{}", export::schedule_csv(plan)?);
                }
            } else {
                plans.iter().for_each(print_plan);
            }
        }
        Some(Commands::Export { what, out }) => {
            let store = open_store(&config)?;
            let tasks = store.list_tasks()?;
            let body = match what {
                ExportKind::Tasks => export::tasks_csv(&tasks)?,
                ExportKind::Schedule => {
                    let options =
                        ScheduleOptions::from_params(today(), &config.schedule_defaults())?;
                    export::schedule_csv(&scheduler::schedule_day(&tasks, &options))?
                }
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", body),
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => println!("{}", serde_json::to_string_pretty(&config)?),
            ConfigAction::Path => println!("{}", config::get_config_path()?.display()),
            ConfigAction::Init => {
                config.save()?;
                println!("Wrote {}", config::get_config_path()?.display());
            }
        },
    }

    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting dayplan server on {}", addr);

    let app = api::create_router(api::AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("dayplan listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn print_plan(plan: &Schedule) {
    println!(
        "Schedule for {}: {} of {} minutes ({:.0}%)",
        plan.date.format(DATE_FORMAT),
        plan.allocated_minutes,
        plan.budget_minutes,
        plan.utilization_percent()
    );
    for slot in &plan.slots {
        println!(
            "  {}-{}  {:<40} {:>4} min",
            slot.start.format(TIME_FORMAT),
            slot.end.format(TIME_FORMAT),
            slot.label(),
            slot.minutes
        );
    }
    for item in &plan.unscheduled {
        println!(
            "  unscheduled: {} ({} min, {})",
            item.title,
            item.minutes,
            item.reason.describe()
        );
    }
    println!();
}
