//! `haccplog` - CLI for the daily food-safety log
//!
//! This binary records checklist results and staff health for a day, manages
//! the checklist, and imports or exports the saved data.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{debug, warn};

use haccplog::cli::render::{
    render_backup_summary, render_config, render_day, render_history, render_items,
};
use haccplog::cli::{
    date_or_today, new_item, CheckCommand, Cli, Command, ConfigCommand, ExportCommand,
    HealthCommand, ImportCommand, ItemsCommand, ShowCommand,
};
use haccplog::export::{
    backup_file_name, output_path, read_backup_file, spreadsheet_file_name, write_backup_file,
    write_spreadsheet_file,
};
use haccplog::photo::photo_from_path;
use haccplog::settings::{add_item, move_item, remove_item, update_item_text};
use haccplog::{
    init_logging, AppState, Config, Error, Persistence, SaveOutcome, Session, SqliteStore,
};

/// Exit code for errors the user can fix and retry, such as a bad item id.
const EXIT_RECOVERABLE: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) => {
                eprintln!("error: {}", err.user_message());
                if err.is_recoverable() {
                    ExitCode::from(EXIT_RECOVERABLE)
                } else {
                    ExitCode::FAILURE
                }
            }
            None => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let custom = cli.config;
    match cli.command {
        Command::Show(cmd) => with_app(custom, |app| handle_show(app, &cmd)),
        Command::Check(cmd) => with_app(custom, |app| handle_check(app, &cmd)),
        Command::Uncheck(cmd) => with_app(custom, |app| {
            let date = date_or_today(cmd.date);
            if app.session.clear_check(date, &cmd.item_id) {
                println!("Cleared {} on {date}", cmd.item_id);
            } else {
                println!("Nothing recorded for {} on {date}", cmd.item_id);
            }
            Ok(())
        }),
        Command::Health(cmd) => with_app(custom, |app| handle_health(app, &cmd)),
        Command::History(cmd) => with_app(custom, |app| {
            print!("{}", render_history(app.session.state(), cmd.limit));
            Ok(())
        }),
        Command::Items(cmd) => with_app(custom, |app| handle_items(app, cmd)),
        Command::Export(cmd) => with_app(custom, |app| handle_export(app, cmd)),
        Command::Import(cmd) => with_app(custom, |app| handle_import(app, &cmd)),
        Command::Config(cmd) => handle_config(custom, cmd),
    }
}

/// Loaded configuration and the session over the saved state.
struct App {
    config: Config,
    session: Session<SqliteStore>,
}

/// Open the saved state, run `command` on it, and write any changes.
fn with_app<F>(custom: Option<PathBuf>, command: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut App) -> anyhow::Result<()>,
{
    let config = Config::load_from(custom)?;
    let session = open_session(&config)?;
    let mut app = App { config, session };
    let result = command(&mut app);

    // Write whatever was changed, even if the command failed part-way.
    let flushed = app.session.flush();
    for outcome in app.session.drain_outcomes() {
        if let SaveOutcome::Saved { bytes } = outcome {
            debug!(bytes, "State written");
        }
    }
    result?;
    flushed?;
    Ok(())
}

fn open_session(config: &Config) -> anyhow::Result<Session<SqliteStore>> {
    let path = config.database_path();
    let mut store = SqliteStore::open(&path)?;
    if config.storage.max_bytes > 0 {
        store = store.with_max_bytes(config.storage.max_bytes)?;
    }
    debug!("Using database {}", path.display());

    let persistence = Persistence::new(store, config.storage.state_key.as_str());
    Ok(Session::open(persistence, config.debounce()))
}

fn handle_show(app: &App, cmd: &ShowCommand) -> anyhow::Result<()> {
    let session = &app.session;
    let date = date_or_today(cmd.date);
    let record = session.day(date);
    if cmd.json {
        let view = serde_json::json!({
            "date": date,
            "progress": session.progress(date),
            "record": record,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_day(session.state(), &record));
    }
    Ok(())
}

fn handle_check(app: &mut App, cmd: &CheckCommand) -> anyhow::Result<()> {
    let date = date_or_today(cmd.date);
    let item = app.session.state().require_item(&cmd.item_id)?.clone();
    let photo = cmd
        .photo
        .as_deref()
        .and_then(|path| photo_from_path(path, &app.config.photo));

    let existing = app.session.day(date).check(&item.id).cloned();
    let result = cmd.to_result(&item, existing.as_ref(), photo)?;
    app.session.record_check(date, result)?;
    println!(
        "Recorded {} on {date} ({}%)",
        item.id,
        app.session.progress(date)
    );
    Ok(())
}

fn handle_health(app: &mut App, cmd: &HealthCommand) -> anyhow::Result<()> {
    let date = date_or_today(cmd.date);
    let fields = cmd.fields();
    if fields.is_empty() {
        anyhow::bail!("nothing to record; pass --temp, --symptom, --wound or --details");
    }
    app.session.record_health(date, fields);
    let health = app.session.day(date).health;
    if health.needs_details() && health.details.is_none() {
        warn!("A symptom or wound is recorded without details");
    }
    println!("Recorded health status for {date}");
    Ok(())
}

fn handle_items(app: &mut App, cmd: ItemsCommand) -> anyhow::Result<()> {
    let session = &mut app.session;
    match cmd {
        ItemsCommand::List { json } => {
            let config = &session.state().config;
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!("{}", render_items(config));
            }
        }
        ItemsCommand::Add {
            category,
            text,
            item_type,
            unit,
        } => {
            let new = new_item(&category, &text, item_type, unit.as_deref());
            let mut added = String::new();
            session.try_apply(|state| {
                let (config, id) = add_item(&state.config, new)?;
                added = id;
                Ok(AppState::new(config, state.records.clone()))
            })?;
            println!("Added {added}");
        }
        ItemsCommand::Edit { id, text } => {
            session.try_apply(|state| {
                Ok(AppState::new(
                    update_item_text(&state.config, &id, &text)?,
                    state.records.clone(),
                ))
            })?;
            println!("Updated {id}");
        }
        ItemsCommand::Remove { id } => {
            session.try_apply(|state| {
                Ok(AppState::new(remove_item(&state.config, &id)?, state.records.clone()))
            })?;
            println!("Removed {id}; recorded results are kept");
        }
        ItemsCommand::Move { id, direction } => {
            session.try_apply(|state| {
                Ok(AppState::new(
                    move_item(&state.config, &id, direction.into())?,
                    state.records.clone(),
                ))
            })?;
            print!("{}", render_items(&session.state().config));
        }
    }
    Ok(())
}

fn handle_export(app: &App, cmd: ExportCommand) -> anyhow::Result<()> {
    let (config, state) = (&app.config, app.session.state());
    let today = Local::now().date_naive();
    let dir = config.output_dir();

    match cmd {
        ExportCommand::Backup { output } => {
            let path = output_path(output, &dir, &backup_file_name(today));
            write_backup_file(state, &path)?;
            println!("{}", path.display());
        }
        ExportCommand::Xlsx { output } => {
            let path = output_path(output, &dir, &spreadsheet_file_name(today));
            write_spreadsheet_file(state, &path, &config.export.sheet_name)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn handle_import(app: &mut App, cmd: &ImportCommand) -> anyhow::Result<()> {
    let imported = read_backup_file(&cmd.file)?;
    let summary = render_backup_summary(&imported);

    if cmd.yes {
        app.session.replace_state(imported);
        println!("Restored {summary}");
    } else {
        println!("Valid backup: {summary}");
        println!("Use --yes to replace all current data with it.");
    }
    Ok(())
}

fn handle_config(custom: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(custom)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", render_config(&config));
            }
        }
        ConfigCommand::Path => {
            let path = custom.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(custom).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
