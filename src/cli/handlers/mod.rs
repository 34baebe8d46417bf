mod account;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::app::Dashboard;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::local_cache::FileCache;
use crate::io::lock::DataLock;
use crate::io::remote::{DirRemote, RemoteStore};
use crate::io::session_io;
use crate::model::card::CardType;
use crate::model::config::AppConfig;
use crate::model::layout::DropPosition;
use crate::model::project::Project;
use crate::model::time::Timestamp;
use crate::ops::card_ops::CardUpdate;
use crate::ops::progress::project_progress;
use crate::ops::project_ops::ProjectUpdate;
use crate::ops::search::hit_count;
use crate::sync::coordinator::SyncCoordinator;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref().map(Path::new));
    let _lock = DataLock::acquire_default(&data_dir)?;
    let config = config_io::read_config(&data_dir)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command, cli.json, &data_dir, &config))
}

async fn run(command: Commands, json: bool, data_dir: &Path, config: &AppConfig) -> CmdResult {
    let mut dash = open_dashboard(data_dir, config);

    let reconciles_itself = matches!(command, Commands::Login(_) | Commands::Logout | Commands::Sync);
    if dash.identity().is_some() && !reconciles_itself {
        let outcome = dash.background_check().await;
        tracing::debug!(?outcome, "startup check");
    }

    let result = match command {
        // Read commands
        Commands::Board => cmd_board(&dash, json),
        Commands::Show(args) => cmd_show(&dash, args, json),
        Commands::Archived => cmd_archived(&dash, json),
        Commands::Stats => cmd_stats(&dash, json),
        Commands::Search(args) => cmd_search(&dash, args, json),
        Commands::Today(args) => cmd_today(&dash, args, json),
        Commands::Schedule(args) => cmd_schedule(&dash, args, json),

        // Write commands
        Commands::Project(cmd) => cmd_project(&mut dash, cmd, json),
        Commands::Card(cmd) => cmd_card(&mut dash, cmd, json),

        // Backup and identity
        Commands::Export(args) => account::cmd_export(&dash, args),
        Commands::Import(args) => account::cmd_import(&mut dash, args),
        Commands::Login(args) => account::cmd_login(&mut dash, data_dir, args, json).await,
        Commands::Logout => account::cmd_logout(&mut dash, data_dir).await,
        Commands::Sync => account::cmd_sync(&mut dash, json).await,
    };

    dash.flush().await;
    for warning in dash.take_warnings() {
        eprintln!("warning: {}", warning);
    }
    result
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_dashboard(data_dir: &Path, config: &AppConfig) -> Dashboard {
    let cache = FileCache::new(data_dir.join(&config.storage.cache_file))
        .with_capacity(config.storage.capacity_kb * 1024);
    let remote = config_io::remote_root(data_dir, config)
        .map(|root| Arc::new(DirRemote::new(root)) as Arc<dyn RemoteStore>);
    let session = session_io::read_session(data_dir);
    let sync = SyncCoordinator::new(
        Box::new(cache),
        remote,
        Duration::from_millis(config.sync.debounce_ms),
    )
    .with_usage_warning(config.storage.warn_kb * 1024)
    .with_identity(session.identity);
    Dashboard::open(sync)
}

/// Find a project by exact id, exact name, or unique id prefix.
fn resolve_in<'a>(projects: &'a [Project], query: &str) -> Result<&'a Project, String> {
    if let Some(p) = projects.iter().find(|p| p.id == query) {
        return Ok(p);
    }
    let by_name: Vec<&Project> = projects.iter().filter(|p| p.name == query).collect();
    if let [p] = by_name.as_slice() {
        return Ok(*p);
    }
    if by_name.len() > 1 {
        return Err(format!("more than one project is named '{}'; use its id", query));
    }
    unique_prefix(projects.iter().filter(|p| p.id.starts_with(query)), query, "project")
}

fn unique_prefix<'a, T>(
    mut matches: impl Iterator<Item = &'a T>,
    query: &str,
    what: &str,
) -> Result<&'a T, String> {
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(format!("{} not found: {}", what, query)),
        (Some(_), Some(_)) => Err(format!("ambiguous {} id prefix: {}", what, query)),
    }
}

fn active_id(dash: &Dashboard, query: &str) -> Result<String, String> {
    resolve_in(&dash.board().projects, query).map(|p| p.id.clone())
}

fn archived_id(dash: &Dashboard, query: &str) -> Result<String, String> {
    resolve_in(&dash.board().archive, query).map(|p| p.id.clone())
}

fn card_id(dash: &Dashboard, project_id: &str, query: &str) -> Result<String, String> {
    let project = dash
        .board()
        .project(project_id)
        .ok_or_else(|| format!("project not found: {}", project_id))?;
    if let Some(card) = project.card(query) {
        return Ok(card.id.clone());
    }
    unique_prefix(
        project.cards.iter().filter(|c| c.id.starts_with(query)),
        query,
        "card",
    )
    .map(|c| c.id.clone())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

fn parse_card_type(s: &str) -> Result<CardType, String> {
    CardType::parse_type(s)
        .ok_or_else(|| format!("unknown card type '{}' (expected: task, note, important)", s))
}

fn today(args: &DayArgs) -> Result<NaiveDate, String> {
    match &args.date {
        Some(s) => parse_date(s),
        None => Ok(Timestamp::now().local_date()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_board(dash: &Dashboard, json: bool) -> CmdResult {
    let today = Timestamp::now().local_date();
    if json {
        return print_json(&board_to_json(dash.board(), today));
    }
    print_lines(format_board(dash.board(), today));
    Ok(())
}

fn cmd_show(dash: &Dashboard, args: ShowArgs, json: bool) -> CmdResult {
    let board = dash.board();
    let project = resolve_in(&board.projects, &args.project)
        .or_else(|_| resolve_in(&board.archive, &args.project))?;
    let today = Timestamp::now().local_date();
    if json {
        return print_json(&project_to_json(project, today));
    }
    print_lines(format_project(project, today));
    Ok(())
}

fn cmd_archived(dash: &Dashboard, json: bool) -> CmdResult {
    let archive = &dash.board().archive;
    if json {
        let today = Timestamp::now().local_date();
        let out: Vec<ProjectJson> = archive.iter().map(|p| project_to_json(p, today)).collect();
        return print_json(&out);
    }
    if archive.is_empty() {
        println!("No archived projects.");
        return Ok(());
    }
    let projects: Vec<&Project> = archive.iter().collect();
    print_lines(format_project_table(&projects));
    Ok(())
}

fn cmd_stats(dash: &Dashboard, json: bool) -> CmdResult {
    let board = dash.board();
    let projects = board.projects_in_lane_order();
    let total = dash.progress();
    let storage_bytes = dash.sync().usage_bytes();

    if json {
        return print_json(&StatsJson {
            projects: projects
                .iter()
                .map(|p| ProjectStatsJson {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    progress: project_progress(p),
                })
                .collect(),
            total,
            archived: board.archive.len(),
            storage_bytes,
        });
    }

    print_lines(format_project_table(&projects));
    println!();
    println!("Total: {}/{} ({}%)", total.done, total.total, total.percent);
    println!("Archived projects: {}", board.archive.len());
    println!("Storage: {} KB", storage_bytes.div_ceil(1024));
    Ok(())
}

fn cmd_search(dash: &Dashboard, args: SearchArgs, json: bool) -> CmdResult {
    let results = dash.search(&args.query);
    if json {
        return print_json(&search_to_json(&results));
    }
    if results.is_empty() {
        println!("No cards match '{}'.", args.query.trim());
        return Ok(());
    }
    print_lines(format_search(&results));
    println!();
    println!("{} matching card(s)", hit_count(&results));
    Ok(())
}

fn cmd_today(dash: &Dashboard, args: DayArgs, json: bool) -> CmdResult {
    let today = today(&args)?;
    let agenda = dash.today(today);
    if json {
        return print_json(&today_to_json(&agenda, today));
    }
    print_lines(format_today(&agenda, today));
    Ok(())
}

fn cmd_schedule(dash: &Dashboard, args: DayArgs, json: bool) -> CmdResult {
    let today = today(&args)?;
    let groups = dash.schedule(today);
    if json {
        return print_json(&schedule_to_json(&groups, today));
    }
    print_lines(format_schedule(&groups, today));
    Ok(())
}

// ---------------------------------------------------------------------------
// Project commands
// ---------------------------------------------------------------------------

fn cmd_project(dash: &mut Dashboard, cmd: ProjectCmd, json: bool) -> CmdResult {
    match cmd.action {
        ProjectAction::New(args) => {
            let id = dash.create_project(&args.name, args.color.as_deref())?;
            if json {
                return print_json(&serde_json::json!({ "id": id }));
            }
            println!("{}", id);
        }
        ProjectAction::Rename(args) => {
            let id = active_id(dash, &args.project)?;
            dash.update_project(
                &id,
                ProjectUpdate {
                    name: Some(args.name),
                    ..Default::default()
                },
            )?;
        }
        ProjectAction::Color(args) => {
            let id = active_id(dash, &args.project)?;
            dash.update_project(
                &id,
                ProjectUpdate {
                    color: Some(args.color),
                    ..Default::default()
                },
            )?;
        }
        ProjectAction::Archive(args) => {
            let id = active_id(dash, &args.project)?;
            dash.archive_project(&id)?;
        }
        ProjectAction::Restore(args) => {
            let id = archived_id(dash, &args.project)?;
            dash.restore_project(&id)?;
        }
        ProjectAction::Delete(args) => {
            let id = if args.archived {
                archived_id(dash, &args.project)?
            } else {
                active_id(dash, &args.project)?
            };
            let removed = dash.delete_project(&id, args.archived)?;
            println!("deleted {} ({} cards)", removed.name, removed.cards.len());
        }
        ProjectAction::Move(args) => {
            let position = DropPosition::parse_position(&args.position).ok_or_else(|| {
                format!(
                    "unknown position '{}' (expected: left, right, top, bottom)",
                    args.position
                )
            })?;
            let dragged = active_id(dash, &args.project)?;
            let target = active_id(dash, &args.target)?;
            if !dash.reorder_project(&dragged, &target, position)? {
                println!("nothing to move");
            }
        }
        ProjectAction::Focus(args) => match (args.project, args.clear) {
            (_, true) => dash.clear_focus(),
            (Some(project), false) => {
                let id = active_id(dash, &project)?;
                dash.focus_project(&id)?;
            }
            (None, false) => return Err("give a project to focus, or --clear".into()),
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Card commands
// ---------------------------------------------------------------------------

fn cmd_card(dash: &mut Dashboard, cmd: CardCmd, json: bool) -> CmdResult {
    match cmd.action {
        CardAction::Add(args) => {
            let project = active_id(dash, &args.project)?;
            let card_type = parse_card_type(&args.card_type)?;
            let due = args.due.as_deref().map(parse_date).transpose()?;
            let id = dash.add_card(&project, &args.content, card_type, due)?;
            if json {
                return print_json(&serde_json::json!({ "id": id }));
            }
            println!("{}", id);
        }
        CardAction::Edit(args) => {
            let project = active_id(dash, &args.project)?;
            let card = card_id(dash, &project, &args.card)?;
            let due_date = match (args.due.as_deref(), args.no_due) {
                (_, true) => Some(None),
                (Some(s), false) => Some(Some(parse_date(s)?)),
                (None, false) => None,
            };
            let update = CardUpdate {
                content: args.content,
                card_type: args.card_type.as_deref().map(parse_card_type).transpose()?,
                due_date,
            };
            if update.content.is_none() && update.card_type.is_none() && update.due_date.is_none() {
                return Err("nothing to change (use --content, --type, --due or --no-due)".into());
            }
            dash.update_card(&project, &card, update)?;
        }
        CardAction::Toggle(args) => {
            let project = active_id(dash, &args.project)?;
            let card = card_id(dash, &project, &args.card)?;
            if !dash.toggle_card(&project, &card)? {
                println!("notes cannot be completed");
                return Ok(());
            }
            let done = dash
                .board()
                .project(&project)
                .and_then(|p| p.card(&card))
                .is_some_and(|c| c.completed);
            println!("{}", if done { "done" } else { "not done" });
        }
        CardAction::Rm(args) => {
            let project = active_id(dash, &args.project)?;
            let card = card_id(dash, &project, &args.card)?;
            dash.delete_card(&project, &card)?;
        }
    }
    Ok(())
}
