use std::fs;
use std::path::Path;

use crate::app::Dashboard;
use crate::cli::commands::{ExportArgs, ImportArgs, LoginArgs};
use crate::cli::output::SyncJson;
use crate::io::remote::UserId;
use crate::io::session_io::{self, Session};
use crate::model::time::Timestamp;
use crate::ops::backup::backup_file_name;
use crate::sync::coordinator::ReconcileOutcome;

use super::{CmdResult, print_json};

pub fn cmd_export(dash: &Dashboard, args: ExportArgs) -> CmdResult {
    let text = dash.export_snapshot()?;
    match args.output.as_deref() {
        Some("-") => println!("{}", text),
        other => {
            let path = other
                .map(str::to_string)
                .unwrap_or_else(|| backup_file_name(Timestamp::now().local_date()));
            fs::write(&path, text).map_err(|e| format!("could not write {}: {}", path, e))?;
            println!("{}", path);
        }
    }
    Ok(())
}

pub fn cmd_import(dash: &mut Dashboard, args: ImportArgs) -> CmdResult {
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    dash.import_snapshot(&text)
        .map_err(|e| format!("invalid backup file: {}", e))?;
    let board = dash.board();
    println!(
        "imported {} projects ({} archived)",
        board.projects.len(),
        board.archive.len()
    );
    Ok(())
}

pub async fn cmd_login(
    dash: &mut Dashboard,
    data_dir: &Path,
    args: LoginArgs,
    json: bool,
) -> CmdResult {
    if !dash.sync().has_remote() {
        return Err("remote sync is not configured (set [sync] remote_dir in config.toml)".into());
    }
    let user = UserId::new(args.user.trim());
    if user.as_str().is_empty() {
        return Err("user identity cannot be empty".into());
    }
    session_io::write_session(
        data_dir,
        &Session {
            identity: Some(user.clone()),
        },
    )?;
    let outcome = dash.sign_in(user).await;
    report(&outcome, json)
}

pub async fn cmd_logout(dash: &mut Dashboard, data_dir: &Path) -> CmdResult {
    let Some(user) = dash.identity().cloned() else {
        println!("not signed in");
        return Ok(());
    };
    dash.sign_out().await;
    session_io::write_session(data_dir, &Session::default())?;
    println!("signed out {}", user);
    Ok(())
}

pub async fn cmd_sync(dash: &mut Dashboard, json: bool) -> CmdResult {
    if dash.identity().is_none() {
        return Err("not signed in (use `lb login <user>`)".into());
    }
    let outcome = dash.refresh().await;
    report(&outcome, json)
}

fn report(outcome: &ReconcileOutcome, json: bool) -> CmdResult {
    let (name, message, detail) = match outcome {
        ReconcileOutcome::NoIdentity => ("no_identity", "not signed in", None),
        ReconcileOutcome::Skipped => ("skipped", "nothing to sync yet", None),
        ReconcileOutcome::Uploaded => ("uploaded", "uploaded local data", None),
        ReconcileOutcome::AppliedRemote(_) => ("applied_remote", "pulled remote data", None),
        ReconcileOutcome::PushedLocal => ("pushed_local", "local data is newer; pushed it", None),
        ReconcileOutcome::Failed(e) => ("failed", "sync failed; keeping local data", Some(e.clone())),
        ReconcileOutcome::Stale => ("stale", "superseded by a newer sync", None),
    };
    if json {
        return print_json(&SyncJson {
            outcome: name,
            detail,
        });
    }
    match detail {
        Some(detail) => eprintln!("warning: {}: {}", message, detail),
        None => println!("{}", message),
    }
    Ok(())
}
