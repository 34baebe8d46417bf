use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::snapshot::Snapshot;

/// Why an import file was rejected
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("backup must be a JSON object")]
    NotAnObject,
    #[error("`projects` must be an array")]
    ProjectsNotArray,
    #[error("`archive` must be an array when present")]
    ArchiveNotArray,
    #[error("{list}[{index}] is not an object")]
    ProjectNotObject { list: &'static str, index: usize },
    #[error("{list}[{index}] is missing `{field}`")]
    ProjectMissingField {
        list: &'static str,
        index: usize,
        field: &'static str,
    },
    #[error("{list}[{index}].cards must be an array")]
    CardsNotArray { list: &'static str, index: usize },
    #[error("{list}[{index}].cards[{card}] is missing `{field}`")]
    CardMissingField {
        list: &'static str,
        index: usize,
        card: usize,
        field: &'static str,
    },
    #[error("project id {0} appears more than once")]
    DuplicateProjectId(String),
    #[error("backup has the right shape but invalid values: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Serialize a snapshot as a backup file (pretty JSON).
pub fn export_snapshot(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

/// File name for a backup taken on `day`.
pub fn backup_file_name(day: NaiveDate) -> String {
    format!("dashboard_backup_{}.json", day.format("%Y-%m-%d"))
}

/// Parse and validate a backup file.
///
/// The structural pass checks every project has `id`, `name`, `color`, and a
/// `cards` array, and every card has `id`, `type`, and `content`. Only then
/// is the document decoded into typed values.
pub fn parse_backup(text: &str) -> Result<Snapshot, BackupError> {
    let value: Value = serde_json::from_str(text).map_err(BackupError::NotJson)?;
    validate_shape(&value)?;
    let snapshot: Snapshot = serde_json::from_value(value).map_err(BackupError::Malformed)?;

    let mut seen = HashSet::new();
    for p in snapshot.projects.iter().chain(snapshot.archive.iter()) {
        if !seen.insert(p.id.as_str()) {
            return Err(BackupError::DuplicateProjectId(p.id.clone()));
        }
    }
    Ok(snapshot)
}

fn validate_shape(value: &Value) -> Result<(), BackupError> {
    let obj = value.as_object().ok_or(BackupError::NotAnObject)?;

    let projects = obj
        .get("projects")
        .and_then(Value::as_array)
        .ok_or(BackupError::ProjectsNotArray)?;
    validate_projects("projects", projects)?;

    match obj.get("archive") {
        None | Some(Value::Null) => {}
        Some(Value::Array(archive)) => validate_projects("archive", archive)?,
        Some(_) => return Err(BackupError::ArchiveNotArray),
    }
    Ok(())
}

/// Present and not falsy: non-empty string, or any non-null value.
fn has_field(obj: &serde_json::Map<String, Value>, field: &str) -> bool {
    match obj.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn validate_projects(list: &'static str, projects: &[Value]) -> Result<(), BackupError> {
    for (index, project) in projects.iter().enumerate() {
        let obj = project
            .as_object()
            .ok_or(BackupError::ProjectNotObject { list, index })?;
        for field in ["id", "name", "color"] {
            if !has_field(obj, field) {
                return Err(BackupError::ProjectMissingField { list, index, field });
            }
        }
        let cards = obj
            .get("cards")
            .and_then(Value::as_array)
            .ok_or(BackupError::CardsNotArray { list, index })?;
        for (card, value) in cards.iter().enumerate() {
            let missing = |field| BackupError::CardMissingField {
                list,
                index,
                card,
                field,
            };
            let card_obj = value.as_object().ok_or_else(|| missing("id"))?;
            for field in ["id", "type"] {
                if !has_field(card_obj, field) {
                    return Err(missing(field));
                }
            }
            // Content may be empty text but must be present
            if !matches!(card_obj.get("content"), Some(Value::String(_))) {
                return Err(missing("content"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::CardType;
    use pretty_assertions::assert_eq;

    const VALID: &str = r##"{
      "projects": [
        {"id": "p1", "name": "Alpha", "color": "#3B82F6", "order": 0,
         "cards": [{"id": "c1", "type": "important", "content": "Ship", "completed": false,
                    "dueDate": "2026-03-01", "createdAt": "2026-02-01T00:00:00.000Z",
                    "updatedAt": "2026-02-01T00:00:00.000Z", "completedAt": null}],
         "createdAt": "2026-02-01T00:00:00.000Z", "updatedAt": "2026-02-01T00:00:00.000Z"}
      ],
      "archive": [],
      "columns": [["p1"]],
      "settings": {"lastActiveView": "today", "lastFocusedProject": null},
      "version": "2.0",
      "updatedAt": "2026-02-01T00:00:00.000Z"
    }"##;

    #[test]
    fn accepts_valid_backup() {
        let snapshot = parse_backup(VALID).unwrap();
        assert_eq!(snapshot.projects.len(), 1);
        let card = &snapshot.projects[0].cards[0];
        assert_eq!(card.due_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn accepts_legacy_backup_without_archive_or_columns() {
        let snapshot = parse_backup(r##"{"projects":[{"id":"p","name":"n","color":"#fff","cards":[]}]}"##).unwrap();
        assert!(snapshot.archive.is_empty());
        assert!(snapshot.columns.is_none());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(parse_backup("{oops"), Err(BackupError::NotJson(_))));
    }

    #[test]
    fn rejects_wrong_top_level() {
        assert!(matches!(parse_backup("[]"), Err(BackupError::NotAnObject)));
        assert!(matches!(parse_backup("{}"), Err(BackupError::ProjectsNotArray)));
        assert!(matches!(
            parse_backup(r#"{"projects":[],"archive":{}}"#),
            Err(BackupError::ArchiveNotArray)
        ));
    }

    #[test]
    fn names_the_missing_project_field() {
        let err = parse_backup(r##"{"projects":[{"id":"p","name":"","color":"#fff","cards":[]}]}"##).unwrap_err();
        assert_eq!(err.to_string(), "projects[0] is missing `name`");
    }

    #[test]
    fn names_the_missing_card_field() {
        let err = parse_backup(
            r##"{"projects":[],"archive":[{"id":"p","name":"n","color":"#fff","cards":[{"id":"c","content":"x"}]}]}"##,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "archive[0].cards[0] is missing `type`");
    }

    #[test]
    fn rejects_missing_cards_array() {
        let err = parse_backup(r##"{"projects":[{"id":"p","name":"n","color":"#fff"}]}"##).unwrap_err();
        assert!(matches!(err, BackupError::CardsNotArray { list: "projects", index: 0 }));
    }

    #[test]
    fn rejects_unknown_card_type() {
        let err = parse_backup(
            r##"{"projects":[{"id":"p","name":"n","color":"#fff","cards":[{"id":"c","type":"bogus","content":"x"}]}]}"##,
        )
        .unwrap_err();
        assert!(matches!(err, BackupError::Malformed(_)));
    }

    #[test]
    fn rejects_duplicate_ids_across_collections() {
        let err = parse_backup(
            r##"{"projects":[{"id":"p","name":"n","color":"#fff","cards":[]}],
                "archive":[{"id":"p","name":"m","color":"#000","cards":[]}]}"##,
        )
        .unwrap_err();
        assert!(matches!(err, BackupError::DuplicateProjectId(id) if id == "p"));
    }

    #[test]
    fn export_then_parse_round_trips() {
        let snapshot = parse_backup(VALID).unwrap();
        let text = export_snapshot(&snapshot).unwrap();
        assert_eq!(parse_backup(&text).unwrap(), snapshot);
    }

    #[test]
    fn undated_important_card_is_imported_as_task() {
        let snapshot = parse_backup(
            r##"{"projects":[{"id":"p","name":"n","color":"#fff",
                 "cards":[{"id":"c","type":"important","content":"x"}]}]}"##,
        )
        .unwrap();
        let board = snapshot.into_board();
        assert_eq!(board.projects[0].cards[0].card_type, CardType::Task);
    }

    #[test]
    fn backup_name() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(backup_file_name(day), "dashboard_backup_2026-10-16.json");
    }
}
