use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::remote::UserId;

/// Who is signed in on this data directory (written to .session.json)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub identity: Option<UserId>,
}

/// Read .session.json. A missing or unreadable file means signed out.
pub fn read_session(data_dir: &Path) -> Session {
    let path = data_dir.join(".session.json");
    let Ok(content) = fs::read_to_string(&path) else {
        return Session::default();
    };
    match serde_json::from_str(&content) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed session file");
            Session::default()
        }
    }
}

/// Write .session.json, or remove it when signed out.
pub fn write_session(data_dir: &Path, session: &Session) -> Result<(), std::io::Error> {
    let path = data_dir.join(".session.json");
    if session.identity.is_none() {
        return match fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        };
    }
    let content = serde_json::to_string_pretty(session)?;
    crate::io::local_cache::atomic_write(&path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let session = Session {
            identity: Some(UserId::new("alice")),
        };
        write_session(dir.path(), &session).unwrap();
        assert_eq!(read_session(dir.path()), session);
    }

    #[test]
    fn signing_out_removes_the_file() {
        let dir = TempDir::new().unwrap();
        write_session(
            dir.path(),
            &Session {
                identity: Some(UserId::new("alice")),
            },
        )
        .unwrap();
        write_session(dir.path(), &Session::default()).unwrap();
        assert!(!dir.path().join(".session.json").exists());
        // Removing twice is fine
        write_session(dir.path(), &Session::default()).unwrap();
    }

    #[test]
    fn malformed_file_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".session.json"), "not json {{{").unwrap();
        assert_eq!(read_session(dir.path()), Session::default());
    }
}
