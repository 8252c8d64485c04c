use crate::folio::paths::FolioPaths;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at: String,
    pub operation: String,
    pub id: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(
    paths: &FolioPaths,
    operation: &str,
    id: &str,
    status: &str,
    message: &str,
) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at: chrono::Utc::now().to_rfc3339(),
        operation: operation.to_string(),
        id: id.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = paths.logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::append_event;
    use crate::folio::paths::FolioPaths;
    use tempfile::tempdir;

    #[test]
    fn events_append_one_json_line_each() {
        let tmp = tempdir().expect("tempdir");
        let mut paths = FolioPaths::for_tests(tmp.path());
        paths.logs_dir = tmp.path().join("logs");

        append_event(&paths, "add", "p_003", "active", "added maze").expect("first");
        append_event(&paths, "archive", "p_003", "archived", "archived maze").expect("second");

        let raw = std::fs::read_to_string(paths.logs_dir.join("audit.log")).expect("read");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["operation"], "add");
        assert_eq!(first["id"], "p_003");
        assert!(lines[1].contains("\"status\":\"archived\""));
    }
}
