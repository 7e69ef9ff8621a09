use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn append_json_line(path: &Path, payload: &Value) -> std::io::Result<()> {
    let line = serde_json::to_string(payload).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")
}
