//! API credential lookup: environment first, then the local secrets file.

use log::debug;
use std::path::Path;

/// Environment variable and secrets-file key holding the API credential.
pub const API_KEY_NAME: &str = "OPENAI_API_KEY";

/// Resolves the credential from the process environment and `secrets_path`.
pub fn resolve_api_key(secrets_path: Option<&Path>) -> Option<String> {
    let from_env = std::env::var(API_KEY_NAME).ok();
    let from_file = secrets_path.and_then(read_secret_file);
    pick_api_key(from_env, from_file)
}

/// Environment value wins when non-blank; otherwise the secrets-file value.
pub fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
    let normalize = |value: String| {
        let trimmed = value.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };
    match from_env.and_then(normalize) {
        Some(key) => {
            debug!("event=credential_resolve module=enrich status=ok source=env");
            Some(key)
        }
        None => {
            let key = from_file.and_then(normalize);
            debug!(
                "event=credential_resolve module=enrich status={} source=secrets_file",
                if key.is_some() { "ok" } else { "skip" }
            );
            key
        }
    }
}

/// Reads `API_KEY_NAME` from a TOML secrets file; missing or invalid files
/// yield `None`.
pub fn read_secret_file(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let table = text.parse::<toml::Table>().ok()?;
    table
        .get(API_KEY_NAME)
        .and_then(toml::Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{pick_api_key, read_secret_file};

    #[test]
    fn env_takes_precedence_over_file() {
        let key = pick_api_key(Some("env-key".to_string()), Some("file-key".to_string()));
        assert_eq!(key.as_deref(), Some("env-key"));
    }

    #[test]
    fn blank_env_falls_back_to_file() {
        let key = pick_api_key(Some("   ".to_string()), Some(" file-key ".to_string()));
        assert_eq!(key.as_deref(), Some("file-key"));
        assert_eq!(pick_api_key(None, None), None);
    }

    #[test]
    fn secrets_file_is_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "OPENAI_API_KEY = \"sk-test\"\nOTHER = 1\n").unwrap();
        assert_eq!(read_secret_file(&path).as_deref(), Some("sk-test"));

        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(read_secret_file(&path), None);
        assert_eq!(read_secret_file(&dir.path().join("missing.toml")), None);
    }
}
