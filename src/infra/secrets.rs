//! API key lookup.
//!
//! The key is read from an inline setting when present, otherwise from a
//! local secret file kept out of version control. A missing file is not fatal:
//! the server still starts and render calls report the missing key.

use std::{fs, io::ErrorKind, path::Path};

use tracing::warn;

use crate::config::RendererSettings;

use super::error::InfraError;

const SOURCE: &str = "cyclemap::secrets";

pub fn resolve_api_key(settings: &RendererSettings) -> Result<Option<String>, InfraError> {
    if let Some(key) = settings.api_key.as_ref() {
        return Ok(Some(key.clone()));
    }
    read_api_key_file(&settings.api_key_file)
}

pub fn read_api_key_file(path: &Path) -> Result<Option<String>, InfraError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let key = contents.trim();
            if key.is_empty() {
                warn!(
                    target = SOURCE,
                    path = %path.display(),
                    "API key file is empty; rendering requests will be rejected"
                );
                return Ok(None);
            }
            Ok(Some(key.to_string()))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(
                target = SOURCE,
                path = %path.display(),
                "API key file not found; rendering requests will be rejected"
            );
            Ok(None)
        }
        Err(err) => Err(InfraError::configuration(format!(
            "failed to read API key file `{}`: {err}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    use tempfile::NamedTempFile;
    use url::Url;

    use super::*;

    fn settings(api_key: Option<&str>, file: PathBuf) -> RendererSettings {
        RendererSettings {
            endpoint: Url::parse("https://maps.example.test/v1/staticmap").expect("url"),
            api_key: api_key.map(str::to_string),
            api_key_file: file,
            fetch_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(60),
        }
    }

    fn key_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tmp file");
        file.write_all(contents.as_bytes()).expect("write key");
        file
    }

    #[test]
    fn key_file_contents_are_trimmed() {
        let file = key_file("  secret-key\n");
        let key = read_api_key_file(file.path()).expect("readable");
        assert_eq!(key.as_deref(), Some("secret-key"));
    }

    #[test]
    fn missing_key_file_yields_none() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let key = read_api_key_file(&dir.path().join("absent")).expect("not fatal");
        assert_eq!(key, None);
    }

    #[test]
    fn blank_key_file_yields_none() {
        let file = key_file("\n\n");
        assert_eq!(read_api_key_file(file.path()).expect("readable"), None);
    }

    #[test]
    fn inline_key_wins_over_file() {
        let file = key_file("from-file");
        let resolved = resolve_api_key(&settings(Some("inline"), file.path().to_path_buf()))
            .expect("resolved");
        assert_eq!(resolved.as_deref(), Some("inline"));

        let resolved =
            resolve_api_key(&settings(None, file.path().to_path_buf())).expect("resolved");
        assert_eq!(resolved.as_deref(), Some("from-file"));
    }
}
