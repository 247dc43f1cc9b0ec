//! Hands host credentials to git without putting them on a command line.
//!
//! The password is written to a short-lived `GIT_ASKPASS` script that answers
//! git's username and password prompts. The script is created with owner-only
//! permissions under a random name and deleted when [`AuthEnv`] is dropped.

use std::path::PathBuf;

use secrecy::ExposeSecret;

use super::error::SyncError;
use crate::registry::Credential;

/// Escapes a value for use inside single quotes in a POSIX shell script.
pub fn shell_escape(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Escapes batch metacharacters for a Windows askpass script.
#[cfg(windows)]
fn escape_for_windows_batch(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 2);
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%%"),
            '^' | '&' | '|' | '<' | '>' | '(' | ')' | '"' => {
                escaped.push('^');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Deletes the askpass script on drop.
#[derive(Debug)]
pub struct AskpassCleanup {
    path: Option<PathBuf>,
}

impl AskpassCleanup {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub(crate) fn empty() -> Self {
        Self { path: None }
    }
}

impl Drop for AskpassCleanup {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to clean up askpass script: {}", e);
            }
        }
    }
}

/// Environment for git commands of one sync. Must outlive those commands.
#[derive(Debug)]
pub struct AuthEnv {
    pub env_vars: Vec<(String, String)>,
    _cleanup: AskpassCleanup,
}

impl AuthEnv {
    /// Environment for anonymous access: prompts disabled, nothing else.
    pub fn anonymous() -> Self {
        Self {
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            _cleanup: AskpassCleanup::empty(),
        }
    }

    pub fn has_askpass(&self) -> bool {
        self.env_vars.iter().any(|(k, _)| k == "GIT_ASKPASS")
    }
}

/// Builds the git environment for an optional credential.
pub fn build_auth_env(credential: Option<&Credential>) -> Result<AuthEnv, SyncError> {
    let Some(credential) = credential else {
        return Ok(AuthEnv::anonymous());
    };

    let random_suffix = uuid::Uuid::new_v4().to_string();
    let temp_dir = std::env::temp_dir();

    #[cfg(unix)]
    let (askpass_path, script) = {
        let path = temp_dir.join(format!(".repoview-askpass-{}.sh", random_suffix));
        let script = format!(
            "#!/bin/sh\ncase \"$1\" in\n  Username*) echo '{}' ;;\n  *) echo '{}' ;;\nesac\n",
            shell_escape(&credential.username),
            shell_escape(credential.password.expose_secret()),
        );
        (path, script)
    };

    #[cfg(windows)]
    let (askpass_path, script) = {
        let path = temp_dir.join(format!(".repoview-askpass-{}.bat", random_suffix));
        let script = format!(
            "@echo off\r\necho %1 | findstr /b \"Username\" >nul && (echo {}) || (echo {})\r\n",
            escape_for_windows_batch(&credential.username),
            escape_for_windows_batch(credential.password.expose_secret()),
        );
        (path, script)
    };

    write_script(&askpass_path, &script)
        .map_err(|e| SyncError::Askpass(format!("{}: {}", askpass_path.display(), e)))?;
    let cleanup = AskpassCleanup::new(askpass_path.clone());

    let askpass = askpass_path
        .to_str()
        .ok_or_else(|| {
            SyncError::Askpass("Temp directory path contains non-UTF8 characters".to_string())
        })?
        .to_string();

    let mut env = AuthEnv::anonymous().env_vars;
    env.push(("GIT_ASKPASS".to_string(), askpass));

    Ok(AuthEnv {
        env_vars: env,
        _cleanup: cleanup,
    })
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, script: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o700)
        .open(path)?;
    file.write_all(script.as_bytes())
}

#[cfg(not(unix))]
fn write_script(path: &std::path::Path, script: &str) -> std::io::Result<()> {
    std::fs::write(path, script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn credential(password: &str) -> Credential {
        Credential {
            host: "github.com".to_string(),
            username: "foo".to_string(),
            password: SecretString::from(password),
        }
    }

    #[test]
    fn test_anonymous_env_disables_prompts() {
        let auth = build_auth_env(None).unwrap();
        assert!(!auth.has_askpass());
        assert!(auth
            .env_vars
            .contains(&("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())));
    }

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("simple"), "simple");
        assert_eq!(shell_escape("it's"), "it'\\''s");
    }

    #[cfg(unix)]
    #[test]
    fn test_askpass_answers_both_prompts_and_is_removed() {
        let auth = build_auth_env(Some(&credential("pa'ss"))).unwrap();
        let script = auth
            .env_vars
            .iter()
            .find(|(k, _)| k == "GIT_ASKPASS")
            .map(|(_, v)| PathBuf::from(v))
            .unwrap();

        let ask = |prompt: &str| {
            let out = std::process::Command::new(&script).arg(prompt).output().unwrap();
            String::from_utf8(out.stdout).unwrap().trim().to_string()
        };
        assert_eq!(ask("Username for 'https://github.com': "), "foo");
        assert_eq!(ask("Password for 'https://foo@github.com': "), "pa'ss");

        drop(auth);
        assert!(!script.exists());
    }
}
