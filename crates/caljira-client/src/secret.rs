//! Secret reference resolver.
//!
//! Credential values in `config.toml` may point outside the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used as-is

use std::process::Command;

use tracing::debug;

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value, keeping `None` as `None`.
pub fn resolve_opt(value: Option<&str>) -> Result<Option<String>, String> {
    value.map(resolve).transpose()
}

fn resolve_pass(path: &str) -> Result<String, String> {
    debug!("resolving secret from pass entry {}", path);
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("alice").unwrap(), "alice");
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(
            resolve("https://jira.example.com").unwrap(),
            "https://jira.example.com"
        );
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_CALJIRA_TEST_SECRET", "my-secret-value");
        }
        assert_eq!(
            resolve("env::_CALJIRA_TEST_SECRET").unwrap(),
            "my-secret-value"
        );
        unsafe {
            std::env::remove_var("_CALJIRA_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_CALJIRA_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn pass_prefix_missing_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }

    #[test]
    fn resolve_opt_keeps_none() {
        assert_eq!(resolve_opt(None).unwrap(), None);
        assert_eq!(resolve_opt(Some("x")).unwrap(), Some("x".to_string()));
    }
}
