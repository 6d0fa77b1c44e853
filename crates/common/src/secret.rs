//! Secret wrapper for sensitive values

use std::fmt;
use std::path::Path;

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Sensitive value - redacted in Debug/Display/logs
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Resolve a secret from an environment variable, falling back to a file.
///
/// The env var wins when set. File contents are trimmed; an empty file
/// counts as missing. Returns `Error::Secret` when neither source yields a
/// value, and `Error::Config` when the file is configured but unreadable.
pub fn resolve_secret(env_var: &str, file: Option<&Path>) -> Result<Secret<String>> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Ok(Secret::new(value));
        }
    }

    if let Some(path) = file {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read secret file {}: {e}", path.display()))
        })?;
        let value = contents.trim().to_owned();
        if !value.is_empty() {
            return Ok(Secret::new(value));
        }
    }

    Err(Error::Secret(format!(
        "set {env_var} or provide a non-empty secret file"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_secret_redacts_debug() {
        let secret = Secret::new(String::from("app-secret-value"));
        let debug = format!("{:?}", secret);
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("app-secret-value"));
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn test_secret_exposes_value() {
        let secret: Secret<String> = "app-secret-value".into();
        assert_eq!(secret.expose(), "app-secret-value");
    }

    #[test]
    fn resolve_prefers_env_over_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = std::env::temp_dir().join("common-secret-env-wins");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secret");
        std::fs::write(&path, "from-file").unwrap();

        unsafe { std::env::set_var("COMMON_TEST_SECRET_A", "from-env") };
        let secret = resolve_secret("COMMON_TEST_SECRET_A", Some(&path)).unwrap();
        assert_eq!(secret.expose(), "from-env");
        unsafe { std::env::remove_var("COMMON_TEST_SECRET_A") };

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_reads_trimmed_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = std::env::temp_dir().join("common-secret-file");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secret");
        std::fs::write(&path, "  from-file\n").unwrap();

        unsafe { std::env::remove_var("COMMON_TEST_SECRET_B") };
        let secret = resolve_secret("COMMON_TEST_SECRET_B", Some(&path)).unwrap();
        assert_eq!(secret.expose(), "from-file");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_fails_without_any_source() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("COMMON_TEST_SECRET_C") };
        let err = resolve_secret("COMMON_TEST_SECRET_C", None).unwrap_err();
        assert!(matches!(err, Error::Secret(_)), "got: {err:?}");
    }

    #[test]
    fn resolve_rejects_unreadable_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { std::env::remove_var("COMMON_TEST_SECRET_D") };
        let err = resolve_secret(
            "COMMON_TEST_SECRET_D",
            Some(Path::new("/nonexistent/feishu/secret")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err:?}");
    }
}
