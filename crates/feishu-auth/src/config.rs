//! Application credentials

use common::Secret;

/// App id and secret issued by the Feishu developer console.
///
/// The secret is wrapped so it never shows up in Debug output or logs.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: Secret<String>,
}

impl AppCredentials {
    pub fn new(app_id: impl Into<String>, app_secret: Secret<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let creds = AppCredentials::new("cli_a1b2", "s3cr3t".into());
        let debug = format!("{creds:?}");
        assert!(debug.contains("cli_a1b2"));
        assert!(!debug.contains("s3cr3t"), "secret leaked: {debug}");
    }
}
