use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct NetmonConfig {
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub troubleshoot_base_url: String,
    pub troubleshoot_model: String,
    pub troubleshoot_timeout_seconds: u64,
    pub alerts_default_limit: u64,
}

impl NetmonConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("NETMON_DATABASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("NETMON_DATABASE_URL must be set for the monitoring server")?;
        let database_url = normalize_database_url(database_url);
        if database_url.trim().is_empty() {
            anyhow::bail!("NETMON_DATABASE_URL resolved to an empty value");
        }

        let gemini_api_key = env_optional_string("GEMINI_API_KEY");
        let troubleshoot_base_url = env_string(
            "NETMON_TROUBLESHOOT_BASE_URL",
            "https://generativelanguage.googleapis.com",
        );
        let troubleshoot_model = env_string("NETMON_TROUBLESHOOT_MODEL", "gemini-2.0-flash");
        let troubleshoot_timeout_seconds =
            env_u64("NETMON_TROUBLESHOOT_TIMEOUT_SECONDS", 30).clamp(1, 300);
        let alerts_default_limit = env_u64("NETMON_ALERTS_DEFAULT_LIMIT", 100).clamp(1, 1000);

        Ok(Self {
            database_url,
            gemini_api_key,
            troubleshoot_base_url,
            troubleshoot_model,
            troubleshoot_timeout_seconds,
            alerts_default_limit,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_sqlalchemy_style_urls() {
        assert_eq!(
            normalize_database_url("postgresql+psycopg://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
        assert_eq!(
            normalize_database_url("postgresql+asyncpg://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
        assert_eq!(
            normalize_database_url("postgresql://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
    }

    #[test]
    fn env_u64_falls_back_on_garbage() {
        std::env::set_var("NETMON_TEST_U64", "not-a-number");
        assert_eq!(env_u64("NETMON_TEST_U64", 42), 42);
        std::env::remove_var("NETMON_TEST_U64");
    }
}
