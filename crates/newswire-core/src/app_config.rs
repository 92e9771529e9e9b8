use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// The subset of settings needed to fetch feeds, with no database or
/// classifier endpoint. Every field has a default.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub env: Environment,
    pub log_level: String,
    pub feeds_path: PathBuf,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_feeds: usize,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub feeds_path: PathBuf,
    pub schedule_cron: String,
    pub classifier_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub classifier_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_feeds: usize,
    pub max_concurrent_images: usize,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
}

impl AppConfig {
    /// The fetch-only subset of this configuration.
    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            env: self.env.clone(),
            log_level: self.log_level.clone(),
            feeds_path: self.feeds_path.clone(),
            user_agent: self.user_agent.clone(),
            fetch_timeout_secs: self.fetch_timeout_secs,
            max_concurrent_feeds: self.max_concurrent_feeds,
            fetch_max_retries: self.fetch_max_retries,
            fetch_retry_backoff_ms: self.fetch_retry_backoff_ms,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("feeds_path", &self.feeds_path)
            .field("schedule_cron", &self.schedule_cron)
            .field("database_url", &"[redacted]")
            .field("classifier_url", &self.classifier_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("classifier_timeout_secs", &self.classifier_timeout_secs)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_feeds", &self.max_concurrent_feeds)
            .field("max_concurrent_images", &self.max_concurrent_images)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_retry_backoff_ms", &self.fetch_retry_backoff_ms)
            .finish()
    }
}
