use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub finder: FinderConfig,
    pub providers: ProviderConfig,
    pub limits: LimitConfig,
    pub credits: CreditConfig,
    pub exports: ExportConfig,
    pub cache: CacheConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub export_link_ttl_hours: u64,
}

/// Tuning knobs for the email finder pipeline. Every timeout here is a hard
/// cap: when it elapses the lookup reports "not found" rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Candidate patterns generated per search when the caller does not say.
    pub default_candidates: usize,
    /// Upper bound on candidates submitted in a single provider batch.
    pub batch_cap: usize,
    /// Hot-path batch verification timeout.
    pub batch_timeout_ms: u64,
    /// Short pre-pass timeout inside the single-lookup budget.
    pub quick_probe_timeout_ms: u64,
    /// Overall budget for the two-step single lookup.
    pub single_lookup_budget_ms: u64,
    /// Per-candidate timeout for individual probes.
    pub probe_timeout_ms: u64,
    /// Simultaneous probes in the concurrent-until-first-match strategy.
    pub max_concurrency: usize,
    /// Simultaneous probes during bulk direct verification.
    pub bulk_concurrency: usize,
    /// Hard cap on emails accepted by the bulk endpoint.
    pub bulk_max_emails: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which verifier backs the finder: "truelist" or "bulkmailverifier".
    pub verifier: String,
    pub poll_interval_ms: u64,
    pub poll_deadline_ms: u64,
    pub http_timeout_secs: u64,
    pub truelist_base_url: String,
    pub truelist_api_key: Option<String>,
    pub bulkmail_base_url: String,
    pub bulkmail_api_key: Option<String>,
    pub icypeas_base_url: String,
    pub icypeas_api_key: Option<String>,
    pub icypeas_api_secret: Option<String>,
}

/// Monthly per-feature caps. `None` means unlimited, `Some(0)` means the
/// feature is switched off for that tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureLimits {
    pub email_finder: Option<i64>,
    pub email_verifier: Option<i64>,
    pub bulk_verifier: Option<i64>,
    pub ai_chat: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub free: FeatureLimits,
    pub pro: FeatureLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditConfig {
    pub starting_free: i64,
    pub starting_pro: i64,
    /// Credits charged for one provider-confirmed find.
    pub find_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub user_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl FeatureLimits {
    fn free_tier() -> Self {
        Self {
            email_finder: Some(10),
            email_verifier: Some(25),
            bulk_verifier: Some(0),
            ai_chat: Some(5),
        }
    }

    fn pro_tier() -> Self {
        Self {
            email_finder: None,
            email_verifier: None,
            bulk_verifier: Some(500),
            ai_chat: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_EXPORT_LINK_TTL_HOURS") {
            self.security.export_link_ttl_hours = v.parse().unwrap_or(self.security.export_link_ttl_hours);
        }

        // Finder overrides
        if let Ok(v) = env::var("FINDER_DEFAULT_CANDIDATES") {
            self.finder.default_candidates = v.parse().unwrap_or(self.finder.default_candidates);
        }
        if let Ok(v) = env::var("FINDER_BATCH_TIMEOUT_MS") {
            self.finder.batch_timeout_ms = v.parse().unwrap_or(self.finder.batch_timeout_ms);
        }
        if let Ok(v) = env::var("FINDER_MAX_CONCURRENCY") {
            self.finder.max_concurrency = v.parse().unwrap_or(self.finder.max_concurrency);
        }
        if let Ok(v) = env::var("FINDER_BULK_CONCURRENCY") {
            self.finder.bulk_concurrency = v.parse().unwrap_or(self.finder.bulk_concurrency);
        }
        if let Ok(v) = env::var("FINDER_BULK_MAX_EMAILS") {
            self.finder.bulk_max_emails = v.parse().unwrap_or(self.finder.bulk_max_emails);
        }

        // Provider overrides
        if let Ok(v) = env::var("VERIFIER_PROVIDER") {
            self.providers.verifier = v;
        }
        if let Ok(v) = env::var("PROVIDERS_POLL_DEADLINE_MS") {
            self.providers.poll_deadline_ms = v.parse().unwrap_or(self.providers.poll_deadline_ms);
        }
        if let Ok(v) = env::var("TRUELIST_BASE_URL") {
            self.providers.truelist_base_url = v;
        }
        if let Ok(v) = env::var("TRUELIST_API_KEY") {
            self.providers.truelist_api_key = Some(v);
        }
        if let Ok(v) = env::var("BULKMAILVERIFIER_BASE_URL") {
            self.providers.bulkmail_base_url = v;
        }
        if let Ok(v) = env::var("BULKMAILVERIFIER_API_KEY") {
            self.providers.bulkmail_api_key = Some(v);
        }
        if let Ok(v) = env::var("ICYPEAS_BASE_URL") {
            self.providers.icypeas_base_url = v;
        }
        if let Ok(v) = env::var("ICYPEAS_API_KEY") {
            self.providers.icypeas_api_key = Some(v);
        }
        if let Ok(v) = env::var("ICYPEAS_API_SECRET") {
            self.providers.icypeas_api_secret = Some(v);
        }

        // Export overrides
        if let Ok(v) = env::var("EXPORTS_DIR") {
            self.exports.dir = v;
        }

        // Cache overrides
        if let Ok(v) = env::var("CACHE_ENABLED") {
            self.cache.enabled = v.parse().unwrap_or(self.cache.enabled);
        }
        if let Ok(v) = env::var("CACHE_USER_TTL_SECS") {
            self.cache.user_ttl_secs = v.parse().unwrap_or(self.cache.user_ttl_secs);
        }

        // Chat overrides
        if let Ok(v) = env::var("CHAT_BASE_URL") {
            self.chat.base_url = v;
        }
        if let Ok(v) = env::var("CHAT_API_KEY") {
            self.chat.api_key = Some(v);
        }
        if let Ok(v) = env::var("CHAT_MODEL") {
            self.chat.model = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                require_https: false,
                jwt_secret: "dev-secret-do-not-use-in-production".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                export_link_ttl_hours: 24,
            },
            finder: Self::default_finder(),
            providers: Self::default_providers(),
            limits: LimitConfig {
                free: FeatureLimits::free_tier(),
                pro: FeatureLimits::pro_tier(),
            },
            credits: CreditConfig {
                starting_free: 25,
                starting_pro: 1000,
                find_cost: 1,
            },
            exports: ExportConfig {
                dir: "./exports".to_string(),
            },
            cache: CacheConfig {
                enabled: true,
                user_ttl_secs: 60,
            },
            chat: ChatConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.scout.example.com".to_string()],
                require_https: true,
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24,
                export_link_ttl_hours: 24,
            },
            finder: Self::default_finder(),
            providers: Self::default_providers(),
            limits: LimitConfig {
                free: FeatureLimits::free_tier(),
                pro: FeatureLimits::pro_tier(),
            },
            credits: CreditConfig {
                starting_free: 25,
                starting_pro: 1000,
                find_cost: 1,
            },
            exports: ExportConfig {
                dir: "/var/lib/scout/exports".to_string(),
            },
            cache: CacheConfig {
                enabled: true,
                user_ttl_secs: 120,
            },
            chat: ChatConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.scout.example.com".to_string()],
                require_https: true,
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 4,
                export_link_ttl_hours: 24,
            },
            finder: Self::default_finder(),
            providers: Self::default_providers(),
            limits: LimitConfig {
                free: FeatureLimits::free_tier(),
                pro: FeatureLimits::pro_tier(),
            },
            credits: CreditConfig {
                starting_free: 25,
                starting_pro: 1000,
                find_cost: 1,
            },
            exports: ExportConfig {
                dir: "/var/lib/scout/exports".to_string(),
            },
            cache: CacheConfig {
                enabled: true,
                user_ttl_secs: 300,
            },
            chat: ChatConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }

    // Timing defaults are the same across environments; env vars tune them.
    fn default_finder() -> FinderConfig {
        FinderConfig {
            default_candidates: 30,
            batch_cap: 51,
            batch_timeout_ms: 2000,
            quick_probe_timeout_ms: 500,
            single_lookup_budget_ms: 3000,
            probe_timeout_ms: 5000,
            max_concurrency: 5,
            bulk_concurrency: 20,
            bulk_max_emails: 1000,
        }
    }

    fn default_providers() -> ProviderConfig {
        ProviderConfig {
            verifier: "truelist".to_string(),
            poll_interval_ms: 250,
            poll_deadline_ms: 30_000,
            http_timeout_secs: 10,
            truelist_base_url: "https://api.truelist.io".to_string(),
            truelist_api_key: None,
            bulkmail_base_url: "https://api.bulkmailverifier.com".to_string(),
            bulkmail_api_key: None,
            icypeas_base_url: "https://app.icypeas.com/api".to_string(),
            icypeas_api_key: None,
            icypeas_api_secret: None,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
