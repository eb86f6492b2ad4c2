use std::env;
use std::fmt;
use std::str::FromStr;

/// Which store implementation backs the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Pick based on which connection settings are present
    Auto,
    Postgres,
    Postgrest,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "postgrest" | "supabase" | "rest" => Ok(Self::Postgrest),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Postgres => "postgres",
            Self::Postgrest => "postgrest",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub app_env: String,

    // Store selection
    pub store_backend: StoreBackend,

    // PostgreSQL
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub run_migrations: bool,

    // Hosted PostgREST service
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),

            store_backend: env::var("STORE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(StoreBackend::Auto),

            // PostgreSQL
            database_url: non_empty_var("DATABASE_URL"),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            // Hosted PostgREST service
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_key: non_empty_var("SUPABASE_KEY"),
        }
    }

    /// Resolve `Auto` into a concrete backend
    pub fn resolved_backend(&self) -> StoreBackend {
        match self.store_backend {
            StoreBackend::Auto if self.supabase_url.is_some() => StoreBackend::Postgrest,
            StoreBackend::Auto if self.database_url.is_some() => StoreBackend::Postgres,
            StoreBackend::Auto => StoreBackend::Memory,
            other => other,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
