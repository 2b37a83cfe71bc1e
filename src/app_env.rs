/// URL for the SQLite database backing the relational adapter (e.g. `sqlite://taskboard.db`)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Accepts any directive understood by
/// [tracing_subscriber's EnvFilter](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// TCP port the HTTP server binds to (3001 if unset)
pub const SERVER_PORT: &str = "SERVER_PORT";

/// Which backend adapter the client façade should drive: "database", "hosted-api", or "memory"
pub const TASK_BACKEND: &str = "TASK_BACKEND";
/// Base URL of the hosted backend when [TASK_BACKEND] is "hosted-api"
pub const BACKEND_BASE_URL: &str = "BACKEND_BASE_URL";
/// API key sent to the hosted backend on every request
pub const BACKEND_API_KEY: &str = "BACKEND_API_KEY";
