// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DATABASE_FILE: &str = "cashflow.db";
pub const DEFAULT_LOG_FILTER: &str = "cashflow_server=info,tower_http=info";
pub const SERVICE_NAME: &str = "cashflow-server";

// Token configuration
pub const DEFAULT_TOKEN_TTL: &str = "7d";
pub const MIN_TOKEN_SECRET_LENGTH: usize = 32;
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

// Database timeouts (seconds)
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DB_BUSY_TIMEOUT_SECS: u64 = 5;

// Listing limits and defaults
pub const DEFAULT_ENTRIES_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Error messages
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ERR_DUPLICATE_USER: &str = "Username already exists";
pub const ERR_NO_TOKEN: &str = "Authentication token not provided";
pub const ERR_INVALID_TOKEN: &str = "Invalid or expired token";
pub const ERR_MISSING_CREDENTIALS: &str = "Fields username and password are required";
