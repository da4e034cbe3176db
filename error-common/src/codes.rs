// Error codes shared by every portal crate.
// Codes are part of the HTTP contract; never renumber an existing one.

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const UNKNOWN_PERMISSION: &str = "VALIDATION_1002";
    pub const SCOPE_MISMATCH: &str = "VALIDATION_1003";
    pub const INVALID_IDENTIFIER: &str = "VALIDATION_1004";
}

pub mod authentication {
    pub const MISSING_SUBJECT: &str = "AUTH_2001";
    pub const INVALID_CREDENTIALS: &str = "AUTH_2002";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const ENGINE_UNAVAILABLE: &str = "AUTHZ_3002";
    pub const ENGINE_REJECTED: &str = "AUTHZ_3003";
    pub const MISCONFIGURED: &str = "AUTHZ_3004";
}

pub mod database {
    pub const QUERY_FAILED: &str = "DB_4001";
    pub const CONSTRAINT_VIOLATION: &str = "DB_4002";
    pub const NOT_FOUND: &str = "DB_4003";
}
