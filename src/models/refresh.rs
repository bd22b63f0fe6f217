use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored refresh token. Created at login (outside this crate), deleted
/// either at logout or by the expiry sweeper once `expiration` has passed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshRecord {
    pub token_value: String,
    pub expiration: DateTime<Utc>,
}
