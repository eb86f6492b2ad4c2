use serde::{Deserialize, Serialize};

/// Registration body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
}

/// Full user row. The password is stored and listed as plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Registration response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    pub message: String,
    pub user_id: i64,
}
