use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: RecordId,
    pub user_name: Option<String>,
    pub email: String, // ! unique & (len = 255)
    pub email_verified: Option<bool>,
    pub created_at: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct UserReqForSignUp {
    pub user_name: String,
    pub email: String,
    pub email_verified: bool,
    pub created_at: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserWithPassword {
    pub id: RecordId,
    pub user_id: RecordId,
    pub password_hash: String, // ! & (len = 255)
}

#[derive(Serialize, Debug, Clone)]
pub struct UserReqWithPassword {
    pub user_id: RecordId,
    pub password_hash: String,
}
