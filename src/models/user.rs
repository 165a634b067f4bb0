use serde::{Deserialize, Serialize};

/// Account owned by the external identity system. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub email_verified: Option<String>,
    pub image: Option<String>,
}
