//! Wire shapes of the backend's auth and user endpoints.

use agentdesk_core::models::auth::{AdminUser, CollaboratorUser, LoginGrant, Role};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub connection_history_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub uid: String,
}

impl From<LoginResponse> for LoginGrant {
    fn from(r: LoginResponse) -> Self {
        LoginGrant {
            credential: r.token,
            refresh_credential: r.refresh_token,
            email: r.email,
            credential_lifetime_secs: r.expires_in,
            connection_history_id: r.connection_history_id,
            subject_id: r.uid,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub uid: String,
    #[serde(default = "default_admin_role")]
    pub role: Role,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

impl From<AdminResponse> for AdminUser {
    fn from(r: AdminResponse) -> Self {
        AdminUser {
            uid: r.uid,
            role: r.role,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            company_name: r.company_name,
            products: r.products,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollaboratorResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub admin_uid: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

impl From<CollaboratorResponse> for CollaboratorUser {
    fn from(r: CollaboratorResponse) -> Self {
        CollaboratorUser {
            uid: r.uid,
            role: Role::Collaborator,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            admin_uid: r.admin_uid,
            products: r.products,
        }
    }
}

fn default_admin_role() -> Role {
    Role::Admin
}

/// Accept ids serialized either as strings or as integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
