//! User Management Endpoints

use serde::{Deserialize, Serialize};

use super::dto::Page;
use super::{ApiClient, ApiResult};
use crate::auth::RoleRef;

/// A platform user as managed by administrators
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub status: UserStatus,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Locked,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<i64>>,
}

/// User management operations
pub struct UsersApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl UsersApi<'_> {
    pub async fn list(&self, page: u32, size: u32) -> ApiResult<Page<User>> {
        self.client
            .get(&format!("/users?page={}&size={}", page, size))
            .await
    }

    pub async fn get(&self, id: i64) -> ApiResult<User> {
        self.client.get(&format!("/users/{}", id)).await
    }

    pub async fn create(&self, request: &CreateUserRequest) -> ApiResult<User> {
        self.client.post("/users", request).await
    }

    pub async fn update(&self, id: i64, request: &UpdateUserRequest) -> ApiResult<User> {
        self.client.put(&format!("/users/{}", id), request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/users/{}", id)).await
    }
}
