//! Role and Permission Endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiResult};
use crate::auth::Permission;

/// A role with its granted permissions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_ids: Option<Vec<i64>>,
}

/// Role and permission operations
pub struct RolesApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl RolesApi<'_> {
    pub async fn list(&self) -> ApiResult<Vec<Role>> {
        self.client.get("/roles").await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Role> {
        self.client.get(&format!("/roles/{}", id)).await
    }

    pub async fn create(&self, request: &CreateRoleRequest) -> ApiResult<Role> {
        self.client.post("/roles", request).await
    }

    pub async fn update(&self, id: i64, request: &UpdateRoleRequest) -> ApiResult<Role> {
        self.client.put(&format!("/roles/{}", id), request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/roles/{}", id)).await
    }

    /// All assignable permissions
    pub async fn permissions(&self) -> ApiResult<Vec<Permission>> {
        self.client.get("/permissions").await
    }
}
