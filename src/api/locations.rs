//! Location Hierarchy Endpoints
//!
//! Locations form a tree (site → building → line); scales hang off the
//! leaves.

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiResult};

/// A node in the location hierarchy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub level: u32,
    pub path: String,
}

/// A location with its children, as returned by the tree endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTree {
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub children: Vec<LocationTree>,
    #[serde(default)]
    pub scale_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Location hierarchy operations
pub struct LocationsApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl LocationsApi<'_> {
    pub async fn list(&self) -> ApiResult<Vec<Location>> {
        self.client.get("/locations").await
    }

    pub async fn tree(&self) -> ApiResult<Vec<LocationTree>> {
        self.client.get("/locations/tree").await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Location> {
        self.client.get(&format!("/locations/{}", id)).await
    }

    pub async fn create(&self, request: &CreateLocationRequest) -> ApiResult<Location> {
        self.client.post("/locations", request).await
    }

    pub async fn update(&self, id: i64, request: &UpdateLocationRequest) -> ApiResult<Location> {
        self.client.put(&format!("/locations/{}", id), request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/locations/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_deserializes_nested_children() {
        let json = r#"{
            "id": 1,
            "name": "Plant 1",
            "code": "P1",
            "level": 0,
            "path": "/P1",
            "scaleCount": 4,
            "children": [
                {
                    "id": 2,
                    "name": "Line A",
                    "code": "P1-A",
                    "parentId": 1,
                    "level": 1,
                    "path": "/P1/P1-A",
                    "children": []
                }
            ]
        }"#;
        let tree: LocationTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.location.code, "P1");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].location.parent_id, Some(1));
        assert_eq!(tree.scale_count, Some(4));
    }
}
