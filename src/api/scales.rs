//! Scale Device Endpoints
//!
//! CRUD for scale devices and their protocol configuration (Modbus
//! TCP/RTU or serial). These are thin pass-throughs; all validation and
//! polling live in the backend.

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiResult};
use crate::realtime::ScaleStatus;

/// A scale device
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    pub location_id: i64,
    pub location_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub status: Option<ScaleStatus>,
    #[serde(default)]
    pub scale_config: Option<ScaleConfig>,
}

/// Protocol configuration for a scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleConfig {
    pub scale_id: i64,
    pub protocol: Protocol,

    // Modbus TCP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<u8>,

    // Serial / Modbus RTU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_bits: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_bits: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parity: Option<SerialParity>,

    // Register layout
    pub register_address: u16,
    pub register_count: u16,
    pub data_type: RegisterDataType,

    // Polling
    pub poll_interval: u64,
    pub timeout: u64,
    pub retry_attempts: u32,
}

/// Wire protocol used to poll the scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    ModbusTcp,
    ModbusRtu,
    Serial,
}

/// Serial line parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerialParity {
    None,
    Odd,
    Even,
}

/// Register value encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterDataType {
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScaleRequest {
    pub name: String,
    pub location_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScaleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Scale device operations
pub struct ScalesApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl ScalesApi<'_> {
    pub async fn list(&self) -> ApiResult<Vec<Scale>> {
        self.client.get("/scales").await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Scale> {
        self.client.get(&format!("/scales/{}", id)).await
    }

    pub async fn create(&self, request: &CreateScaleRequest) -> ApiResult<Scale> {
        self.client.post("/scales", request).await
    }

    pub async fn update(&self, id: i64, request: &UpdateScaleRequest) -> ApiResult<Scale> {
        self.client.put(&format!("/scales/{}", id), request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/scales/{}", id)).await
    }

    pub async fn config(&self, id: i64) -> ApiResult<ScaleConfig> {
        self.client.get(&format!("/scales/{}/config", id)).await
    }

    pub async fn update_config(&self, id: i64, config: &ScaleConfig) -> ApiResult<ScaleConfig> {
        self.client
            .put(&format!("/scales/{}/config", id), config)
            .await
    }
}
