use log::warn;
use serde_json::Value;

use super::response::{ApiResponse, STATUS_INTERNAL_ERROR};
use crate::contact::{ContactConfig, ContactConfigError, ContactConfigStore, ContactUpdate};

pub const MSG_CONFIG_UPDATED: &str = "Configuration updated successfully";
pub const ERR_CONFIG_READ: &str = "Failed to read configuration";
pub const ERR_CONFIG_WRITE: &str = "Failed to update configuration";

#[derive(Debug, Clone)]
pub struct ContactApi {
    store: ContactConfigStore,
}

impl ContactApi {
    pub fn new(store: ContactConfigStore) -> Self {
        Self { store }
    }

    pub fn get(&self) -> ApiResponse<ContactConfig> {
        match self.store.load() {
            Ok(config) => ApiResponse::ok(config),
            Err(e) => {
                warn!("Contact config read failed: {e}");
                ApiResponse::failure(STATUS_INTERNAL_ERROR, ERR_CONFIG_READ)
            }
        }
    }

    pub fn update(&self, body: &Value) -> ApiResponse<ContactConfig> {
        let update: ContactUpdate = match serde_json::from_value(body.clone()) {
            Ok(update) => update,
            Err(e) => return ApiResponse::bad_request(format!("Invalid configuration: {e}")),
        };
        match self.store.save(update) {
            Ok(config) => ApiResponse::ok(config).with_message(MSG_CONFIG_UPDATED),
            Err(e @ (ContactConfigError::MissingEmail | ContactConfigError::InvalidEmail(_))) => {
                ApiResponse::bad_request(e.to_string())
            }
            Err(e) => {
                warn!("Contact config write failed: {e}");
                ApiResponse::failure(STATUS_INTERNAL_ERROR, ERR_CONFIG_WRITE)
            }
        }
    }
}
