use serde::Serialize;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Response envelope: `{success, data?, error?, message?}` plus the status
/// code a transport should send it with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(STATUS_OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(STATUS_CREATED, data)
    }

    fn with_status(status: u16, data: T) -> Self {
        ApiResponse {
            status,
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        ApiResponse {
            status,
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::failure(STATUS_BAD_REQUEST, error)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
