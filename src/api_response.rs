/// Success envelope: `{statusCode, data, message, success}`

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    /// Finish `builder` (which may already carry cookies) with this envelope
    pub fn respond(self, mut builder: HttpResponseBuilder) -> HttpResponse {
        builder.json(self)
    }
}

/// Empty `data` object
#[derive(Debug, Serialize)]
pub struct Empty {}
