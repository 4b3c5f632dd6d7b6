//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

/// Standard error messages for consistent API responses
pub mod messages {
    pub const INTERNAL_ERROR: &str = "An internal server error occurred";
    pub const VALIDATION_FAILED: &str = "Request validation failed";
    pub const INVALID_OBJECT_ID: &str = "Invalid object id format";
    pub const NOT_FOUND_RESOURCE: &str = "Resource not found";
    pub const NOT_IMPLEMENTED: &str = "Capability not implemented";
}

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "error": "InternalServerError",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "error": "BadRequest",
        "message": "Request validation failed",
        "details": {
            "product_name": [{
                "code": "length",
                "message": "length is less than 1",
                "params": {"min": 1, "value": ""}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid ObjectId",
    content_type = "application/json",
    example = json!({
        "error": "BadRequest",
        "message": "Invalid object id format"
    })
)]
pub struct BadRequestObjectIdResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "error": "NotFound",
        "message": "Resource not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Not Implemented",
    content_type = "application/json",
    example = json!({
        "error": "NotImplemented",
        "message": "Capability not implemented"
    })
)]
pub struct NotImplementedResponse(pub ErrorResponse);
