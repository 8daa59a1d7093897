//! OpenAPI specification for the token count API

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    error::ErrorResponse,
    routes::count::{CountRequest, CountResponse},
};

/// OpenAPI specification for Tokenmeter
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tokenmeter API",
        version = "1.0.0",
        description = "Authenticated token counting with model-aware tokenizer routing"
    ),
    paths(crate::routes::count::count_tokens),
    components(schemas(CountRequest, CountResponse, ErrorResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Tokens", description = "Token counting endpoints")
    )
)]
pub struct TokenmeterApiDoc;

/// Security scheme addon for the X-API-Key header
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}
