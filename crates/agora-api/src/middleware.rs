//! Standard middleware for the Agora API.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Access logging: remote-ip "request-line" status-code response-size.
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// CORS policy. Relevant when the UI and API live on different origins;
/// the API itself is stateless JSON so a permissive policy is acceptable.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .max_age(3600)
}
