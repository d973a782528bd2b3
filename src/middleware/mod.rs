// Middleware modules for PhishShield

pub mod cors;

pub use cors::dynamic_cors_middleware;
