pub mod account;
pub mod api_response;
pub mod auth;
pub mod channel;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod media_client;
pub mod middleware;
pub mod profile;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
