pub mod api;
pub mod cascade;
pub mod chart;
pub mod config;
pub mod http_cache;
pub mod http_client;
pub mod provider;
pub mod standings;
pub mod state;
