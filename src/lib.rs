pub mod api;
pub mod config;
pub mod connector;
pub mod observability;
pub mod repo;
