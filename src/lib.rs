pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod funding;
pub mod infrastructure;
pub mod ledger;
pub mod observability;
pub mod orchestrator;
pub mod webhooks;
