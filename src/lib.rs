pub mod config;
pub mod export;
pub mod http_client;
pub mod injuries;
pub mod pipeline;
pub mod roster;
pub mod stat_value;
pub mod teams;
