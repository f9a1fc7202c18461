pub mod agent;
pub mod chat_server;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod http_client_pool;
pub mod services;
pub mod session_store;
pub mod tool_protocol;
pub mod tool_protocols;
