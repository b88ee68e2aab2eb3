pub mod app;
pub mod authz;
pub mod config;
pub mod db;
pub mod docs;
pub mod errors;
pub mod events;
pub mod extract;
pub mod jwt;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

pub use app::create_app;
