pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod json;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
