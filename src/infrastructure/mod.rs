//! Infrastructure layer: configuration, adapters, and the HTTP surface

pub mod catalog;
pub mod config;
pub mod generator;
pub mod http;
pub mod state;
