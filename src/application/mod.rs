//! Application layer: ports, DTOs, and services

pub mod dto;
pub mod ports;
pub mod services;
