//! Outbound ports - Interfaces that the application requires from external systems

mod catalog_port;
mod generator_port;

pub use catalog_port::CatalogPort;
pub use generator_port::{
    ChatMessage, GeneratorPort, GeneratorRequest, GeneratorResponse, MessageRole,
};
