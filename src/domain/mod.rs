//! Domain layer - Entities and value objects
//!
//! Pure data and invariants; no I/O and no dependency on the application or
//! infrastructure layers.

pub mod entities;
pub mod value_objects;
