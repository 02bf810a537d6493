//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the tutoring chain and the document mirror so route
//! handlers can stay focused on validation and JSON shaping.

pub mod agents;
pub mod mirror;
pub mod safety;
pub mod workflow;
