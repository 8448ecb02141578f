//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the chat pipeline, knowledge and contact concerns so
//! route handlers can stay focused on protocol translation.

pub mod assistant;
pub mod booking;
pub mod chat;
pub mod contact;
pub mod knowledge;
pub mod prompt;
