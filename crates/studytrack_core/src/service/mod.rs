//! Use-case services layered above repositories.
//!
//! Services own the transaction boundary: every mutation commits together
//! with its activity entry.

pub mod access;
pub mod collab_service;
pub mod content_service;
pub mod project_service;
