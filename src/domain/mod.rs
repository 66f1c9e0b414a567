//! Domain layer - Core scanning logic
//!
//! This module contains the findings and credential entities, the traits
//! for external collaborators, and the pure detection services.

pub mod entities;
pub mod repositories;
pub mod services;
