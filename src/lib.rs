//! Grant application engine: declarative multi-step forms with typed fields, a validation rule
//! library, conditional step navigation, and the pending/submitted application lifecycle.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
