// armature-core: Types, errors, and configuration shared across the armature actuator stack.

pub mod config;
pub mod error;
pub mod types;
