//! State machine module.

pub mod machine;

pub use machine::{JoinState, ModuleState, UplinkState};
