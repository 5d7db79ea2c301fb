//! Protocol module - RN2483 line protocol definitions.

pub mod command;
pub mod constants;
pub mod params;
pub mod response;

pub use command::{Command, CommandBuilder, Namespace};
pub use constants::*;
pub use params::{Band, Bandwidth, CodingRate, JoinMode, Modulation};
pub use response::{AsyncEvent, ErrorCode, Outcome, classify, sanitize, sanitize_text};
