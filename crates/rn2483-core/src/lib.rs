//! rn2483-core: command/event transaction engine for the Microchip RN2483
//! LoRa module.
//!
//! The module speaks a line-oriented ASCII protocol over a UART. Every
//! command gets one immediate acknowledgement; joins, uplinks and raw radio
//! operations then report their outcome later as an asynchronous event
//! line. This crate owns that exchange.
//!
//! # Architecture
//!
//! - **Protocol**: Command builder, response/event classification, parameter types
//! - **Transport**: Line transport abstraction (serial port, mock)
//! - **Engine**: Command executor, poll loop, join/uplink/radio transactions
//! - **State**: Join and uplink state machines, LoRaWAN pause tracking
//! - **Events**: Observer pattern for front-end decoupling
//! - **Accessors**: `mac`, `radio` and `sys` parameter getters and setters
//!
//! # Example
//!
//! ```no_run
//! use rn2483_core::{JoinMode, ModuleConfig, Rn2483, SerialTransport};
//!
//! let config = ModuleConfig::default();
//! let transport = SerialTransport::from_config(&config)?;
//! let mut module = Rn2483::new(transport, config);
//!
//! if module.join(JoinMode::Otaa)?.is_accepted() {
//!     let state = module.transmit_with(true, 1, b"hello", |msg| {
//!         println!("downlink on port {}: {:02X?}", msg.port, msg.payload);
//!     })?;
//!     println!("uplink finished: {}", state);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod events;
pub mod mac;
pub mod protocol;
pub mod radio;
pub mod state;
pub mod sys;
pub mod transport;

// Re-exports for convenience
pub use config::{ModuleConfig, Operation};
pub use engine::{DownlinkMessage, EngineError, EngineResult, MalformedEvent, Rn2483};
pub use events::{LinkEvent, LinkObserver, LogLevel, NullObserver, TracingObserver};
pub use protocol::{
    AsyncEvent, Band, Bandwidth, CodingRate, Command, ErrorCode, JoinMode, Modulation, Outcome,
};
pub use state::{JoinState, ModuleState, UplinkState};
pub use transport::{LineTransport, MockTransport, SerialTransport, TransportError};
