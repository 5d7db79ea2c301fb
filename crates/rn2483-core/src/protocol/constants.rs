//! Wire-level constants of the RN2483 line protocol.

use std::time::Duration;

/// Every line on the wire, in both directions, ends with CR LF.
pub const LINE_TERMINATOR: &str = "\r\n";
pub const LINE_TERMINATOR_LEN: usize = 2;

// Immediate responses
pub const RESP_OK: &str = "ok";
pub const RESP_INVALID_PARAM: &str = "invalid_param";
pub const RESP_ON: &str = "on";
pub const RESP_OFF: &str = "off";

// Join events
pub const EVT_JOIN_ACCEPTED: &str = "accepted";
pub const EVT_JOIN_DENIED: &str = "denied";

// Uplink events
pub const EVT_MAC_TX_OK: &str = "mac_tx_ok";
pub const EVT_MAC_RX: &str = "mac_rx";

// Radio events
pub const EVT_RADIO_TX_OK: &str = "radio_tx_ok";
pub const EVT_RADIO_RX: &str = "radio_rx";

// Named error tokens
pub const ERR_MAC: &str = "mac_err";
pub const ERR_INVALID_DATA_LEN: &str = "invalid_data_len";
pub const ERR_RADIO: &str = "radio_err";
pub const ERR_BUSY: &str = "busy";
pub const ERR_NOT_JOINED: &str = "not_joined";
pub const ERR_NO_FREE_CHANNEL: &str = "no_free_ch";
pub const ERR_SILENT: &str = "silent";
pub const ERR_FRAME_COUNTER: &str = "frame_counter_err_rejoin_needed";
pub const ERR_MAC_PAUSED: &str = "mac_paused";
pub const ERR_KEYS_NOT_INIT: &str = "keys_not_init";

// Command namespaces
pub const NS_MAC: &str = "mac";
pub const NS_RADIO: &str = "radio";
pub const NS_SYS: &str = "sys";

// Uplink types
pub const UPLINK_CONFIRMED: &str = "cnf";
pub const UPLINK_UNCONFIRMED: &str = "uncnf";

/// Application ports accepted by `mac tx`.
pub const MIN_APP_PORT: u8 = 1;
pub const MAX_APP_PORT: u8 = 223;

/// Largest payload `radio tx` accepts in LoRa mode.
pub const MAX_RADIO_PAYLOAD: usize = 255;

/// User-writable EEPROM range for `sys set nvm`.
pub const NVM_USER_START: u16 = 0x300;
pub const NVM_USER_END: u16 = 0x3FF;

/// Shortest sleep the module accepts.
pub const MIN_SLEEP_MS: u32 = 100;

// Frequency bands (Hz)
pub const BAND_433_MIN_HZ: u32 = 433_050_000;
pub const BAND_433_MAX_HZ: u32 = 434_790_000;
pub const BAND_868_MIN_HZ: u32 = 863_000_000;
pub const BAND_868_MAX_HZ: u32 = 870_000_000;

// Default timings
pub const DEFAULT_BAUD_RATE: u32 = 57_600;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_UPLINK_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_RADIO_TX_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RX_TIMEOUT: Duration = Duration::from_secs(15);

/// Margin added when checking whether a pause still covers an operation.
pub const PAUSE_MARGIN: Duration = Duration::from_millis(100);
