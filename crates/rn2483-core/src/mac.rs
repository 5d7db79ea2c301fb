//! LoRaWAN stack (`mac ...`) parameter accessors.

use std::time::Duration;

use tracing::{info, instrument};

use crate::engine::{EngineError, EngineResult, Rn2483};
use crate::events::LinkObserver;
use crate::protocol::params::{
    duty_cycle_percent, duty_cycle_register, is_hex_of_len, is_valid_frequency, parse_decimal,
    parse_on_off,
};
use crate::protocol::{Band, Command};
use crate::transport::LineTransport;

const MAX_CHANNEL: u8 = 15;
const FIRST_CONFIGURABLE_CHANNEL: u8 = 3;
const MAX_DATA_RATE: u8 = 5;
const MAX_POWER_INDEX: u8 = 5;

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidArgument(message.into())
}

fn check_channel(channel: u8) -> EngineResult<()> {
    if channel > MAX_CHANNEL {
        return Err(invalid(format!("channel {} outside [0, {}]", channel, MAX_CHANNEL)));
    }
    Ok(())
}

fn check_hex(what: &str, value: &str, len: usize) -> EngineResult<()> {
    if !is_hex_of_len(value, len) {
        return Err(invalid(format!("{} must be {} hex characters", what, len)));
    }
    Ok(())
}

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    /// Reset the LoRaWAN stack to the defaults of `band`.
    #[instrument(skip(self))]
    pub fn mac_reset(&mut self, band: Band) -> EngineResult<()> {
        self.set_parameter(&Command::mac("reset").arg(band.mhz()).build())?;
        self.state_mut().resume();
        Ok(())
    }

    /// Pause the LoRaWAN stack so the radio can be used directly.
    ///
    /// Returns how long the stack stays paused.
    #[instrument(skip(self))]
    pub fn mac_pause(&mut self) -> EngineResult<Duration> {
        let ms: u32 = self.get_parsed(&Command::mac("pause").build(), parse_decimal)?;
        let length = Duration::from_millis(ms as u64);
        self.state_mut().pause(length);
        Ok(length)
    }

    /// Resume the LoRaWAN stack.
    pub fn mac_resume(&mut self) -> EngineResult<()> {
        self.set_parameter(&Command::mac("resume").build())?;
        self.state_mut().resume();
        Ok(())
    }

    /// Whether the stack is paused long enough for an operation of `length`.
    pub fn is_mac_paused(&self, length: Duration) -> bool {
        self.state().is_paused_for(length)
    }

    /// Persist the LoRaWAN configuration to EEPROM.
    pub fn mac_save(&mut self) -> EngineResult<()> {
        self.set_parameter(&Command::mac("save").build())?;
        info!("LoRaWAN configuration saved");
        Ok(())
    }

    pub fn device_address(&mut self) -> EngineResult<String> {
        self.get_parameter(&Command::mac("get").arg("devaddr").build())
    }

    /// Set the 4-byte device address (8 hex characters).
    pub fn set_device_address(&mut self, address: &str) -> EngineResult<()> {
        check_hex("device address", address, 8)?;
        self.set_parameter(&Command::mac("set").arg("devaddr").arg(address).build())
    }

    pub fn device_eui(&mut self) -> EngineResult<String> {
        self.get_parameter(&Command::mac("get").arg("deveui").build())
    }

    /// Set the 8-byte device EUI (16 hex characters).
    pub fn set_device_eui(&mut self, eui: &str) -> EngineResult<()> {
        check_hex("device EUI", eui, 16)?;
        self.set_parameter(&Command::mac("set").arg("deveui").arg(eui).build())
    }

    pub fn application_eui(&mut self) -> EngineResult<String> {
        self.get_parameter(&Command::mac("get").arg("appeui").build())
    }

    /// Set the 8-byte application EUI (16 hex characters).
    pub fn set_application_eui(&mut self, eui: &str) -> EngineResult<()> {
        check_hex("application EUI", eui, 16)?;
        self.set_parameter(&Command::mac("set").arg("appeui").arg(eui).build())
    }

    /// Set the 16-byte network session key (32 hex characters).
    pub fn set_network_session_key(&mut self, key: &str) -> EngineResult<()> {
        check_hex("network session key", key, 32)?;
        self.set_parameter(&Command::mac("set").arg("nwkskey").arg(key).build())
    }

    /// Set the 16-byte application session key (32 hex characters).
    pub fn set_application_session_key(&mut self, key: &str) -> EngineResult<()> {
        check_hex("application session key", key, 32)?;
        self.set_parameter(&Command::mac("set").arg("appskey").arg(key).build())
    }

    /// Set the 16-byte application key (32 hex characters).
    pub fn set_application_key(&mut self, key: &str) -> EngineResult<()> {
        check_hex("application key", key, 32)?;
        self.set_parameter(&Command::mac("set").arg("appkey").arg(key).build())
    }

    /// Data rate, 0 (SF12BW125) to 5 (SF7BW125).
    pub fn data_rate(&mut self) -> EngineResult<u8> {
        self.get_parsed(&Command::mac("get").arg("dr").build(), parse_decimal)
    }

    pub fn set_data_rate(&mut self, dr: u8) -> EngineResult<()> {
        if dr > MAX_DATA_RATE {
            return Err(invalid(format!("data rate {} outside [0, {}]", dr, MAX_DATA_RATE)));
        }
        self.set_parameter(&Command::mac("set").arg("dr").arg(dr).build())
    }

    /// Power index: 0 = 20 dBm (433 MHz only) through 5 = 2 dBm.
    pub fn power_index(&mut self) -> EngineResult<u8> {
        self.get_parsed(&Command::mac("get").arg("pwridx").build(), parse_decimal)
    }

    pub fn set_power_index(&mut self, index: u8) -> EngineResult<()> {
        if index > MAX_POWER_INDEX {
            return Err(invalid(format!(
                "power index {} outside [0, {}]",
                index, MAX_POWER_INDEX
            )));
        }
        self.set_parameter(&Command::mac("set").arg("pwridx").arg(index).build())
    }

    /// Adaptive data rate enabled.
    pub fn adaptive_data_rate(&mut self) -> EngineResult<bool> {
        self.get_parsed(&Command::mac("get").arg("adr").build(), parse_on_off)
    }

    pub fn set_adaptive_data_rate(&mut self, enabled: bool) -> EngineResult<()> {
        self.set_parameter(&Command::mac("set").arg("adr").on_off(enabled).build())
    }

    /// Link check interval in seconds; 0 disables it.
    pub fn set_link_check(&mut self, interval_secs: u16) -> EngineResult<()> {
        self.set_parameter(&Command::mac("set").arg("linkchk").arg(interval_secs).build())
    }

    /// MAC status word.
    pub fn mac_status(&mut self) -> EngineResult<u32> {
        self.get_parsed(&Command::mac("get").arg("status").build(), |s| {
            u32::from_str_radix(s, 16).ok()
        })
    }

    /// Channel frequency in Hz.
    pub fn channel_frequency(&mut self, channel: u8) -> EngineResult<u32> {
        check_channel(channel)?;
        self.get_parsed(
            &Command::mac("get").arg("ch").arg("freq").arg(channel).build(),
            parse_decimal,
        )
    }

    /// Set a channel frequency in Hz. Channels 0-2 are fixed.
    pub fn set_channel_frequency(&mut self, channel: u8, frequency: u32) -> EngineResult<()> {
        if !(FIRST_CONFIGURABLE_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(invalid(format!(
                "channel {} outside [{}, {}]",
                channel, FIRST_CONFIGURABLE_CHANNEL, MAX_CHANNEL
            )));
        }
        if !is_valid_frequency(frequency) {
            return Err(invalid(format!("frequency {} Hz not in a supported band", frequency)));
        }
        self.set_parameter(
            &Command::mac("set")
                .arg("ch")
                .arg("freq")
                .arg(channel)
                .arg(frequency)
                .build(),
        )
    }

    /// Channel duty cycle as a percentage.
    pub fn channel_duty_cycle(&mut self, channel: u8) -> EngineResult<f32> {
        check_channel(channel)?;
        let register: u16 = self.get_parsed(
            &Command::mac("get").arg("ch").arg("dcycle").arg(channel).build(),
            parse_decimal,
        )?;
        Ok(duty_cycle_percent(register))
    }

    /// Set a channel duty cycle as a percentage in (0, 100].
    pub fn set_channel_duty_cycle(&mut self, channel: u8, percent: f32) -> EngineResult<()> {
        check_channel(channel)?;
        let register = duty_cycle_register(percent)
            .ok_or_else(|| invalid(format!("duty cycle {}% outside (0, 100]", percent)))?;
        self.set_parameter(
            &Command::mac("set")
                .arg("ch")
                .arg("dcycle")
                .arg(channel)
                .arg(register)
                .build(),
        )
    }

    /// Whether a channel is enabled.
    pub fn channel_status(&mut self, channel: u8) -> EngineResult<bool> {
        check_channel(channel)?;
        self.get_parsed(
            &Command::mac("get").arg("ch").arg("status").arg(channel).build(),
            parse_on_off,
        )
    }

    pub fn set_channel_status(&mut self, channel: u8, enabled: bool) -> EngineResult<()> {
        check_channel(channel)?;
        self.set_parameter(
            &Command::mac("set")
                .arg("ch")
                .arg("status")
                .arg(channel)
                .on_off(enabled)
                .build(),
        )
    }
}
