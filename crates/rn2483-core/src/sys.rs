//! System (`sys ...`) commands.

use tracing::{info, instrument, warn};

use crate::engine::{EngineError, EngineResult, Rn2483};
use crate::events::{LinkObserver, LogLevel};
use crate::protocol::params::parse_decimal;
use crate::protocol::{Command, MIN_SLEEP_MS, NVM_USER_END, NVM_USER_START};
use crate::transport::LineTransport;

fn check_nvm_address(address: u16) -> EngineResult<()> {
    if !(NVM_USER_START..=NVM_USER_END).contains(&address) {
        return Err(EngineError::InvalidArgument(format!(
            "NVM address {:#X} outside [{:#X}, {:#X}]",
            address, NVM_USER_START, NVM_USER_END
        )));
    }
    Ok(())
}

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    /// Put the module to sleep for `length_ms` (at least 100 ms).
    ///
    /// The module acknowledges when it wakes up, so this blocks for the
    /// sleep only if the transport read timeout is long enough.
    #[instrument(skip(self))]
    pub fn sleep(&mut self, length_ms: u32) -> EngineResult<()> {
        if length_ms < MIN_SLEEP_MS {
            return Err(EngineError::InvalidArgument(format!(
                "sleep of {} ms is shorter than {} ms",
                length_ms, MIN_SLEEP_MS
            )));
        }
        self.execute(&Command::sys("sleep").arg(length_ms).build())?;
        Ok(())
    }

    /// Reset and restart the module.
    ///
    /// The module prints its banner on restart; nothing is read and any
    /// pending input is discarded. The LoRaWAN stack pause is forgotten.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> EngineResult<()> {
        let command = Command::sys("reset").build();
        self.transport_mut().write_line(command.as_str())?;
        self.transport_mut().flush()?;
        self.state_mut().resume();
        self.diagnostic(LogLevel::Info, "Module reset");
        info!("Module reset");
        Ok(())
    }

    /// Store one byte of user EEPROM at `address` (0x300..=0x3FF).
    pub fn save_byte(&mut self, address: u16, value: u8) -> EngineResult<()> {
        check_nvm_address(address)?;
        let command = Command::sys("set")
            .arg("nvm")
            .arg(format!("{:X}", address))
            .arg(format!("{:02X}", value))
            .build();
        self.set_parameter(&command)
    }

    /// Read one byte of user EEPROM at `address` (0x300..=0x3FF).
    pub fn read_byte(&mut self, address: u16) -> EngineResult<u8> {
        check_nvm_address(address)?;
        let command = Command::sys("get")
            .arg("nvm")
            .arg(format!("{:X}", address))
            .build();
        self.get_parsed(&command, |s| u8::from_str_radix(s, 16).ok())
    }

    /// Firmware version banner, e.g. `RN2483 1.0.5 Oct 31 2018 15:06:52`.
    pub fn version(&mut self) -> EngineResult<String> {
        self.get_parameter(&Command::sys("get").arg("ver").build())
    }

    /// Supply voltage in millivolts.
    pub fn supply_voltage(&mut self) -> EngineResult<u16> {
        self.get_parsed(&Command::sys("get").arg("vdd").build(), parse_decimal)
    }

    /// Preprogrammed hardware EUI.
    pub fn hardware_eui(&mut self) -> EngineResult<String> {
        let eui = self.get_parameter(&Command::sys("get").arg("hweui").build())?;
        if eui.len() != 16 {
            warn!(eui = %eui, "Unexpected hardware EUI length");
        }
        Ok(eui)
    }
}
