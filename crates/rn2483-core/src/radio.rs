//! Radio (`radio ...`) parameter accessors.

use crate::engine::{EngineError, EngineResult, Rn2483};
use crate::events::LinkObserver;
use crate::protocol::params::{
    is_valid_frequency, is_valid_spreading_factor, parse_decimal, parse_spreading_factor,
};
use crate::protocol::{Bandwidth, CodingRate, Command, Modulation};
use crate::transport::LineTransport;

const MIN_POWER_DBM: i8 = -3;
const MAX_POWER_DBM: i8 = 15;

impl<T: LineTransport, O: LinkObserver> Rn2483<T, O> {
    pub fn modulation(&mut self) -> EngineResult<Modulation> {
        self.get_parsed(&Command::radio("get").arg("mod").build(), |s| s.parse().ok())
    }

    pub fn set_modulation(&mut self, modulation: Modulation) -> EngineResult<()> {
        self.set_parameter(&Command::radio("set").arg("mod").arg(modulation).build())
    }

    /// Operating frequency in Hz.
    pub fn frequency(&mut self) -> EngineResult<u32> {
        self.get_parsed(&Command::radio("get").arg("freq").build(), parse_decimal)
    }

    /// Set the operating frequency; must fall in the 433 or 868 MHz band.
    pub fn set_frequency(&mut self, frequency: u32) -> EngineResult<()> {
        if !is_valid_frequency(frequency) {
            return Err(EngineError::InvalidArgument(format!(
                "frequency {} Hz not in a supported band",
                frequency
            )));
        }
        self.set_parameter(&Command::radio("set").arg("freq").arg(frequency).build())
    }

    /// Output power in dBm.
    pub fn power(&mut self) -> EngineResult<i8> {
        self.get_parsed(&Command::radio("get").arg("pwr").build(), parse_decimal)
    }

    pub fn set_power(&mut self, dbm: i8) -> EngineResult<()> {
        if !(MIN_POWER_DBM..=MAX_POWER_DBM).contains(&dbm) {
            return Err(EngineError::InvalidArgument(format!(
                "power {} dBm outside [{}, {}]",
                dbm, MIN_POWER_DBM, MAX_POWER_DBM
            )));
        }
        self.set_parameter(&Command::radio("set").arg("pwr").arg(dbm).build())
    }

    /// Spreading factor, 7 to 12.
    pub fn spreading_factor(&mut self) -> EngineResult<u8> {
        self.get_parsed(&Command::radio("get").arg("sf").build(), parse_spreading_factor)
    }

    pub fn set_spreading_factor(&mut self, sf: u8) -> EngineResult<()> {
        if !is_valid_spreading_factor(sf) {
            return Err(EngineError::InvalidArgument(format!(
                "spreading factor {} outside [7, 12]",
                sf
            )));
        }
        self.set_parameter(&Command::radio("set").arg("sf").arg(format!("sf{}", sf)).build())
    }

    pub fn bandwidth(&mut self) -> EngineResult<Bandwidth> {
        self.get_parsed(&Command::radio("get").arg("bw").build(), |s| {
            parse_decimal(s).and_then(Bandwidth::from_khz)
        })
    }

    pub fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> EngineResult<()> {
        self.set_parameter(&Command::radio("set").arg("bw").arg(bandwidth.khz()).build())
    }

    pub fn coding_rate(&mut self) -> EngineResult<CodingRate> {
        self.get_parsed(&Command::radio("get").arg("cr").build(), |s| s.parse().ok())
    }

    pub fn set_coding_rate(&mut self, rate: CodingRate) -> EngineResult<()> {
        self.set_parameter(&Command::radio("set").arg("cr").arg(rate).build())
    }

    /// Signal-to-noise ratio of the last received packet, in dB.
    pub fn snr(&mut self) -> EngineResult<i8> {
        self.get_parsed(&Command::radio("get").arg("snr").build(), parse_decimal)
    }

    /// Watchdog timeout for radio operations in milliseconds; 0 disables it.
    pub fn set_watchdog(&mut self, timeout_ms: u32) -> EngineResult<()> {
        self.set_parameter(&Command::radio("set").arg("wdt").arg(timeout_ms).build())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::EngineError;
    use crate::engine::test_support::engine;
    use crate::protocol::{Bandwidth, CodingRate, Modulation};

    #[test]
    fn test_modulation() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["lora", "ok"]);
        assert_eq!(rn.modulation().unwrap(), Modulation::Lora);
        rn.set_modulation(Modulation::Fsk).unwrap();
        assert_eq!(mock.get_writes()[1], "radio set mod fsk");
    }

    #[test]
    fn test_frequency_validation() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("ok");
        rn.set_frequency(868_100_000).unwrap();
        assert!(matches!(
            rn.set_frequency(915_000_000),
            Err(EngineError::InvalidArgument(_))
        ));
        assert_eq!(mock.get_writes(), vec!["radio set freq 868100000"]);
    }

    #[test]
    fn test_power() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["-3", "ok"]);
        assert_eq!(rn.power().unwrap(), -3);
        rn.set_power(14).unwrap();
        assert!(rn.set_power(16).is_err());
        assert!(rn.set_power(-4).is_err());
        assert_eq!(mock.get_writes().len(), 2);
    }

    #[test]
    fn test_spreading_factor() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["sf12", "ok"]);
        assert_eq!(rn.spreading_factor().unwrap(), 12);
        rn.set_spreading_factor(7).unwrap();
        assert_eq!(mock.get_writes()[1], "radio set sf sf7");
        assert!(rn.set_spreading_factor(6).is_err());
    }

    #[test]
    fn test_bandwidth_and_coding_rate() {
        let (mut rn, mock, _) = engine();
        mock.queue_lines(&["250", "4/7", "ok"]);
        assert_eq!(rn.bandwidth().unwrap(), Bandwidth::Khz250);
        assert_eq!(rn.coding_rate().unwrap(), CodingRate::Cr4_7);
        rn.set_bandwidth(Bandwidth::Khz500).unwrap();
        assert_eq!(mock.get_writes()[2], "radio set bw 500");
    }

    #[test]
    fn test_bad_bandwidth_reply() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("300");
        assert!(matches!(rn.bandwidth(), Err(EngineError::Parse { .. })));
    }

    #[test]
    fn test_snr_negative() {
        let (mut rn, mock, _) = engine();
        mock.queue_line("-12");
        assert_eq!(rn.snr().unwrap(), -12);
    }
}
