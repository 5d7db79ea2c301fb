//! Parameter enums and scalar conversions used by the accessor layer.

use std::fmt;
use std::str::FromStr;

use super::constants::*;

/// LoRaWAN activation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Otaa,
    Abp,
}

impl JoinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Otaa => "otaa",
            JoinMode::Abp => "abp",
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "otaa" => Ok(JoinMode::Otaa),
            "abp" => Ok(JoinMode::Abp),
            other => Err(format!("invalid join mode '{}' (otaa or abp)", other)),
        }
    }
}

/// Frequency band used by `mac reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    B433,
    B868,
}

impl Band {
    pub fn mhz(&self) -> u16 {
        match self {
            Band::B433 => 433,
            Band::B868 => 868,
        }
    }
}

/// Radio modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Lora,
    Fsk,
}

impl Modulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modulation::Lora => "lora",
            Modulation::Fsk => "fsk",
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lora" => Ok(Modulation::Lora),
            "fsk" => Ok(Modulation::Fsk),
            other => Err(format!("invalid modulation '{}'", other)),
        }
    }
}

/// LoRa bandwidth in kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    Khz125,
    Khz250,
    Khz500,
}

impl Bandwidth {
    pub fn khz(&self) -> u16 {
        match self {
            Bandwidth::Khz125 => 125,
            Bandwidth::Khz250 => 250,
            Bandwidth::Khz500 => 500,
        }
    }

    pub fn from_khz(khz: u16) -> Option<Self> {
        match khz {
            125 => Some(Bandwidth::Khz125),
            250 => Some(Bandwidth::Khz250),
            500 => Some(Bandwidth::Khz500),
            _ => None,
        }
    }
}

/// LoRa coding rate `4/N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingRate {
    Cr4_5,
    Cr4_6,
    Cr4_7,
    Cr4_8,
}

impl CodingRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodingRate::Cr4_5 => "4/5",
            CodingRate::Cr4_6 => "4/6",
            CodingRate::Cr4_7 => "4/7",
            CodingRate::Cr4_8 => "4/8",
        }
    }
}

impl fmt::Display for CodingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodingRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4/5" => Ok(CodingRate::Cr4_5),
            "4/6" => Ok(CodingRate::Cr4_6),
            "4/7" => Ok(CodingRate::Cr4_7),
            "4/8" => Ok(CodingRate::Cr4_8),
            other => Err(format!("invalid coding rate '{}'", other)),
        }
    }
}

/// Parse a decimal value of any integer width.
pub fn parse_decimal<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

/// Parse an `on`/`off` response.
pub fn parse_on_off(text: &str) -> Option<bool> {
    match text {
        RESP_ON => Some(true),
        RESP_OFF => Some(false),
        _ => None,
    }
}

/// Parse a spreading factor response such as `sf9`.
pub fn parse_spreading_factor(text: &str) -> Option<u8> {
    let sf: u8 = text.strip_prefix("sf")?.parse().ok()?;
    is_valid_spreading_factor(sf).then_some(sf)
}

pub fn is_valid_spreading_factor(sf: u8) -> bool {
    (7..=12).contains(&sf)
}

/// Convert the module's duty cycle register value into a percentage.
///
/// The module stores `100 / percent - 1`.
pub fn duty_cycle_percent(register: u16) -> f32 {
    100.0 / (register as f32 + 1.0)
}

/// Convert a duty cycle percentage into the module's register value,
/// saturating at `u16::MAX`. Returns `None` for non-positive or
/// non-finite percentages.
pub fn duty_cycle_register(percent: f32) -> Option<u16> {
    if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
        return None;
    }
    let value = (100.0 / percent) - 1.0;
    Some(value.clamp(0.0, u16::MAX as f32) as u16)
}

/// True if `freq` lies in one of the two supported bands.
pub fn is_valid_frequency(freq: u32) -> bool {
    (BAND_433_MIN_HZ..=BAND_433_MAX_HZ).contains(&freq)
        || (BAND_868_MIN_HZ..=BAND_868_MAX_HZ).contains(&freq)
}

/// True if `text` is exactly `len` hex characters.
pub fn is_hex_of_len(text: &str, len: usize) -> bool {
    text.len() == len && text.chars().all(|c| c.is_ascii_hexdigit())
}
