use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Line settings of the sensor link, 115200 8N1 by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialParams {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl SerialParams {
    pub fn new(baud_rate: u32, data_bits: u8, stop_bits: u8, parity: Parity) -> Result<Self> {
        if baud_rate == 0 {
            return Err(Error::InvalidBaudRate(baud_rate));
        }
        if !(5..=8).contains(&data_bits) {
            return Err(Error::InvalidDataBits(data_bits));
        }
        if !(1..=2).contains(&stop_bits) {
            return Err(Error::InvalidStopBits(stop_bits));
        }

        Ok(Self {
            baud_rate,
            data_bits,
            stop_bits,
            parity,
        })
    }
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }
}
