//! Parallel bus transport for the HD44780 data/command interface.
//!
//! Owns the pin assignment (register select, optional read/write select,
//! enable, and the 4- or 8-line data bus) and implements the primitive byte
//! transfer: full-byte or split-nibble clock-out, each followed by an enable
//! pulse and a settle delay.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::CharacterDisplayError;

/// Settle delay applied after each enable pulse when none is configured.
/// The controller needs more than 37 us to accept the next transfer.
pub(crate) const DEFAULT_SETTLE_TIME_US: u32 = 100;

/// The data lines of the bus. The variant fixes the bus width for the
/// lifetime of the driver. Pins are ordered least significant bit first, so
/// `FourBit` carries D4..D7 of the controller and `EightBit` carries D0..D7.
pub enum DataBus<P> {
    FourBit([P; 4]),
    EightBit([P; 8]),
}

impl<P> DataBus<P> {
    pub fn is_four_bit(&self) -> bool {
        matches!(self, DataBus::FourBit(_))
    }

    pub fn is_eight_bit(&self) -> bool {
        matches!(self, DataBus::EightBit(_))
    }
}

/// Full pin assignment for one display. A missing read/write pin means the
/// caller has wired the controller's R/W line to ground and the bus operates
/// write-only.
pub struct Pins<P> {
    pub rs: P,
    pub rw: Option<P>,
    pub enable: P,
    pub data: DataBus<P>,
}

pub(crate) struct ParallelBus<P> {
    rs: P,
    rw: Option<P>,
    enable: P,
    data: DataBus<P>,
    settle_time_us: u32,
}

fn write_data_bits<P: OutputPin>(pins: &mut [P], value: u8) -> Result<(), P::Error> {
    for (i, pin) in pins.iter_mut().enumerate() {
        if (value >> i) & 0x01 != 0 {
            pin.set_high()?;
        } else {
            pin.set_low()?;
        }
    }
    Ok(())
}

/// Latches the currently presented data bits into the controller. The two
/// 1 us phases are the datasheet minimum pulse width; the trailing settle
/// delay is the only part callers may extend.
fn pulse_enable<P: OutputPin, DELAY: DelayNs>(
    enable: &mut P,
    delay: &mut DELAY,
    settle_time_us: u32,
) -> Result<(), P::Error> {
    enable.set_low()?;
    delay.delay_us(1);
    enable.set_high()?;
    delay.delay_us(1);
    enable.set_low()?;
    delay.delay_us(settle_time_us);
    Ok(())
}

impl<P> ParallelBus<P>
where
    P: OutputPin,
{
    pub fn new(pins: Pins<P>) -> Self {
        Self {
            rs: pins.rs,
            rw: pins.rw,
            enable: pins.enable,
            data: pins.data,
            settle_time_us: DEFAULT_SETTLE_TIME_US,
        }
    }

    pub fn is_four_bit(&self) -> bool {
        self.data.is_four_bit()
    }

    pub fn settle_time_us(&self) -> u32 {
        self.settle_time_us
    }

    pub fn set_settle_time_us(&mut self, settle_time_us: u32) {
        self.settle_time_us = settle_time_us.max(1);
    }

    /// Drives RS, enable, and (when present) R/W low ahead of the power-on
    /// handshake, before the controller accepts normal command framing.
    pub fn prepare(&mut self) -> Result<(), CharacterDisplayError<P>> {
        self.rs.set_low().map_err(CharacterDisplayError::PinError)?;
        self.enable
            .set_low()
            .map_err(CharacterDisplayError::PinError)?;
        if let Some(rw) = self.rw.as_mut() {
            rw.set_low().map_err(CharacterDisplayError::PinError)?;
        }
        Ok(())
    }

    /// Transfers one byte. `rs` selects the data register (`true`) or the
    /// command register (`false`). On a 4-bit bus the byte goes out as two
    /// nibbles, high first, each latched by its own enable pulse.
    pub fn transmit<DELAY: DelayNs>(
        &mut self,
        delay: &mut DELAY,
        rs: bool,
        value: u8,
    ) -> Result<(), CharacterDisplayError<P>> {
        if rs {
            self.rs.set_high().map_err(CharacterDisplayError::PinError)?;
        } else {
            self.rs.set_low().map_err(CharacterDisplayError::PinError)?;
        }
        if let Some(rw) = self.rw.as_mut() {
            rw.set_low().map_err(CharacterDisplayError::PinError)?;
        }
        match &mut self.data {
            DataBus::EightBit(pins) => {
                write_data_bits(pins, value).map_err(CharacterDisplayError::PinError)?;
                pulse_enable(&mut self.enable, delay, self.settle_time_us)
                    .map_err(CharacterDisplayError::PinError)?;
            }
            DataBus::FourBit(pins) => {
                write_data_bits(pins, value >> 4).map_err(CharacterDisplayError::PinError)?;
                pulse_enable(&mut self.enable, delay, self.settle_time_us)
                    .map_err(CharacterDisplayError::PinError)?;
                write_data_bits(pins, value & 0x0F).map_err(CharacterDisplayError::PinError)?;
                pulse_enable(&mut self.enable, delay, self.settle_time_us)
                    .map_err(CharacterDisplayError::PinError)?;
            }
        }
        Ok(())
    }

    /// Clocks a bare nibble without command framing. Only meaningful on a
    /// 4-bit bus during the power-on handshake; an 8-bit bus sends full
    /// function-set bytes instead and never calls this.
    pub fn write_nibble<DELAY: DelayNs>(
        &mut self,
        delay: &mut DELAY,
        nibble: u8,
    ) -> Result<(), CharacterDisplayError<P>> {
        match &mut self.data {
            DataBus::FourBit(pins) => {
                write_data_bits(pins, nibble & 0x0F).map_err(CharacterDisplayError::PinError)?;
                pulse_enable(&mut self.enable, delay, self.settle_time_us)
                    .map_err(CharacterDisplayError::PinError)?;
            }
            DataBus::EightBit(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
    };

    fn pulse() -> [PinTransaction; 3] {
        [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]
    }

    #[test]
    fn test_four_bit_transmit_splits_nibbles_high_first() {
        // write byte 0xDE with RS = 1, then 0xAD with RS = 0
        let mut rs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut enable_expectations = std::vec::Vec::new();
        for _ in 0..4 {
            enable_expectations.extend(pulse());
        }
        let mut enable = PinMock::new(&enable_expectations);
        // nibble sequence: 0xD, 0xE, 0xA, 0xD; data pins are LSB first
        let mut d4 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut d5 = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut d6 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut d7 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
        ]);

        let mut bus = ParallelBus::new(Pins {
            rs: rs.clone(),
            rw: None,
            enable: enable.clone(),
            data: DataBus::FourBit([d4.clone(), d5.clone(), d6.clone(), d7.clone()]),
        });
        let mut delay = NoopDelay::new();

        assert!(bus.transmit(&mut delay, true, 0xDE).is_ok());
        assert!(bus.transmit(&mut delay, false, 0xAD).is_ok());

        rs.done();
        enable.done();
        d4.done();
        d5.done();
        d6.done();
        d7.done();
    }

    #[test]
    fn test_eight_bit_transmit_single_clock_out() {
        // write byte 0xDE = 0b1101_1110 with RS = 0, one enable pulse
        let mut rs = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut enable = PinMock::new(&pulse());
        let bit_states = [
            PinState::Low,  // bit 0
            PinState::High, // bit 1
            PinState::High, // bit 2
            PinState::High, // bit 3
            PinState::High, // bit 4
            PinState::Low,  // bit 5
            PinState::High, // bit 6
            PinState::High, // bit 7
        ];
        let mut data_pins = std::vec::Vec::new();
        for state in bit_states {
            data_pins.push(PinMock::new(&[PinTransaction::set(state)]));
        }
        let data: [PinMock; 8] = core::array::from_fn(|i| data_pins[i].clone());

        let mut bus = ParallelBus::new(Pins {
            rs: rs.clone(),
            rw: None,
            enable: enable.clone(),
            data: DataBus::EightBit(data),
        });
        let mut delay = NoopDelay::new();

        assert!(bus.transmit(&mut delay, false, 0xDE).is_ok());

        rs.done();
        enable.done();
        for pin in data_pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_read_write_pin_held_low_on_every_transmit() {
        let mut rs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
        ]);
        let mut rw = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let mut enable_expectations = std::vec::Vec::new();
        for _ in 0..4 {
            enable_expectations.extend(pulse());
        }
        let mut enable = PinMock::new(&enable_expectations);
        // 0x00 twice: every data pin low for both nibbles of both bytes
        let mut data_pins = std::vec::Vec::new();
        for _ in 0..4 {
            data_pins.push(PinMock::new(&std::vec![
                PinTransaction::set(PinState::Low);
                4
            ]));
        }
        let data: [PinMock; 4] = core::array::from_fn(|i| data_pins[i].clone());

        let mut bus = ParallelBus::new(Pins {
            rs: rs.clone(),
            rw: Some(rw.clone()),
            enable: enable.clone(),
            data: DataBus::FourBit(data),
        });
        let mut delay = NoopDelay::new();

        assert!(bus.transmit(&mut delay, true, 0x00).is_ok());
        assert!(bus.transmit(&mut delay, true, 0x00).is_ok());

        rs.done();
        rw.done();
        enable.done();
        for pin in data_pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_settle_time_clamped_to_minimum() {
        let mut rs = PinMock::new(&[]);
        let mut enable = PinMock::new(&[]);
        let mut data_pins = std::vec::Vec::new();
        for _ in 0..4 {
            data_pins.push(PinMock::new(&[]));
        }
        let data: [PinMock; 4] = core::array::from_fn(|i| data_pins[i].clone());

        let mut bus = ParallelBus::new(Pins {
            rs: rs.clone(),
            rw: None,
            enable: enable.clone(),
            data: DataBus::FourBit(data),
        });
        assert_eq!(bus.settle_time_us(), DEFAULT_SETTLE_TIME_US);

        bus.set_settle_time_us(0);
        assert_eq!(bus.settle_time_us(), 1);

        bus.set_settle_time_us(500);
        assert_eq!(bus.settle_time_us(), 500);

        rs.done();
        enable.done();
        for pin in data_pins.iter_mut() {
            pin.done();
        }
    }
}
