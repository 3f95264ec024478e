//! Backlight control. A side channel fully independent of the data/command
//! bus: changing the backlight never disturbs display state and vice versa.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};

/// Polarity of a switched backlight pin.
///
/// `Normal` drives the pin high to light the backlight; `Inverted` drives it
/// low, for modules that switch the backlight through a PNP transistor.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BacklightMode {
    Normal,
    Inverted,
}

/// A backlight behind a plain digital output. Any nonzero level counts as on.
pub(crate) struct Backlight<P> {
    pin: P,
    mode: BacklightMode,
    level: u8,
}

impl<P> Backlight<P>
where
    P: OutputPin,
{
    pub fn new(pin: P, mode: BacklightMode) -> Self {
        Self {
            pin,
            mode,
            level: 0,
        }
    }

    pub fn set_level(&mut self, level: u8) -> Result<(), P::Error> {
        self.level = level;
        let lit = level != 0;
        let drive_high = match self.mode {
            BacklightMode::Normal => lit,
            BacklightMode::Inverted => !lit,
        };
        if drive_high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

/// A backlight behind a PWM channel, for displays whose backlight pin is
/// wired to a dimmable output. The 0-255 level maps onto the channel's duty
/// range.
pub struct PwmBacklight<PWM> {
    channel: PWM,
    level: u8,
}

impl<PWM> PwmBacklight<PWM>
where
    PWM: SetDutyCycle,
{
    pub fn new(channel: PWM) -> Self {
        Self { channel, level: 0 }
    }

    pub fn set_level(&mut self, level: u8) -> Result<(), PWM::Error> {
        self.level = level;
        self.channel
            .set_duty_cycle_fraction(level as u16, u8::MAX as u16)
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Consumes the controller and hands the PWM channel back.
    pub fn release(self) -> PWM {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_normal_mode_drives_high_for_nonzero_level() {
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut backlight = Backlight::new(pin.clone(), BacklightMode::Normal);

        assert!(backlight.set_level(255).is_ok());
        assert_eq!(backlight.level(), 255);
        assert!(backlight.set_level(0).is_ok());
        assert_eq!(backlight.level(), 0);

        pin.done();
    }

    #[test]
    fn test_inverted_mode_flips_polarity() {
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut backlight = Backlight::new(pin.clone(), BacklightMode::Inverted);

        assert!(backlight.set_level(255).is_ok());
        assert!(backlight.set_level(0).is_ok());

        pin.done();
    }

    struct FakePwm {
        duty: u16,
        max: u16,
    }

    impl embedded_hal::pwm::ErrorType for FakePwm {
        type Error = core::convert::Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    #[test]
    fn test_pwm_level_maps_to_duty_fraction() {
        let mut backlight = PwmBacklight::new(FakePwm { duty: 0, max: 255 });

        assert!(backlight.set_level(255).is_ok());
        assert_eq!(backlight.level(), 255);
        let channel = backlight.release();
        assert_eq!(channel.duty, 255);

        let mut backlight = PwmBacklight::new(FakePwm { duty: 99, max: 255 });
        assert!(backlight.set_level(0).is_ok());
        assert_eq!(backlight.release().duty, 0);
    }
}
