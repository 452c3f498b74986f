use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use fugit::MicrosDurationU32;

use crate::gpio::{ActiveLevel, GpioInputPin, GpioOutputPin};

/// A two-state output with timed pulses.
#[derive(Debug)]
pub struct DigitalOutput<P> {
    gpio: GpioOutputPin<P>,
}

impl<P: OutputPin> DigitalOutput<P> {
    pub fn new(pin: P, active: ActiveLevel) -> Result<Self, P::Error> {
        Ok(Self {
            gpio: GpioOutputPin::new(pin, active)?,
        })
    }

    pub fn active(&mut self) -> Result<(), P::Error> {
        self.gpio.active()
    }

    pub fn inactive(&mut self) -> Result<(), P::Error> {
        self.gpio.inactive()
    }

    pub fn set_active_level(&mut self, active: ActiveLevel) {
        self.gpio.set_active_level(active);
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.gpio.active_level()
    }

    /// Active for `duration`, then inactive.
    pub fn pulse_active<D: DelayNs>(
        &mut self,
        delay: &mut D,
        duration: MicrosDurationU32,
    ) -> Result<(), P::Error> {
        self.active()?;
        delay.delay_us(duration.to_micros());
        self.inactive()
    }

    /// Inactive for `duration`, then active.
    pub fn pulse_inactive<D: DelayNs>(
        &mut self,
        delay: &mut D,
        duration: MicrosDurationU32,
    ) -> Result<(), P::Error> {
        self.inactive()?;
        delay.delay_us(duration.to_micros());
        self.active()
    }

    pub fn cycle_active<D: DelayNs>(
        &mut self,
        delay: &mut D,
        active: MicrosDurationU32,
        inactive: MicrosDurationU32,
    ) -> Result<(), P::Error> {
        self.pulse_active(delay, active)?;
        self.pulse_inactive(delay, inactive)
    }

    pub fn cycle_inactive<D: DelayNs>(
        &mut self,
        delay: &mut D,
        inactive: MicrosDurationU32,
        active: MicrosDurationU32,
    ) -> Result<(), P::Error> {
        self.pulse_inactive(delay, inactive)?;
        self.pulse_active(delay, active)
    }

    pub fn release(self) -> P {
        self.gpio.release()
    }
}

/// A two-state input.
#[derive(Debug)]
pub struct DigitalInput<P> {
    gpio: GpioInputPin<P>,
}

impl<P: InputPin> DigitalInput<P> {
    pub fn new(pin: P, active: ActiveLevel) -> Self {
        Self {
            gpio: GpioInputPin::new(pin, active),
        }
    }

    pub fn active(&mut self) -> Result<bool, P::Error> {
        self.gpio.active()
    }

    pub fn inactive(&mut self) -> Result<bool, P::Error> {
        self.gpio.inactive()
    }

    pub fn set_active_level(&mut self, active: ActiveLevel) {
        self.gpio.set_active_level(active);
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.gpio.active_level()
    }

    pub fn release(self) -> P {
        self.gpio.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State, Transaction},
    };
    use fugit::ExtU32;

    #[test]
    fn pulse_active_ends_inactive() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let mut output = DigitalOutput::new(pin, ActiveLevel::High).unwrap();
        output.pulse_active(&mut NoopDelay::new(), 10.micros()).unwrap();
        output.release().done();
    }

    #[test]
    fn cycle_inactive_ends_active() {
        let pin = PinMock::new(&[
            Transaction::set(State::High),
            // pulse_inactive
            Transaction::set(State::High),
            Transaction::set(State::Low),
            // pulse_active
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let mut output = DigitalOutput::new(pin, ActiveLevel::Low).unwrap();
        output
            .cycle_inactive(&mut NoopDelay::new(), 5.micros(), 5.micros())
            .unwrap();
        output.release().done();
    }

    #[test]
    fn input_follows_active_level() {
        let pin = PinMock::new(&[Transaction::get(State::High), Transaction::get(State::High)]);
        let mut input = DigitalInput::new(pin, ActiveLevel::High);
        assert!(input.active().unwrap());
        input.set_active_level(ActiveLevel::Low);
        assert!(input.inactive().unwrap());
        input.release().done();
    }
}
