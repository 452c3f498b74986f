use embedded_hal::{delay::DelayNs, digital::OutputPin};
use fugit::{ExtU32, MillisDurationU32};

use crate::{digital::DigitalOutput, gpio::ActiveLevel};

/// Half period of the alert beep.
const ALERT_TIME_MS: u32 = 200;

/// Buzzer with its own oscillator: on or off.
#[derive(Debug)]
pub struct ActiveBuzzer<P> {
    output: DigitalOutput<P>,
}

impl<P: OutputPin> ActiveBuzzer<P> {
    pub fn new(pin: P, on_level: ActiveLevel) -> Result<Self, P::Error> {
        Ok(Self {
            output: DigitalOutput::new(pin, on_level)?,
        })
    }

    pub fn on(&mut self) -> Result<(), P::Error> {
        self.output.active()
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.output.inactive()
    }

    /// One 200 ms on / 200 ms off alert cycle.
    pub fn alert<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        let half: MillisDurationU32 = ALERT_TIME_MS.millis();
        self.output
            .cycle_active(delay, half.convert(), half.convert())
    }

    pub fn beep<D: DelayNs>(
        &mut self,
        delay: &mut D,
        duration: MillisDurationU32,
    ) -> Result<(), P::Error> {
        self.output.pulse_active(delay, duration.convert())
    }

    pub fn release(self) -> P {
        self.output.release()
    }
}
