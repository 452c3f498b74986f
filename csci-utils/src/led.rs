use embedded_hal::{delay::DelayNs, digital::OutputPin};
use fugit::MillisDurationU32;

use crate::{
    analog::{AnalogOutput, AnalogPort},
    digital::DigitalOutput,
    gpio::ActiveLevel,
};

/// LED on a two-state output pin.
#[derive(Debug)]
pub struct DigitalLed<P> {
    output: DigitalOutput<P>,
}

impl<P: OutputPin> DigitalLed<P> {
    /// `on_level` is the pin level that lights the LED. The LED starts off.
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

    pub fn blink<D: DelayNs>(
        &mut self,
        delay: &mut D,
        on_time: MillisDurationU32,
        off_time: MillisDurationU32,
    ) -> Result<(), P::Error> {
        self.output
            .cycle_active(delay, on_time.convert(), off_time.convert())
    }

    pub fn output(&mut self) -> &mut DigitalOutput<P> {
        &mut self.output
    }

    pub fn release(self) -> P {
        self.output.release()
    }
}

/// LED with variable brightness on an analog output.
#[derive(Debug)]
pub struct AnalogLed<B> {
    output: AnalogOutput<B>,
}

impl<B: AnalogPort> AnalogLed<B> {
    pub fn new(output: AnalogOutput<B>) -> Self {
        Self { output }
    }

    pub fn intensity(&mut self, fraction: f32) -> Result<(), B::Error> {
        self.output.output(fraction)
    }

    pub fn output_port_value(&mut self, value: i16) -> Result<(), B::Error> {
        self.output.output_port_value(value)
    }

    pub fn min_output_value(&self) -> i16 {
        self.output.min_output_value()
    }

    pub fn max_output_value(&self) -> i16 {
        self.output.max_output_value()
    }

    /// Blink at the current intensity.
    pub fn blink<D: DelayNs>(
        &mut self,
        delay: &mut D,
        on_time: MillisDurationU32,
        off_time: MillisDurationU32,
    ) -> Result<(), B::Error> {
        self.output
            .cycle_active_inactive(delay, on_time.convert(), off_time.convert())
    }

    pub fn release(self) -> AnalogOutput<B> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analog::{tests::RecordingPwm, PwmAnalogOutput};
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State, Transaction},
    };
    use fugit::ExtU32;

    #[test]
    fn digital_led_blinks_on_then_off() {
        let pin = PinMock::new(&[
            Transaction::set(State::Low),
            // on for on_time
            Transaction::set(State::High),
            Transaction::set(State::Low),
            // off for off_time
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let mut led = DigitalLed::new(pin, ActiveLevel::High).unwrap();
        led.blink(&mut NoopDelay::new(), 250.millis(), 250.millis())
            .unwrap();
        led.release().done();
    }

    #[test]
    fn analog_led_blinks_at_current_intensity() {
        let pwm = RecordingPwm {
            max: 255,
            ..Default::default()
        };
        let mut led = AnalogLed::new(PwmAnalogOutput::pwm(pwm, 0, 255).unwrap());
        led.intensity(0.5).unwrap();
        led.blink(&mut NoopDelay::new(), 1.millis(), 1.millis())
            .unwrap();
        assert_eq!(led.max_output_value(), 255);
        assert_eq!(led.release().release().release().duties, [0, 127, 127, 0, 127]);
    }
}
