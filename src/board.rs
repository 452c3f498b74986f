//! Uno peripherals adapted to the `csci-utils` port traits.

use core::convert::Infallible;

use arduino_hal::{
    adc::Channel,
    hal::port::PD3,
    port::{mode::PwmOutput, Pin},
    simple_pwm::Timer2Pwm,
    Adc,
};
use csci_utils::analog::AnalogChannel;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// PWM output on D3 (timer 2, 490 Hz).
pub struct PwmChannel {
    pin: Pin<PwmOutput<Timer2Pwm>, PD3>,
}

impl PwmChannel {
    pub fn new(mut pin: Pin<PwmOutput<Timer2Pwm>, PD3>) -> Self {
        pin.set_duty(0);
        pin.enable();
        Self { pin }
    }
}

impl ErrorType for PwmChannel {
    type Error = Infallible;
}

impl SetDutyCycle for PwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        u8::MAX.into()
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        let duty = u8::try_from(duty).unwrap_or(u8::MAX);
        self.pin.set_duty(duty);
        Ok(())
    }
}

/// One ADC channel, read with blocking conversions.
pub struct AdcInput {
    adc: Adc,
    channel: Channel,
}

impl AdcInput {
    pub fn new(adc: Adc, channel: Channel) -> Self {
        Self { adc, channel }
    }
}

impl AnalogChannel for AdcInput {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Infallible> {
        Ok(self.adc.read_blocking(&self.channel))
    }
}
