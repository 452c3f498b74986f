use embedded_hal::{delay::DelayNs, pwm::SetDutyCycle};
use fugit::MicrosDurationU32;

/// Raw write side of an analog output port.
pub trait AnalogPort {
    type Error;

    /// Output `value` with no scaling.
    fn write_raw(&mut self, value: i16) -> Result<(), Self::Error>;
}

/// Raw read side of an analog input (ADC) channel.
pub trait AnalogChannel {
    type Error;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// An output port taking integer values between `min` and `max`.
///
/// `min` produces the lowest voltage and `max` the highest; `min > max` is allowed and
/// inverts the mapping.
#[derive(Debug)]
pub struct AnalogOutput<B> {
    port: B,
    min: i16,
    max: i16,
    last_value: i16,
}

impl<B: AnalogPort> AnalogOutput<B> {
    pub const DEFAULT_MIN: i16 = 0;
    pub const DEFAULT_MAX: i16 = 255;

    pub fn new(port: B, min: i16, max: i16) -> Self {
        Self {
            port,
            min,
            max,
            last_value: 0,
        }
    }

    /// Output a fraction of the voltage range (0.0 = minimum, 1.0 = maximum).
    pub fn output(&mut self, fraction: f32) -> Result<(), B::Error> {
        let fraction = fraction.clamp(0.0, 1.0);
        let (min, max) = (i32::from(self.min), i32::from(self.max));
        let value = if min <= max {
            min + ((max - min) as f32 * fraction) as i32
        } else {
            min - ((min - max) as f32 * fraction) as i32
        };
        // Always between min and max.
        self.output_port_value(value as i16)
    }

    pub fn output_port_value(&mut self, value: i16) -> Result<(), B::Error> {
        self.port.write_raw(value)?;
        self.last_value = value;
        Ok(())
    }

    pub fn min_output_value(&self) -> i16 {
        self.min
    }

    pub fn max_output_value(&self) -> i16 {
        self.max
    }

    pub fn last_port_value(&self) -> i16 {
        self.last_value
    }

    /// Hold the last value for `active`, drop to minimum for `inactive`, then restore.
    pub fn cycle_active_inactive<D: DelayNs>(
        &mut self,
        delay: &mut D,
        active: MicrosDurationU32,
        inactive: MicrosDurationU32,
    ) -> Result<(), B::Error> {
        let last = self.last_value;

        self.output_port_value(last)?;
        delay.delay_us(active.to_micros());

        self.output(0.0)?;
        delay.delay_us(inactive.to_micros());

        self.output_port_value(last)
    }

    pub fn release(self) -> B {
        self.port
    }
}

/// Hardware PWM channel used as an analog port.
#[derive(Debug)]
pub struct PwmPort<P> {
    pwm: P,
}

impl<P: SetDutyCycle> PwmPort<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> AnalogPort for PwmPort<P> {
    type Error = P::Error;

    fn write_raw(&mut self, value: i16) -> Result<(), Self::Error> {
        let max = self.pwm.max_duty_cycle();
        let duty = value.clamp(0, i16::MAX) as u16;
        self.pwm.set_duty_cycle(duty.min(max))
    }
}

/// Analog output driven by a hardware PWM stream.
///
/// On an Uno, pins 5 and 6 run at 980 Hz and pins 3, 9, 10 and 11 at 490 Hz.
pub type PwmAnalogOutput<P> = AnalogOutput<PwmPort<P>>;

impl<P: SetDutyCycle> AnalogOutput<PwmPort<P>> {
    /// Wraps a PWM channel and sets it to minimum output.
    pub fn pwm(pwm: P, min: i16, max: i16) -> Result<Self, P::Error> {
        let mut output = Self::new(PwmPort::new(pwm), min, max);
        output.output(0.0)?;
        Ok(output)
    }
}

/// An input port reading integer values between `min` and `max`.
#[derive(Debug)]
pub struct AnalogInput<C> {
    channel: C,
    min: u16,
    max: u16,
}

impl<C: AnalogChannel> AnalogInput<C> {
    pub const DEFAULT_MIN: u16 = 0;
    pub const DEFAULT_MAX: u16 = 1023;

    pub fn new(channel: C, min: u16, max: u16) -> Self {
        Self { channel, min, max }
    }

    /// Fraction of the input range (0.0 = minimum voltage, 1.0 = maximum).
    pub fn input(&mut self) -> Result<f32, C::Error> {
        let value = self.input_port_value()? as f32;
        let (min, max) = (self.min as f32, self.max as f32);

        if self.min <= self.max {
            Ok((value - min) / (max - min))
        } else {
            Ok((min - value) / (min - max))
        }
    }

    pub fn input_port_value(&mut self) -> Result<u16, C::Error> {
        self.channel.read_raw()
    }

    pub fn min_input_value(&self) -> u16 {
        self.min
    }

    pub fn max_input_value(&self) -> u16 {
        self.max
    }

    pub fn release(self) -> C {
        self.channel
    }
}
