//! Seams to the Tetrix PRIZM and EXPANSION motor controllers.
//!
//! The vendor library drives both boards over I2C; the firmware binds it through
//! `tetrix-sys` and implements these traits on top.

/// DC motor channel on a PRIZM or EXPANSION controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
#[repr(u8)]
pub enum Motor {
    One = 1,
    Two = 2,
}

/// Motor operations common to the PRIZM and an EXPANSION controller.
///
/// Speeds are in wheel degrees per second (at most 720), targets in wheel degrees.
pub trait MotorController {
    type Error;

    fn set_motor_invert(&mut self, motor: Motor, invert: bool) -> Result<(), Self::Error>;

    /// Run `motor` at `speed` with no target.
    fn set_motor_speed(&mut self, motor: Motor, speed: i32) -> Result<(), Self::Error>;

    fn set_motor_speeds(&mut self, speed_1: i32, speed_2: i32) -> Result<(), Self::Error>;

    /// Turn `motor` by `degrees` at `speed`, then hold.
    fn set_motor_degree(
        &mut self,
        motor: Motor,
        speed: i32,
        degrees: i32,
    ) -> Result<(), Self::Error>;

    fn set_motor_degrees(
        &mut self,
        speed_1: i32,
        degrees_1: i32,
        speed_2: i32,
        degrees_2: i32,
    ) -> Result<(), Self::Error>;

    fn reset_encoder(&mut self, motor: Motor) -> Result<(), Self::Error>;

    fn reset_encoders(&mut self) -> Result<(), Self::Error>;

    /// `true` while `motor` is still moving towards a degree target.
    fn read_motor_busy(&mut self, motor: Motor) -> Result<bool, Self::Error>;
}

/// The PRIZM board itself: motors plus on-board I/O.
pub trait PrizmController: MotorController {
    /// One-time controller initialization.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// `true` while the green start button is pressed.
    fn read_start_button(&mut self) -> Result<bool, Self::Error>;

    /// Battery voltage in hundredths of a volt.
    fn read_battery_voltage(&mut self) -> Result<u16, Self::Error>;

    fn read_sonic_sensor_cm(&mut self, port: SonicPort) -> Result<u16, Self::Error>;

    fn set_red_led(&mut self, on: bool) -> Result<(), Self::Error>;

    fn set_green_led(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// PRIZM digital sensor port (D2 to D5) an ultrasonic range finder is plugged into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub struct SonicPort(u8);

impl SonicPort {
    pub const D2: SonicPort = SonicPort(2);
    pub const D3: SonicPort = SonicPort(3);
    pub const D4: SonicPort = SonicPort(4);
    pub const D5: SonicPort = SonicPort(5);

    pub const fn new(port: u8) -> Option<Self> {
        match port {
            2..=5 => Some(SonicPort(port)),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }
}

impl Default for SonicPort {
    fn default() -> Self {
        SonicPort::D5
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Controller fakes that record every call.

    use super::*;
    use core::convert::Infallible;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Call {
        Begin,
        Invert(Motor, bool),
        Speed(Motor, i32),
        Speeds(i32, i32),
        Degree(Motor, i32, i32),
        Degrees(i32, i32, i32, i32),
        ResetEncoder(Motor),
        ResetEncoders,
    }

    #[derive(Debug, Default)]
    pub struct FakeController {
        pub calls: Vec<Call>,
        pub busy: [bool; 2],
        pub busy_reads: Vec<Motor>,
        /// Busy flags clear after this many `read_motor_busy` calls.
        pub busy_for_reads: Option<usize>,
        pub start_button: Vec<bool>,
        pub battery_centivolts: u16,
        pub sonic_cm: u16,
        pub sonic_ports: Vec<SonicPort>,
        pub red_led: bool,
        pub green_led: bool,
    }

    impl FakeController {
        pub fn take_calls(&mut self) -> Vec<Call> {
            core::mem::take(&mut self.calls)
        }
    }

    impl MotorController for FakeController {
        type Error = Infallible;

        fn set_motor_invert(&mut self, motor: Motor, invert: bool) -> Result<(), Infallible> {
            self.calls.push(Call::Invert(motor, invert));
            Ok(())
        }

        fn set_motor_speed(&mut self, motor: Motor, speed: i32) -> Result<(), Infallible> {
            self.calls.push(Call::Speed(motor, speed));
            Ok(())
        }

        fn set_motor_speeds(&mut self, speed_1: i32, speed_2: i32) -> Result<(), Infallible> {
            self.calls.push(Call::Speeds(speed_1, speed_2));
            Ok(())
        }

        fn set_motor_degree(
            &mut self,
            motor: Motor,
            speed: i32,
            degrees: i32,
        ) -> Result<(), Infallible> {
            self.calls.push(Call::Degree(motor, speed, degrees));
            Ok(())
        }

        fn set_motor_degrees(
            &mut self,
            speed_1: i32,
            degrees_1: i32,
            speed_2: i32,
            degrees_2: i32,
        ) -> Result<(), Infallible> {
            self.calls
                .push(Call::Degrees(speed_1, degrees_1, speed_2, degrees_2));
            Ok(())
        }

        fn reset_encoder(&mut self, motor: Motor) -> Result<(), Infallible> {
            self.calls.push(Call::ResetEncoder(motor));
            Ok(())
        }

        fn reset_encoders(&mut self) -> Result<(), Infallible> {
            self.calls.push(Call::ResetEncoders);
            Ok(())
        }

        fn read_motor_busy(&mut self, motor: Motor) -> Result<bool, Infallible> {
            self.busy_reads.push(motor);
            if let Some(reads) = self.busy_for_reads {
                if self.busy_reads.len() > reads {
                    self.busy = [false; 2];
                }
            }
            Ok(self.busy[motor as usize - 1])
        }
    }

    impl PrizmController for FakeController {
        fn begin(&mut self) -> Result<(), Infallible> {
            self.calls.push(Call::Begin);
            Ok(())
        }

        fn read_start_button(&mut self) -> Result<bool, Infallible> {
            if self.start_button.is_empty() {
                Ok(false)
            } else {
                Ok(self.start_button.remove(0))
            }
        }

        fn read_battery_voltage(&mut self) -> Result<u16, Infallible> {
            Ok(self.battery_centivolts)
        }

        fn read_sonic_sensor_cm(&mut self, port: SonicPort) -> Result<u16, Infallible> {
            self.sonic_ports.push(port);
            Ok(self.sonic_cm)
        }

        fn set_red_led(&mut self, on: bool) -> Result<(), Infallible> {
            self.red_led = on;
            Ok(())
        }

        fn set_green_led(&mut self, on: bool) -> Result<(), Infallible> {
            self.green_led = on;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonic_port_accepts_only_sensor_ports() {
        assert_eq!(SonicPort::new(3), Some(SonicPort::D3));
        assert_eq!(SonicPort::new(1), None);
        assert_eq!(SonicPort::new(6), None);
        assert_eq!(SonicPort::default().number(), 5);
    }
}
