//! PRIZM and EXPANSION controllers backed by the vendor library.

use core::{
    convert::Infallible,
    ffi::{c_int, c_long},
};

use csci_utils::tetrix::{Motor, MotorController, PrizmController, SonicPort};
use tetrix_sys::{EXPANSION, PRIZM};

/// The EXPANSION ships with its ID jumpers set to 1.
pub const DEFAULT_EXPANSION_ID: c_int = 1;

const MAX_SPEED_DPS: i32 = 720;

fn channel(motor: Motor) -> c_int {
    motor as c_int
}

fn speed(dps: i32) -> c_int {
    dps.clamp(-MAX_SPEED_DPS, MAX_SPEED_DPS) as c_int
}

fn degrees(target: i32) -> c_long {
    target.into()
}

fn flag(on: bool) -> c_int {
    c_int::from(on)
}

/// Negative readings mean the library had nothing to report.
fn reading(value: c_int) -> u16 {
    u16::try_from(value).unwrap_or(0)
}

pub struct Prizm {
    inner: PRIZM,
}

impl Prizm {
    pub fn new() -> Self {
        Self {
            inner: PRIZM::default(),
        }
    }
}

impl MotorController for Prizm {
    type Error = Infallible;

    fn set_motor_invert(&mut self, motor: Motor, invert: bool) -> Result<(), Infallible> {
        unsafe { self.inner.setMotorInvert(channel(motor), flag(invert)) };
        Ok(())
    }

    fn set_motor_speed(&mut self, motor: Motor, dps: i32) -> Result<(), Infallible> {
        unsafe { self.inner.setMotorSpeed(channel(motor), speed(dps)) };
        Ok(())
    }

    fn set_motor_speeds(&mut self, speed_1: i32, speed_2: i32) -> Result<(), Infallible> {
        unsafe { self.inner.setMotorSpeeds(speed(speed_1), speed(speed_2)) };
        Ok(())
    }

    fn set_motor_degree(
        &mut self,
        motor: Motor,
        dps: i32,
        target: i32,
    ) -> Result<(), Infallible> {
        unsafe {
            self.inner
                .setMotorDegree(channel(motor), speed(dps), degrees(target))
        };
        Ok(())
    }

    fn set_motor_degrees(
        &mut self,
        speed_1: i32,
        degrees_1: i32,
        speed_2: i32,
        degrees_2: i32,
    ) -> Result<(), Infallible> {
        unsafe {
            self.inner.setMotorDegrees(
                speed(speed_1),
                degrees(degrees_1),
                speed(speed_2),
                degrees(degrees_2),
            )
        };
        Ok(())
    }

    fn reset_encoder(&mut self, motor: Motor) -> Result<(), Infallible> {
        unsafe { self.inner.resetEncoder(channel(motor)) };
        Ok(())
    }

    fn reset_encoders(&mut self) -> Result<(), Infallible> {
        unsafe { self.inner.resetEncoders() };
        Ok(())
    }

    fn read_motor_busy(&mut self, motor: Motor) -> Result<bool, Infallible> {
        Ok(unsafe { self.inner.readMotorBusy(channel(motor)) } != 0)
    }
}

impl PrizmController for Prizm {
    fn begin(&mut self) -> Result<(), Infallible> {
        unsafe { self.inner.PrizmBegin() };
        Ok(())
    }

    fn read_start_button(&mut self) -> Result<bool, Infallible> {
        Ok(unsafe { self.inner.readStartButton() } != 0)
    }

    fn read_battery_voltage(&mut self) -> Result<u16, Infallible> {
        Ok(reading(unsafe { self.inner.readBatteryVoltage() }))
    }

    fn read_sonic_sensor_cm(&mut self, port: SonicPort) -> Result<u16, Infallible> {
        let port = c_int::from(port.number());
        Ok(reading(unsafe { self.inner.readSonicSensorCM(port) }))
    }

    fn set_red_led(&mut self, on: bool) -> Result<(), Infallible> {
        unsafe { self.inner.setRedLED(flag(on)) };
        Ok(())
    }

    fn set_green_led(&mut self, on: bool) -> Result<(), Infallible> {
        unsafe { self.inner.setGreenLED(flag(on)) };
        Ok(())
    }
}

/// An EXPANSION controller daisy-chained to the PRIZM.
pub struct Expansion {
    inner: EXPANSION,
    id: c_int,
}

impl Expansion {
    pub fn new(id: c_int) -> Self {
        Self {
            inner: EXPANSION::default(),
            id,
        }
    }
}

impl MotorController for Expansion {
    type Error = Infallible;

    fn set_motor_invert(&mut self, motor: Motor, invert: bool) -> Result<(), Infallible> {
        unsafe {
            self.inner
                .setMotorInvert(self.id, channel(motor), flag(invert))
        };
        Ok(())
    }

    fn set_motor_speed(&mut self, motor: Motor, dps: i32) -> Result<(), Infallible> {
        unsafe { self.inner.setMotorSpeed(self.id, channel(motor), speed(dps)) };
        Ok(())
    }

    fn set_motor_speeds(&mut self, speed_1: i32, speed_2: i32) -> Result<(), Infallible> {
        unsafe {
            self.inner
                .setMotorSpeeds(self.id, speed(speed_1), speed(speed_2))
        };
        Ok(())
    }

    fn set_motor_degree(
        &mut self,
        motor: Motor,
        dps: i32,
        target: i32,
    ) -> Result<(), Infallible> {
        unsafe {
            self.inner
                .setMotorDegree(self.id, channel(motor), speed(dps), degrees(target))
        };
        Ok(())
    }

    fn set_motor_degrees(
        &mut self,
        speed_1: i32,
        degrees_1: i32,
        speed_2: i32,
        degrees_2: i32,
    ) -> Result<(), Infallible> {
        unsafe {
            self.inner.setMotorDegrees(
                self.id,
                speed(speed_1),
                degrees(degrees_1),
                speed(speed_2),
                degrees(degrees_2),
            )
        };
        Ok(())
    }

    fn reset_encoder(&mut self, motor: Motor) -> Result<(), Infallible> {
        unsafe { self.inner.resetEncoder(self.id, channel(motor)) };
        Ok(())
    }

    fn reset_encoders(&mut self) -> Result<(), Infallible> {
        unsafe { self.inner.resetEncoders(self.id) };
        Ok(())
    }

    fn read_motor_busy(&mut self, motor: Motor) -> Result<bool, Infallible> {
        Ok(unsafe { self.inner.readMotorBusy(self.id, channel(motor)) } != 0)
    }
}
