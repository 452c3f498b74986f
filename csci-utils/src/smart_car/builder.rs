use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{
    color_sensor::ColorSensor,
    drive_train::{DriveTrain, MovementMultipliers, TmDriveTrain},
    tetrix::{MotorController, PrizmController, SonicPort},
};

use super::TmSmartCar;

#[derive(Default)]
pub struct NoControllers;
pub struct Controllers<P, E>(P, E);

#[derive(Default)]
pub struct NoColorSensor;
pub struct WithColorSensor<I2C, D>(ColorSensor<I2C, D>);

/// Collects the parts of a [`TmSmartCar`]. The controllers and the color sensor are
/// required; the rest default to the course car's values.
pub struct Builder<C, S> {
    controllers: C,
    color_sensor: S,

    multipliers: MovementMultipliers,
    sonic_port: SonicPort,
    /// Fraction of full speed.
    speed_fraction: f32,
}

impl Default for Builder<NoControllers, NoColorSensor> {
    fn default() -> Self {
        Self {
            controllers: NoControllers,
            color_sensor: NoColorSensor,

            multipliers: MovementMultipliers::SMART_CAR,
            sonic_port: SonicPort::default(),
            speed_fraction: 0.1,
        }
    }
}

impl<C, S> Builder<C, S> {
    pub fn multipliers(self, multipliers: MovementMultipliers) -> Self {
        Self {
            multipliers,
            ..self
        }
    }

    pub fn sonic_port(self, sonic_port: SonicPort) -> Self {
        Self { sonic_port, ..self }
    }

    pub fn speed_fraction(self, speed_fraction: f32) -> Self {
        Self {
            speed_fraction,
            ..self
        }
    }
}

impl<S> Builder<NoControllers, S> {
    /// The PRIZM drives the front wheels, the EXPANSION the rear ones.
    pub fn controllers<P, E>(self, prizm: P, expansion: E) -> Builder<Controllers<P, E>, S>
    where
        P: PrizmController,
        E: MotorController<Error = P::Error>,
    {
        let Self {
            color_sensor,
            multipliers,
            sonic_port,
            speed_fraction,
            ..
        } = self;

        Builder {
            controllers: Controllers(prizm, expansion),
            color_sensor,
            multipliers,
            sonic_port,
            speed_fraction,
        }
    }
}

impl<C> Builder<C, NoColorSensor> {
    pub fn color_sensor<I2C, D>(
        self,
        color_sensor: ColorSensor<I2C, D>,
    ) -> Builder<C, WithColorSensor<I2C, D>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        let Self {
            controllers,
            multipliers,
            sonic_port,
            speed_fraction,
            ..
        } = self;

        Builder {
            controllers,
            color_sensor: WithColorSensor(color_sensor),
            multipliers,
            sonic_port,
            speed_fraction,
        }
    }
}

impl<P, E, I2C, D> Builder<Controllers<P, E>, WithColorSensor<I2C, D>>
where
    P: PrizmController,
    E: MotorController<Error = P::Error>,
    I2C: I2c,
    D: DelayNs,
{
    pub fn build(self) -> TmSmartCar<P, E, I2C, D> {
        let Controllers(prizm, expansion) = self.controllers;

        let mut drive_train = TmDriveTrain::new(prizm, expansion, self.multipliers);
        drive_train.set_speed_fraction(self.speed_fraction);

        TmSmartCar {
            drive_train,
            color_sensor: self.color_sensor.0,
            sonic_port: self.sonic_port,
        }
    }
}
