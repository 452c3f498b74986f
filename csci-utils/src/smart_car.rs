//! The course's smart car: mecanum drive train plus its sensors.
//!
//! The front of the car is the end with the range finder and color sensor.

use embedded_hal::{delay::DelayNs, i2c::I2c};
use uom::si::{
    electric_potential::volt,
    f32::{ElectricPotential, Length},
    length::centimeter,
};

use crate::{
    color::TapeColor,
    color_sensor::ColorSensor,
    drive_train::{DriveTrain, TmDriveTrain},
    switch::PrizmStartButton,
    tcs34725::Tcs34725Error,
    tetrix::{MotorController, PrizmController, SonicPort},
};

mod builder;

pub use builder::{Builder, Controllers, NoColorSensor, NoControllers, WithColorSensor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmartCarError<E, I> {
    Controller(E),
    ColorSensor(Tcs34725Error<I>),
}

/// Tetrix mecanum smart car with a sonic range finder, a color sensor, the PRIZM
/// start button and its red and green LEDs.
pub struct TmSmartCar<P, E, I2C, D> {
    drive_train: TmDriveTrain<P, E>,
    color_sensor: ColorSensor<I2C, D>,
    sonic_port: SonicPort,
}

impl TmSmartCar<(), (), (), ()> {
    pub fn builder() -> Builder<NoControllers, NoColorSensor> {
        Builder::default()
    }
}

impl<P, E, I2C, D> TmSmartCar<P, E, I2C, D>
where
    P: PrizmController,
    E: MotorController<Error = P::Error>,
    I2C: I2c,
    D: DelayNs,
{
    /// Set up the controllers, then the color sensor.
    pub fn setup_car(&mut self) -> Result<(), SmartCarError<P::Error, I2C::Error>> {
        self.drive_train
            .setup()
            .map_err(SmartCarError::Controller)?;
        self.color_sensor
            .setup()
            .map_err(SmartCarError::ColorSensor)
    }

    /// Distance to the nearest obstacle ahead, to the centimeter.
    pub fn range_sensor_distance(&mut self) -> Result<Length, P::Error> {
        let cm = self
            .drive_train
            .prizm_mut()
            .read_sonic_sensor_cm(self.sonic_port)?;
        Ok(Length::new::<centimeter>(f32::from(cm)))
    }

    pub fn tape_color(&mut self) -> Result<TapeColor, Tcs34725Error<I2C::Error>> {
        self.color_sensor.tape_color()
    }

    pub fn battery_voltage(&mut self) -> Result<ElectricPotential, P::Error> {
        let centivolts = self.drive_train.prizm_mut().read_battery_voltage()?;
        Ok(ElectricPotential::new::<volt>(f32::from(centivolts) / 100.0))
    }

    pub fn start_button_pressed(&mut self) -> Result<bool, P::Error> {
        self.drive_train.prizm_mut().read_start_button()
    }

    /// Busy-wait for the start button to be pressed, then released.
    pub fn wait_start_button_clicked(&mut self) -> Result<(), P::Error> {
        PrizmStartButton::new(self.drive_train.prizm_mut()).wait_for_click()
    }

    pub fn set_red_led_state(&mut self, on: bool) -> Result<(), P::Error> {
        self.drive_train.prizm_mut().set_red_led(on)
    }

    pub fn set_green_led_state(&mut self, on: bool) -> Result<(), P::Error> {
        self.drive_train.prizm_mut().set_green_led(on)
    }

    pub fn sonic_port(&self) -> SonicPort {
        self.sonic_port
    }

    pub fn drive_train(&self) -> &TmDriveTrain<P, E> {
        &self.drive_train
    }

    pub fn drive_train_mut(&mut self) -> &mut TmDriveTrain<P, E> {
        &mut self.drive_train
    }

    pub fn color_sensor(&self) -> &ColorSensor<I2C, D> {
        &self.color_sensor
    }

    pub fn color_sensor_mut(&mut self) -> &mut ColorSensor<I2C, D> {
        &mut self.color_sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color_sensor::{Gain, SampleTime},
        drive_train::{MoveState, MovementMultipliers},
        tcs34725::ADDRESS,
        tetrix::fake::{Call, FakeController},
    };
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction},
    };

    type Car = TmSmartCar<FakeController, FakeController, I2cMock, NoopDelay>;

    fn car(prizm: FakeController, expectations: &[Transaction]) -> Car {
        let sensor = ColorSensor::new(
            I2cMock::new(expectations),
            NoopDelay::new(),
            SampleTime::Ms2_4,
            Gain::X1,
        );
        TmSmartCar::builder()
            .controllers(prizm, FakeController::default())
            .color_sensor(sensor)
            .sonic_port(SonicPort::D3)
            .build()
    }

    fn finish(car: Car) {
        let (mut i2c, _) = car.color_sensor.release();
        i2c.done();
    }

    #[test]
    fn builder_defaults() {
        let car = car(FakeController::default(), &[]);
        assert_eq!(car.sonic_port(), SonicPort::D3);
        assert_eq!(car.drive_train().speed_fraction(), 0.1);
        assert_eq!(
            car.drive_train().multipliers(),
            MovementMultipliers::SMART_CAR
        );
        assert_eq!(car.drive_train().move_state(), MoveState::Stop);
        finish(car);
    }

    #[test]
    fn setup_car_sets_up_drive_train_then_sensor() {
        let mut expectations = vec![
            Transaction::write_read(ADDRESS, vec![0x92], vec![0x44]),
            Transaction::write(ADDRESS, vec![0x81, 0xFF]),
            Transaction::write(ADDRESS, vec![0x8F, 0x00]),
            Transaction::write(ADDRESS, vec![0x80, 0x01]),
            Transaction::write(ADDRESS, vec![0x80, 0x03]),
        ];
        expectations.extend(
            (0..10).map(|_| Transaction::write_read(ADDRESS, vec![0xB4], vec![0; 8])),
        );

        let mut car = car(FakeController::default(), &expectations);
        car.setup_car().unwrap();

        assert_eq!(
            car.drive_train_mut().prizm_mut().take_calls(),
            [Call::Begin, Call::Speeds(0, 0), Call::ResetEncoders]
        );
        finish(car);
    }

    #[test]
    fn setup_car_reports_missing_sensor() {
        let mut car = car(
            FakeController::default(),
            &[Transaction::write_read(ADDRESS, vec![0x92], vec![0xFF])],
        );
        assert_eq!(
            car.setup_car(),
            Err(SmartCarError::ColorSensor(Tcs34725Error::UnknownDevice(0xFF)))
        );
        finish(car);
    }

    #[test]
    fn prizm_sensors() {
        let prizm = FakeController {
            sonic_cm: 42,
            battery_centivolts: 1234,
            ..Default::default()
        };
        let mut car = car(prizm, &[]);

        let distance = car.range_sensor_distance().unwrap();
        assert!((distance.get::<centimeter>() - 42.0).abs() < 1e-3);
        assert_eq!(car.drive_train().prizm().sonic_ports, [SonicPort::D3]);

        let voltage = car.battery_voltage().unwrap();
        assert!((voltage.get::<volt>() - 12.34).abs() < 1e-4);
        finish(car);
    }

    #[test]
    fn start_button_and_leds() {
        let prizm = FakeController {
            start_button: vec![true, false, true, true, false],
            ..Default::default()
        };
        let mut car = car(prizm, &[]);

        assert!(car.start_button_pressed().unwrap());
        car.wait_start_button_clicked().unwrap();
        assert!(car.drive_train().prizm().start_button.is_empty());

        car.set_red_led_state(true).unwrap();
        car.set_green_led_state(false).unwrap();
        assert!(car.drive_train().prizm().red_led);
        assert!(!car.drive_train().prizm().green_led);
        finish(car);
    }

    #[test]
    fn tape_color_samples_sensor() {
        let mut car = car(
            FakeController::default(),
            &[Transaction::write_read(ADDRESS, vec![0xB4], vec![0; 8])],
        );
        assert_eq!(car.tape_color().unwrap(), TapeColor::Black);
        finish(car);
    }
}
