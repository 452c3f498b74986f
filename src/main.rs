#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

//! Smart car bring-up: checks the hardware, then drives a square on the start button,
//! reporting each leg's timing and the tape color underneath.

#[cfg(target_arch = "avr")]
mod board;
#[cfg(target_arch = "avr")]
mod clock;
#[cfg(target_arch = "avr")]
mod tetrix;
#[cfg(target_arch = "avr")]
mod wire;

#[cfg(target_arch = "avr")]
mod firmware {
    use core::convert::Infallible;

    use arduino_hal::{
        prelude::*,
        simple_pwm::{IntoPwmPin, Prescaler, Timer2Pwm},
        Delay,
    };
    use csci_utils::{
        analog::{AnalogInput, PwmAnalogOutput},
        color_sensor::{ColorSensor, Gain, SampleTime, WhiteBalanceError},
        display::SerialMonitor,
        drive_train::{DriveTrain, MoveState},
        gpio::ActiveLevel,
        led::AnalogLed,
        smart_car::{SmartCarError, TmSmartCar},
        sound::ActiveBuzzer,
        switch::PushButton,
        tcs34725::Tcs34725Error,
    };
    use fugit::ExtU32;
    use panic_halt as _;
    use ufmt::uWrite;
    use uom::si::{electric_potential::volt, length::centimeter};

    use crate::{
        board::{AdcInput, PwmChannel},
        clock::CLOCK,
        tetrix::{Expansion, Prizm, DEFAULT_EXPANSION_ID},
        wire::{ArduinoWire, WireError},
    };

    const SERIAL_DATA_RATE: u32 = 9600;
    const SQUARE_SIDE_MM: f32 = 300.0;
    const LEGS: [MoveState; 4] = [
        MoveState::Forward,
        MoveState::Right,
        MoveState::Reverse,
        MoveState::Left,
    ];
    const MIN_CLEARANCE_CM: f32 = 20.0;
    const MIN_SPEED: f32 = 0.1;
    const MAX_SPEED: f32 = 0.5;

    type Car = TmSmartCar<Prizm, Expansion, ArduinoWire, Delay>;

    pub fn run() -> ! {
        let dp = arduino_hal::Peripherals::take().unwrap();
        let pins = arduino_hal::pins!(dp);
        let serial = arduino_hal::default_serial!(dp, pins, SERIAL_DATA_RATE);
        let mut monitor = SerialMonitor::new(serial, SERIAL_DATA_RATE);
        let mut delay = Delay::new();

        // Must come before the timer 2 and ADC setup below.
        CLOCK.start(dp.TC0);

        let timer2 = Timer2Pwm::new(dp.TC2, Prescaler::Prescale64);
        let status_pwm = PwmChannel::new(pins.d3.into_output().into_pwm(&timer2));
        let mut status_led = AnalogLed::new(
            PwmAnalogOutput::pwm(status_pwm, 0, 255).unwrap_infallible(),
        );
        let mut buzzer =
            ActiveBuzzer::new(pins.d2.into_output(), ActiveLevel::High).unwrap_infallible();
        let mut calibrate_button = PushButton::new(pins.d4.into_pull_up_input(), ActiveLevel::Low);

        let mut adc = arduino_hal::Adc::new(dp.ADC, Default::default());
        let knob_channel = pins.a1.into_analog_input(&mut adc).into_channel();
        let mut speed_knob = AnalogInput::new(
            AdcInput::new(adc, knob_channel),
            AnalogInput::<AdcInput>::DEFAULT_MIN,
            AnalogInput::<AdcInput>::DEFAULT_MAX,
        );
        let speed = MIN_SPEED + (MAX_SPEED - MIN_SPEED) * speed_knob.input().unwrap_infallible();

        let color_sensor = ColorSensor::new(
            ArduinoWire::new(),
            Delay::new(),
            SampleTime::Ms24,
            Gain::X4,
        );
        let mut car: Car = TmSmartCar::builder()
            .speed_fraction(speed)
            .controllers(Prizm::new(), Expansion::new(DEFAULT_EXPANSION_ID))
            .color_sensor(color_sensor)
            .build();

        if let Err(error) = car.setup_car() {
            match error {
                SmartCarError::Controller(never) => match never {},
                SmartCarError::ColorSensor(error) => report_sensor_error(&mut monitor, error),
            }
            halt(&mut car);
        }

        let battery = car.battery_voltage().unwrap_infallible();
        monitor.send_text("Battery: ").unwrap_infallible();
        monitor.send_double(battery.get::<volt>(), 2).unwrap_infallible();
        monitor.send_text(" V").unwrap_infallible();
        monitor.send_newline().unwrap_infallible();

        monitor.send_text("Speed: ").unwrap_infallible();
        monitor
            .send_double(car.drive_train().speed_fraction(), 2)
            .unwrap_infallible();
        monitor.send_newline().unwrap_infallible();

        // Holding the calibration button through reset runs a white balance first.
        if calibrate_button.closed().unwrap_infallible() {
            calibrate_button
                .wait_until_open(&mut delay)
                .unwrap_infallible();
            let result = car
                .color_sensor_mut()
                .manual_white_balance(&mut monitor, &mut calibrate_button);
            match result {
                Ok(()) => {}
                Err(WhiteBalanceError::Sensor(error)) => report_sensor_error(&mut monitor, error),
                Err(WhiteBalanceError::Monitor(never)) | Err(WhiteBalanceError::Button(never)) => {
                    match never {}
                }
            }
        }

        ufmt::uwriteln!(&mut monitor, "Press start").unwrap_infallible();
        car.wait_start_button_clicked().unwrap_infallible();
        car.set_green_led_state(true).unwrap_infallible();

        for state in LEGS {
            let clearance = car.range_sensor_distance().unwrap_infallible();
            if state == MoveState::Forward && clearance.get::<centimeter>() < MIN_CLEARANCE_CM {
                ufmt::uwriteln!(&mut monitor, "Obstacle ahead, stopping").unwrap_infallible();
                buzzer.alert(&mut delay).unwrap_infallible();
                break;
            }

            let expected = car.drive_train().mm_travel_time(state, SQUARE_SIDE_MM);
            let started = CLOCK.now();

            let drive_train = car.drive_train_mut();
            drive_train.move_mm(state, SQUARE_SIDE_MM).unwrap_infallible();
            drive_train
                .wait_until_idle(&mut delay, 10.millis())
                .unwrap_infallible();

            let elapsed = CLOCK
                .now()
                .checked_duration_since(started)
                .map_or(0, |elapsed| elapsed.to_millis());
            ufmt::uwriteln!(
                &mut monitor,
                "{:?}: expected {} ms, took {} ms",
                state,
                expected.to_millis(),
                elapsed
            )
            .unwrap_infallible();

            match car.tape_color() {
                Ok(color) => ufmt::uwriteln!(&mut monitor, "Tape: {}", color).unwrap_infallible(),
                Err(error) => report_sensor_error(&mut monitor, error),
            }

            status_led.intensity(1.0).unwrap_infallible();
            status_led
                .blink(&mut delay, 100.millis(), 100.millis())
                .unwrap_infallible();
            status_led.intensity(0.0).unwrap_infallible();
        }

        car.drive_train_mut().stop().unwrap_infallible();
        car.set_green_led_state(false).unwrap_infallible();
        buzzer.beep(&mut delay, 500.millis()).unwrap_infallible();
        ufmt::uwriteln!(&mut monitor, "Done").unwrap_infallible();

        loop {
            arduino_hal::delay_ms(1000);
        }
    }

    fn report_sensor_error<W: uWrite<Error = Infallible>>(
        monitor: &mut SerialMonitor<W>,
        error: Tcs34725Error<WireError>,
    ) {
        match error {
            Tcs34725Error::I2c(error) => {
                ufmt::uwriteln!(monitor, "Color sensor I2C error: {:?}", error)
            }
            Tcs34725Error::UnknownDevice(id) => {
                ufmt::uwriteln!(monitor, "Unexpected color sensor ID {}", id)
            }
        }
        .unwrap_infallible();
    }

    /// Stop the motors and blink the red LED forever.
    fn halt(car: &mut Car) -> ! {
        car.drive_train_mut().stop().unwrap_infallible();
        loop {
            car.set_red_led_state(true).unwrap_infallible();
            arduino_hal::delay_ms(250);
            car.set_red_led_state(false).unwrap_infallible();
            arduino_hal::delay_ms(250);
        }
    }
}

#[cfg(target_arch = "avr")]
#[arduino_hal::entry]
fn main() -> ! {
    firmware::run()
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
