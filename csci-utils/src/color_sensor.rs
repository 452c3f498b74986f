//! White-balanced color sampling on top of the TCS34725.
//!
//! After construction call [`ColorSensor::setup`], then calibrate against a piece of
//! white tape held where the sensor will be used ([`ColorSensor::calibrate_white_balance`]
//! followed by [`ColorSensor::set_white_balance`], or [`ColorSensor::manual_white_balance`]).

use embedded_hal::{delay::DelayNs, digital::InputPin, i2c::I2c};
use ufmt::uWrite;

use crate::{
    color::{ColorRatios, TapeColor},
    display::SerialMonitor,
    switch::PushButton,
    tcs34725::{RawData, Tcs34725, Tcs34725Error},
};

pub use crate::tcs34725::{Gain, IntegrationTime as SampleTime};

/// The first readings after power up can be off; `setup` throws these away.
const DISCARDED_SAMPLES: u16 = 10;
const CALIBRATION_SAMPLES: u16 = 50;

/// Scale factors that make white tape read as `c = 1`, `r = g = b = 1/3`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WhiteBalance {
    pub c_scale: f32,
    pub r_scale: f32,
    pub g_scale: f32,
    pub b_scale: f32,
}

impl Default for WhiteBalance {
    /// Rough values for 2.4 ms / 1x with a fully charged battery.
    fn default() -> Self {
        Self {
            c_scale: 0.003_253_09,
            r_scale: 1.078_596_6,
            g_scale: 0.975_873_1,
            b_scale: 1.066_916_6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WhiteBalanceError<S, W, B> {
    Sensor(Tcs34725Error<S>),
    Monitor(W),
    Button(B),
}

pub struct ColorSensor<I2C, D> {
    tcs: Tcs34725<I2C>,
    delay: D,
    balance: WhiteBalance,
}

impl<I2C: I2c, D: DelayNs> ColorSensor<I2C, D> {
    pub fn new(i2c: I2C, delay: D, sample_time: SampleTime, gain: Gain) -> Self {
        Self {
            tcs: Tcs34725::new(i2c, sample_time, gain),
            delay,
            balance: WhiteBalance::default(),
        }
    }

    /// One-time sensor setup. Fails when no TCS34725 answers on the bus.
    pub fn setup(&mut self) -> Result<(), Tcs34725Error<I2C::Error>> {
        self.tcs.begin(&mut self.delay)?;

        for _ in 0..DISCARDED_SAMPLES {
            self.raw_data()?;
        }
        Ok(())
    }

    pub fn raw_data(&mut self) -> Result<RawData, Tcs34725Error<I2C::Error>> {
        self.tcs.raw_data(&mut self.delay)
    }

    /// Take a sample and scale it by the current white balance.
    pub fn color_ratios(&mut self) -> Result<ColorRatios, Tcs34725Error<I2C::Error>> {
        let raw = self.raw_data()?;
        Ok(self.ratios_for(raw))
    }

    /// Take a sample and classify it.
    pub fn tape_color(&mut self) -> Result<TapeColor, Tcs34725Error<I2C::Error>> {
        Ok(self.color_ratios()?.tape_color())
    }

    /// Average a batch of samples of a white reference into scale factors.
    ///
    /// The result is not applied; pass it to [`ColorSensor::set_white_balance`].
    pub fn calibrate_white_balance(&mut self) -> Result<WhiteBalance, Tcs34725Error<I2C::Error>> {
        let (mut sum_c, mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32, 0u32);

        for _ in 0..CALIBRATION_SAMPLES {
            let raw = self.raw_data()?;
            sum_c += u32::from(raw.clear);
            sum_r += u32::from(raw.red);
            sum_g += u32::from(raw.green);
            sum_b += u32::from(raw.blue);
        }

        let samples = f32::from(CALIBRATION_SAMPLES);
        let avg_c = sum_c as f32 / samples;
        let avg_r = sum_r as f32 / samples;
        let avg_g = sum_g as f32 / samples;
        let avg_b = sum_b as f32 / samples;

        let c_scale = 1.0 / avg_c;
        let one_third = 1.0 / 3.0;

        Ok(WhiteBalance {
            c_scale,
            r_scale: one_third / (avg_r * c_scale),
            g_scale: one_third / (avg_g * c_scale),
            b_scale: one_third / (avg_b * c_scale),
        })
    }

    pub fn set_white_balance(&mut self, balance: WhiteBalance) {
        self.balance = balance;
    }

    pub fn white_balance(&self) -> WhiteBalance {
        self.balance
    }

    /// Walk the user through white balancing on the serial monitor, pausing for
    /// `button` clicks.
    pub fn manual_white_balance<W, P>(
        &mut self,
        monitor: &mut SerialMonitor<W>,
        button: &mut PushButton<P>,
    ) -> Result<(), WhiteBalanceError<I2C::Error, W::Error, P::Error>>
    where
        W: uWrite,
        P: InputPin,
    {
        write_calibration_prompt(monitor).map_err(WhiteBalanceError::Monitor)?;

        button
            .wait_for_click(&mut self.delay)
            .map_err(WhiteBalanceError::Button)?;

        let balance = self
            .calibrate_white_balance()
            .map_err(WhiteBalanceError::Sensor)?;
        self.set_white_balance(balance);

        self.display_scaling_factors(monitor)
            .map_err(WhiteBalanceError::Monitor)?;

        let ratios = self.color_ratios().map_err(WhiteBalanceError::Sensor)?;
        write_calibrated_ratios(monitor, &ratios).map_err(WhiteBalanceError::Monitor)?;

        button
            .wait_for_click(&mut self.delay)
            .map_err(WhiteBalanceError::Button)
    }

    pub fn display_scaling_factors<W: uWrite>(
        &self,
        monitor: &mut SerialMonitor<W>,
    ) -> Result<(), W::Error> {
        monitor.send_newline()?;
        monitor.send_text("New scaling ratios are:")?;
        monitor.send_newline()?;

        monitor.send_text("C_Scale: ")?;
        monitor.send_double(self.balance.c_scale, 9)?;

        monitor.send_text("    R_Scale: ")?;
        monitor.send_double(self.balance.r_scale, 7)?;

        monitor.send_text("    G_Scale: ")?;
        monitor.send_double(self.balance.g_scale, 7)?;

        monitor.send_text("    B_Scale: ")?;
        monitor.send_double(self.balance.b_scale, 7)?;

        monitor.send_newline()
    }

    pub fn release(self) -> (I2C, D) {
        (self.tcs.release(), self.delay)
    }

    fn ratios_for(&self, raw: RawData) -> ColorRatios {
        if raw.clear == 0 {
            // Nothing to divide by: treat as a dark, neutral sample.
            return ColorRatios::new(0.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        }

        let clear = f32::from(raw.clear);
        ColorRatios::new(
            clear * self.balance.c_scale,
            f32::from(raw.red) / clear * self.balance.r_scale,
            f32::from(raw.green) / clear * self.balance.g_scale,
            f32::from(raw.blue) / clear * self.balance.b_scale,
        )
    }
}

fn write_calibration_prompt<W: uWrite>(monitor: &mut SerialMonitor<W>) -> Result<(), W::Error> {
    monitor.send_newline()?;
    monitor.send_text("Position color sensor over white tape.")?;
    monitor.send_newline()?;
    monitor.send_text("Then click pushbutton to calibrate.")?;
    monitor.send_newline()
}

fn write_calibrated_ratios<W: uWrite>(
    monitor: &mut SerialMonitor<W>,
    ratios: &ColorRatios,
) -> Result<(), W::Error> {
    monitor.send_newline()?;
    monitor.send_text("New calibration ratios are:")?;
    monitor.send_newline()?;
    monitor.send_newline()?;

    ratios.display(monitor)?;
    monitor.send_newline()?;

    monitor.send_text("Click pushbutton again to proceed...")?;
    monitor.send_newline()?;
    monitor.send_newline()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gpio::ActiveLevel, tcs34725::ADDRESS};
    use core::convert::Infallible;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State, Transaction as PinTransaction},
        i2c::{Mock as I2cMock, Transaction},
    };

    fn sample(clear: u16, red: u16, green: u16, blue: u16) -> Transaction {
        let mut bytes = vec![];
        for channel in [clear, red, green, blue] {
            bytes.extend_from_slice(&channel.to_le_bytes());
        }
        Transaction::write_read(ADDRESS, vec![0xB4], bytes)
    }

    fn sensor(expectations: &[Transaction]) -> ColorSensor<I2cMock, NoopDelay> {
        ColorSensor::new(
            I2cMock::new(expectations),
            NoopDelay::new(),
            SampleTime::default(),
            Gain::default(),
        )
    }

    fn assert_near(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "{actual} is not close to {expected}"
        );
    }

    #[derive(Default)]
    struct Capture(std::string::String);

    impl uWrite for Capture {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn setup_discards_first_samples() {
        let mut expectations = vec![
            Transaction::write_read(ADDRESS, vec![0x92], vec![0x4D]),
            Transaction::write(ADDRESS, vec![0x81, 0xFF]),
            Transaction::write(ADDRESS, vec![0x8F, 0x00]),
            Transaction::write(ADDRESS, vec![0x80, 0x01]),
            Transaction::write(ADDRESS, vec![0x80, 0x03]),
        ];
        expectations.extend((0..10).map(|_| sample(1, 2, 3, 4)));

        let mut sensor = sensor(&expectations);
        sensor.setup().unwrap();
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn setup_fails_without_sensor() {
        let mut sensor = sensor(&[Transaction::write_read(ADDRESS, vec![0x92], vec![0x00])]);
        assert_eq!(sensor.setup(), Err(Tcs34725Error::UnknownDevice(0x00)));
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn ratios_use_white_balance() {
        let mut sensor = sensor(&[sample(2000, 500, 1000, 500)]);
        sensor.set_white_balance(WhiteBalance {
            c_scale: 0.0005,
            r_scale: 1.0,
            g_scale: 0.5,
            b_scale: 2.0,
        });

        let ratios = sensor.color_ratios().unwrap();
        assert_near(ratios.c_ratio(), 1.0);
        assert_near(ratios.r_ratio(), 0.25);
        assert_near(ratios.g_ratio(), 0.25);
        assert_near(ratios.b_ratio(), 0.5);
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn dark_sample_reads_black() {
        let mut sensor = sensor(&[sample(0, 0, 0, 0)]);
        assert_eq!(sensor.tape_color().unwrap(), TapeColor::Black);
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn calibration_balances_white_reference() {
        let expectations: Vec<_> = (0..51).map(|_| sample(1000, 400, 300, 250)).collect();
        let mut sensor = sensor(&expectations);

        let balance = sensor.calibrate_white_balance().unwrap();
        assert_near(balance.c_scale, 0.001);
        assert_near(balance.r_scale, 0.833_333);
        assert_near(balance.g_scale, 1.111_111);
        assert_near(balance.b_scale, 1.333_333);
        assert_eq!(sensor.white_balance(), WhiteBalance::default());

        sensor.set_white_balance(balance);
        assert_eq!(sensor.tape_color().unwrap(), TapeColor::White);
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn manual_white_balance_prompts_between_clicks() {
        let expectations: Vec<_> = (0..51).map(|_| sample(1000, 400, 300, 250)).collect();
        let mut sensor = sensor(&expectations);

        let click = [
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
        ];
        let clicks: Vec<_> = click.iter().chain(click.iter()).cloned().collect();
        let pin = PinMock::new(&clicks);
        let mut button = PushButton::new(pin, ActiveLevel::Low);
        let mut monitor = SerialMonitor::new(Capture::default(), 9600);

        sensor
            .manual_white_balance(&mut monitor, &mut button)
            .unwrap();

        let text = monitor.release().0;
        assert!(text.starts_with(
            "\r\nPosition color sensor over white tape.\r\nThen click pushbutton to calibrate.\r\n\
             \r\nNew scaling ratios are:\r\nC_Scale: "
        ));
        assert!(text.contains("\r\nNew calibration ratios are:\r\n\r\nC_Ratio: 1.00000    R_Ratio: 0.33333"));
        assert!(text.ends_with("\r\n\r\nClick pushbutton again to proceed...\r\n\r\n"));
        assert_eq!(sensor.white_balance().c_scale, 0.001);

        button.release().done();
        let (mut i2c, _) = sensor.release();
        i2c.done();
    }
}
