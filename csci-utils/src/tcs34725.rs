//! Minimal TCS34725 RGB color sensor driver.

use embedded_hal::{delay::DelayNs, i2c::I2c};

pub const ADDRESS: u8 = 0x29;

const COMMAND_BIT: u8 = 0x80;
const AUTO_INCREMENT: u8 = 0x20;

const ENABLE: u8 = 0x00;
const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const ATIME: u8 = 0x01;
const CONTROL: u8 = 0x0F;
const ID: u8 = 0x12;
const CDATAL: u8 = 0x14;

/// TCS34721/5, TCS34723/7 and the clone found on some breakout boards.
const KNOWN_IDS: [u8; 3] = [0x44, 0x4D, 0x10];

/// Oscillator warm-up after power on.
const POWER_ON_MS: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tcs34725Error<E> {
    I2c(E),
    UnknownDevice(u8),
}

impl<E> From<E> for Tcs34725Error<E> {
    fn from(error: E) -> Self {
        Tcs34725Error::I2c(error)
    }
}

/// ADC integration time, as the ATIME register value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum IntegrationTime {
    #[default]
    Ms2_4 = 0xFF,
    Ms24 = 0xF6,
    Ms50 = 0xEB,
}

impl IntegrationTime {
    /// Time one RGBC conversion takes, rounded up to whole milliseconds.
    pub const fn millis(self) -> u32 {
        (256 - self as u32) * 12 / 5 + 1
    }
}

/// Analog gain, as the CONTROL register value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Gain {
    #[default]
    X1 = 0x00,
    X4 = 0x01,
    X16 = 0x02,
    X60 = 0x03,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawData {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

pub struct Tcs34725<I2C> {
    i2c: I2C,
    integration_time: IntegrationTime,
    gain: Gain,
}

impl<I2C: I2c> Tcs34725<I2C> {
    pub fn new(i2c: I2C, integration_time: IntegrationTime, gain: Gain) -> Self {
        Self {
            i2c,
            integration_time,
            gain,
        }
    }

    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Check the device ID, program integration time and gain, then power up.
    pub fn begin<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Tcs34725Error<I2C::Error>> {
        let id = self.read8(ID)?;
        if !KNOWN_IDS.contains(&id) {
            return Err(Tcs34725Error::UnknownDevice(id));
        }

        self.write8(ATIME, self.integration_time as u8)?;
        self.write8(CONTROL, self.gain as u8)?;
        self.enable(delay)
    }

    pub fn enable<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Tcs34725Error<I2C::Error>> {
        self.write8(ENABLE, ENABLE_PON)?;
        delay.delay_ms(POWER_ON_MS);
        self.write8(ENABLE, ENABLE_PON | ENABLE_AEN)?;
        delay.delay_ms(self.integration_time.millis());
        Ok(())
    }

    pub fn disable(&mut self) -> Result<(), Tcs34725Error<I2C::Error>> {
        self.write8(ENABLE, 0)
    }

    /// Read all four channels, then wait out a fresh integration cycle.
    pub fn raw_data<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<RawData, Tcs34725Error<I2C::Error>> {
        let mut buf = [0u8; 8];
        self.i2c.write_read(
            ADDRESS,
            &[COMMAND_BIT | AUTO_INCREMENT | CDATAL],
            &mut buf,
        )?;
        delay.delay_ms(self.integration_time.millis());

        Ok(RawData {
            clear: u16::from_le_bytes([buf[0], buf[1]]),
            red: u16::from_le_bytes([buf[2], buf[3]]),
            green: u16::from_le_bytes([buf[4], buf[5]]),
            blue: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write8(&mut self, register: u8, value: u8) -> Result<(), Tcs34725Error<I2C::Error>> {
        self.i2c.write(ADDRESS, &[COMMAND_BIT | register, value])?;
        Ok(())
    }

    fn read8(&mut self, register: u8) -> Result<u8, Tcs34725Error<I2C::Error>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(ADDRESS, &[COMMAND_BIT | register], &mut buf)?;
        Ok(buf[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction},
    };

    #[test]
    fn integration_periods() {
        assert_eq!(IntegrationTime::Ms2_4.millis(), 3);
        assert_eq!(IntegrationTime::Ms24.millis(), 25);
        assert_eq!(IntegrationTime::Ms50.millis(), 51);
    }

    #[test]
    fn begin_programs_and_enables() {
        let i2c = I2cMock::new(&[
            Transaction::write_read(ADDRESS, vec![0x92], vec![0x44]),
            Transaction::write(ADDRESS, vec![0x81, 0xF6]),
            Transaction::write(ADDRESS, vec![0x8F, 0x02]),
            Transaction::write(ADDRESS, vec![0x80, 0x01]),
            Transaction::write(ADDRESS, vec![0x80, 0x03]),
        ]);
        let mut sensor = Tcs34725::new(i2c, IntegrationTime::Ms24, Gain::X16);
        sensor.begin(&mut NoopDelay::new()).unwrap();
        sensor.release().done();
    }

    #[test]
    fn begin_rejects_other_devices() {
        let i2c = I2cMock::new(&[Transaction::write_read(ADDRESS, vec![0x92], vec![0x60])]);
        let mut sensor = Tcs34725::new(i2c, IntegrationTime::default(), Gain::default());
        assert_eq!(
            sensor.begin(&mut NoopDelay::new()),
            Err(Tcs34725Error::UnknownDevice(0x60))
        );
        sensor.release().done();
    }

    #[test]
    fn raw_data_is_little_endian_crgb() {
        let i2c = I2cMock::new(&[Transaction::write_read(
            ADDRESS,
            vec![0xB4],
            vec![0x10, 0x27, 0x34, 0x12, 0xFF, 0x00, 0x00, 0x01],
        )]);
        let mut sensor = Tcs34725::new(i2c, IntegrationTime::default(), Gain::default());
        let raw = sensor.raw_data(&mut NoopDelay::new()).unwrap();
        assert_eq!(
            raw,
            RawData {
                clear: 10_000,
                red: 0x1234,
                green: 255,
                blue: 256,
            }
        );
        sensor.release().done();
    }

    #[test]
    fn disable_powers_down() {
        let i2c = I2cMock::new(&[Transaction::write(ADDRESS, vec![0x80, 0x00])]);
        let mut sensor = Tcs34725::new(i2c, IntegrationTime::default(), Gain::default());
        sensor.disable().unwrap();
        sensor.release().done();
    }
}
