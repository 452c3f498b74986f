use embedded_hal::digital::PinState;
use ufmt::uWrite;

/// Number base for integer output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Radix {
    Bin = 2,
    Oct = 8,
    #[default]
    Dec = 10,
    Hex = 16,
}

/// Text console on the serial line to the IDE.
///
/// Nothing here appends a newline on its own; call [`SerialMonitor::send_newline`].
pub struct SerialMonitor<W> {
    serial: W,
    data_rate: u32,
}

impl<W: uWrite> SerialMonitor<W> {
    pub const DEFAULT_DATA_RATE: u32 = 9600;

    /// `data_rate` is the bits per second the serial port was opened with.
    pub fn new(serial: W, data_rate: u32) -> Self {
        Self { serial, data_rate }
    }

    pub fn data_rate(&self) -> u32 {
        self.data_rate
    }

    pub fn send_integer(&mut self, value: i32, radix: Radix) -> Result<(), W::Error> {
        if value < 0 && radix == Radix::Dec {
            self.serial.write_char('-')?;
        }
        // Non-decimal bases print the two's complement bits, like Arduino's `Print`.
        let magnitude = match radix {
            Radix::Dec => value.unsigned_abs(),
            _ => value as u32,
        };
        self.send_unsigned(magnitude, radix)
    }

    pub fn send_unsigned(&mut self, value: u32, radix: Radix) -> Result<(), W::Error> {
        write_radix(&mut self.serial, value, radix)
    }

    pub fn send_boolean(&mut self, value: bool) -> Result<(), W::Error> {
        self.send_text(if value { "true" } else { "false" })
    }

    /// Print `value` with `decimals` digits after the point.
    pub fn send_double(&mut self, value: f32, decimals: u8) -> Result<(), W::Error> {
        write_float(&mut self.serial, value, decimals)
    }

    pub fn send_digital_logic(&mut self, value: PinState) -> Result<(), W::Error> {
        self.send_text(match value {
            PinState::High => "HIGH",
            PinState::Low => "LOW",
        })
    }

    pub fn send_text(&mut self, text: &str) -> Result<(), W::Error> {
        self.serial.write_str(text)
    }

    pub fn send_newline(&mut self) -> Result<(), W::Error> {
        self.serial.write_str("\r\n")
    }

    /// Direct access for `ufmt::uwrite!`.
    pub fn writer(&mut self) -> &mut W {
        &mut self.serial
    }

    pub fn release(self) -> W {
        self.serial
    }
}

impl<W: uWrite> uWrite for SerialMonitor<W> {
    type Error = W::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.serial.write_str(s)
    }
}

fn write_radix<W: uWrite>(serial: &mut W, value: u32, radix: Radix) -> Result<(), W::Error> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let base = radix as u32;

    // Largest power of the base not above `value`; most significant digit first.
    let mut divisor = 1;
    while value / divisor >= base {
        divisor *= base;
    }
    loop {
        serial.write_char(char::from(DIGITS[((value / divisor) % base) as usize]))?;
        if divisor == 1 {
            return Ok(());
        }
        divisor /= base;
    }
}

/// Same rules as Arduino's `Print::printFloat`.
fn write_float<W: uWrite>(serial: &mut W, value: f32, decimals: u8) -> Result<(), W::Error> {
    if value.is_nan() {
        return serial.write_str("nan");
    }
    if value.is_infinite() {
        return serial.write_str("inf");
    }
    if value > 4_294_967_040.0 || value < -4_294_967_040.0 {
        return serial.write_str("ovf");
    }

    let mut number = value;
    if number < 0.0 {
        serial.write_char('-')?;
        number = -number;
    }

    let mut rounding = 0.5;
    for _ in 0..decimals {
        rounding /= 10.0;
    }
    number += rounding;

    let int_part = number as u32;
    write_radix(serial, int_part, Radix::Dec)?;

    let mut remainder = number - int_part as f32;
    if decimals > 0 {
        serial.write_char('.')?;
    }
    for _ in 0..decimals {
        remainder *= 10.0;
        let digit = remainder as u32;
        serial.write_char(char::from(b'0' + (digit % 10) as u8))?;
        remainder -= digit as f32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct Capture(std::string::String);

    impl uWrite for Capture {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn monitor() -> SerialMonitor<Capture> {
        SerialMonitor::new(Capture::default(), SerialMonitor::<Capture>::DEFAULT_DATA_RATE)
    }

    #[test]
    fn integers_in_each_radix() {
        let mut monitor = monitor();
        monitor.send_integer(-42, Radix::Dec).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(255, Radix::Hex).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(8, Radix::Oct).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(5, Radix::Bin).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_integer(-1, Radix::Hex).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(0, Radix::Dec).unwrap();
        assert_eq!(monitor.release().0, "-42 FF 10 101 FFFFFFFF 0");
    }

    #[test]
    fn doubles_round_at_last_decimal() {
        let mut monitor = monitor();
        monitor.send_double(1.2345, 3).unwrap();
        monitor.send_newline().unwrap();
        monitor.send_double(-2.5, 0).unwrap();
        monitor.send_newline().unwrap();
        monitor.send_double(12.3456, 2).unwrap();
        assert_eq!(monitor.release().0, "1.235\r\n-3\r\n12.35");
    }

    #[test]
    fn doubles_stream_every_requested_decimal() {
        let mut monitor = monitor();
        monitor.send_double(1_234_567_890.0, 40).unwrap();
        let text = monitor.release().0;
        assert_eq!(text.len(), 51);
        assert_eq!(text, std::format!("1234567936.{}", "0".repeat(40)));
    }

    #[test]
    fn unsigned_extremes() {
        let mut monitor = monitor();
        monitor.send_unsigned(u32::MAX, Radix::Dec).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(u32::MAX, Radix::Bin).unwrap();
        monitor.send_text(" ").unwrap();
        monitor.send_unsigned(0x8000_0000, Radix::Oct).unwrap();
        assert_eq!(
            monitor.release().0,
            std::format!("4294967295 {} 20000000000", "1".repeat(32))
        );
    }

    #[test]
    fn doubles_special_values() {
        let mut monitor = monitor();
        monitor.send_double(f32::NAN, 2).unwrap();
        monitor.send_double(f32::INFINITY, 2).unwrap();
        monitor.send_double(5.0e9, 2).unwrap();
        assert_eq!(monitor.release().0, "naninfovf");
    }

    #[test]
    fn booleans_and_logic_levels() {
        let mut monitor = monitor();
        monitor.send_boolean(true).unwrap();
        monitor.send_boolean(false).unwrap();
        monitor.send_digital_logic(PinState::High).unwrap();
        monitor.send_digital_logic(PinState::Low).unwrap();
        assert_eq!(monitor.data_rate(), 9600);
        assert_eq!(monitor.release().0, "truefalseHIGHLOW");
    }

    #[test]
    fn usable_with_uwrite_macros() {
        let mut monitor = monitor();
        ufmt::uwrite!(monitor, "port {}", 5u8).unwrap();
        assert_eq!(monitor.release().0, "port 5");
    }
}
