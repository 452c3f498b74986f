use ufmt::{uDisplay, uWrite, Formatter};

use crate::display::SerialMonitor;

/// Colors of standard electrical tape the car can recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ufmt::derive::uDebug)]
#[repr(u8)]
pub enum TapeColor {
    #[default]
    Unknown = 0,
    White = 1,
    Black = 2,
    Gray = 3,
    Red = 4,
    Green = 5,
    Blue = 6,
    Yellow = 7,
}

impl TapeColor {
    pub const fn name(self) -> &'static str {
        match self {
            TapeColor::Unknown => "unknown",
            TapeColor::White => "white",
            TapeColor::Black => "black",
            TapeColor::Gray => "gray",
            TapeColor::Red => "red",
            TapeColor::Green => "green",
            TapeColor::Blue => "blue",
            TapeColor::Yellow => "yellow",
        }
    }
}

impl uDisplay for TapeColor {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Default tolerance for "red, green and blue are about equal".
const RGB_TOLERANCE: f32 = 0.075;

/// Clear-channel intensity and red/green/blue shares of a color sample.
///
/// After white balancing, white tape reads as `c = 1.0` and `r = g = b = 1/3`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorRatios {
    c: f32,
    r: f32,
    g: f32,
    b: f32,
}

impl Default for ColorRatios {
    fn default() -> Self {
        Self::new(1.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }
}

impl ColorRatios {
    pub const fn new(c: f32, r: f32, g: f32, b: f32) -> Self {
        Self { c, r, g, b }
    }

    pub fn c_ratio(&self) -> f32 {
        self.c
    }

    pub fn r_ratio(&self) -> f32 {
        self.r
    }

    pub fn g_ratio(&self) -> f32 {
        self.g
    }

    pub fn b_ratio(&self) -> f32 {
        self.b
    }

    pub fn set_c_ratio(&mut self, c: f32) {
        self.c = c;
    }

    pub fn set_r_ratio(&mut self, r: f32) {
        self.r = r;
    }

    pub fn set_g_ratio(&mut self, g: f32) {
        self.g = g;
    }

    pub fn set_b_ratio(&mut self, b: f32) {
        self.b = b;
    }

    /// Map the ratios to a tape color.
    ///
    /// Near-gray colors (white, black, gray) are checked before the hues.
    pub fn tape_color(&self) -> TapeColor {
        if self.is_white() {
            TapeColor::White
        } else if self.is_black() {
            TapeColor::Black
        } else if self.is_gray() {
            TapeColor::Gray
        } else if self.is_red() {
            TapeColor::Red
        } else if self.is_green() {
            TapeColor::Green
        } else if self.is_blue() {
            TapeColor::Blue
        } else if self.is_yellow() {
            TapeColor::Yellow
        } else {
            TapeColor::Unknown
        }
    }

    pub fn display<W: uWrite>(&self, monitor: &mut SerialMonitor<W>) -> Result<(), W::Error> {
        monitor.send_text("C_Ratio: ")?;
        monitor.send_double(self.c, 5)?;

        monitor.send_text("    R_Ratio: ")?;
        monitor.send_double(self.r, 5)?;

        monitor.send_text("    G_Ratio: ")?;
        monitor.send_double(self.g, 5)?;

        monitor.send_text("    B_ratio: ")?;
        monitor.send_double(self.b, 5)?;

        monitor.send_newline()
    }

    fn is_white(&self) -> bool {
        self.rgb_close(RGB_TOLERANCE) && close(self.c, 1.0, 0.15)
    }

    fn is_black(&self) -> bool {
        self.rgb_close(0.15) && close(self.c, 0.05, 0.05)
    }

    fn is_gray(&self) -> bool {
        self.rgb_close(RGB_TOLERANCE) && close(self.c, 0.4, 0.15)
    }

    fn is_red(&self) -> bool {
        close(self.r, 0.75, 0.25) && close(self.g, self.b, 0.1) && close(self.c, 0.2, 0.2)
    }

    fn is_green(&self) -> bool {
        self.g / self.r >= 1.5 && close(self.g, self.b, 0.1) && close(self.c, 0.2, 0.2)
    }

    fn is_blue(&self) -> bool {
        self.b / self.r >= 2.5 && close(self.c, 0.2, 0.2)
    }

    fn is_yellow(&self) -> bool {
        self.r / self.b >= 2.5 && close(self.c, 0.8, 0.2)
    }

    /// Red is within `tolerance` of both green and blue.
    fn rgb_close(&self, tolerance: f32) -> bool {
        close(self.r, self.g, tolerance) && close(self.r, self.b, tolerance)
    }
}

fn close(a: f32, b: f32, tolerance: f32) -> bool {
    libm::fabsf(b - a) <= tolerance
}
