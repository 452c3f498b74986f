use core::cell::Cell;

use arduino_hal::pac::TC0;
use avr_device::interrupt::Mutex;
use fugit::TimerInstantU32;

pub type Instant = TimerInstantU32<1_000>;

pub(crate) static CLOCK: Clock = Clock::new();

/// Millisecond clock kept by the Arduino core's timer 0 overflow interrupt.
pub struct Clock {
    started: Mutex<Cell<bool>>,
}

impl Clock {
    pub const fn new() -> Self {
        Self {
            started: Mutex::new(Cell::new(false)),
        }
    }

    /// Runs the Arduino core `init()`, which takes over timer 0 and enables interrupts.
    ///
    /// Timers 1 and 2 and the ADC are reset to the core defaults as well, so
    /// configure those afterwards.
    pub fn start(&self, _tc0: TC0) {
        unsafe { tetrix_sys::init() };
        avr_device::interrupt::free(|cs| self.started.borrow(cs).set(true));
    }

    pub fn now(&self) -> Instant {
        let started = avr_device::interrupt::free(|cs| self.started.borrow(cs).get());
        if !started {
            return Instant::from_ticks(0);
        }

        Instant::from_ticks(unsafe { tetrix_sys::millis() })
    }
}
