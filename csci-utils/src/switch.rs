use embedded_hal::{delay::DelayNs, digital::InputPin};

use crate::{digital::DigitalInput, gpio::ActiveLevel, tetrix::PrizmController};

/// Time a button must stay put before a press or release counts.
pub const DEBOUNCE_MS: u32 = 50;

/// A switch on a digital input: open (inactive) or closed (active).
#[derive(Debug)]
pub struct DigitalSwitch<P> {
    input: DigitalInput<P>,
}

impl<P: InputPin> DigitalSwitch<P> {
    /// `closed_level` is the level read while the switch is closed, usually `Low`
    /// with a pull-up.
    pub fn new(pin: P, closed_level: ActiveLevel) -> Self {
        Self {
            input: DigitalInput::new(pin, closed_level),
        }
    }

    pub fn open(&mut self) -> Result<bool, P::Error> {
        self.input.inactive()
    }

    pub fn closed(&mut self) -> Result<bool, P::Error> {
        self.input.active()
    }

    /// Level read while the switch is closed.
    pub fn set_active_level(&mut self, closed_level: ActiveLevel) {
        self.input.set_active_level(closed_level);
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.input.active_level()
    }

    pub fn release(self) -> P {
        self.input.release()
    }
}

/// A momentary switch, closed only while pushed.
#[derive(Debug)]
pub struct PushButton<P> {
    switch: DigitalSwitch<P>,
}

impl<P: InputPin> PushButton<P> {
    pub fn new(pin: P, closed_level: ActiveLevel) -> Self {
        Self {
            switch: DigitalSwitch::new(pin, closed_level),
        }
    }

    pub fn open(&mut self) -> Result<bool, P::Error> {
        self.switch.open()
    }

    pub fn closed(&mut self) -> Result<bool, P::Error> {
        self.switch.closed()
    }

    pub fn set_active_level(&mut self, closed_level: ActiveLevel) {
        self.switch.set_active_level(closed_level);
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.switch.active_level()
    }

    /// Wait until the button is pressed, then released.
    pub fn wait_for_click<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.wait_until_closed(delay)?;
        self.wait_until_open(delay)
    }

    /// Wait until the button is still closed after the debounce time.
    pub fn wait_until_closed<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        loop {
            while self.open()? {}

            delay.delay_ms(DEBOUNCE_MS);

            if !self.open()? {
                return Ok(());
            }
        }
    }

    /// Wait until the button is still open after the debounce time.
    pub fn wait_until_open<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        loop {
            while self.closed()? {}

            delay.delay_ms(DEBOUNCE_MS);

            if !self.closed()? {
                return Ok(());
            }
        }
    }

    pub fn release(self) -> P {
        self.switch.release()
    }
}

/// Which of two buttons [`wait_for_either_button_click`] saw first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum ButtonClicked {
    First,
    Second,
}

/// Wait for either button to be clicked. `first` is checked before `second`.
pub fn wait_for_either_button_click<A, B, E, D>(
    first: &mut PushButton<A>,
    second: &mut PushButton<B>,
    delay: &mut D,
) -> Result<ButtonClicked, E>
where
    A: InputPin<Error = E>,
    B: InputPin<Error = E>,
    D: DelayNs,
{
    loop {
        if first.closed()? {
            first.wait_for_click(delay)?;
            return Ok(ButtonClicked::First);
        }

        if second.closed()? {
            second.wait_for_click(delay)?;
            return Ok(ButtonClicked::Second);
        }
    }
}

/// The green start button on the PRIZM board.
pub struct PrizmStartButton<'a, C> {
    prizm: &'a mut C,
}

impl<'a, C: PrizmController> PrizmStartButton<'a, C> {
    pub fn new(prizm: &'a mut C) -> Self {
        Self { prizm }
    }

    pub fn open(&mut self) -> Result<bool, C::Error> {
        Ok(!self.prizm.read_start_button()?)
    }

    pub fn closed(&mut self) -> Result<bool, C::Error> {
        self.prizm.read_start_button()
    }

    /// Wait until pressed, then released. The PRIZM debounces in hardware.
    pub fn wait_for_click(&mut self) -> Result<(), C::Error> {
        while self.open()? {}
        while self.closed()? {}
        Ok(())
    }
}
