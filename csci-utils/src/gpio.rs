use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Pin level at which the attached device counts as "active".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveLevel {
    #[default]
    High,
    Low,
}

impl ActiveLevel {
    pub const fn active_state(self) -> PinState {
        match self {
            ActiveLevel::High => PinState::High,
            ActiveLevel::Low => PinState::Low,
        }
    }

    pub const fn inactive_state(self) -> PinState {
        match self {
            ActiveLevel::High => PinState::Low,
            ActiveLevel::Low => PinState::High,
        }
    }

    pub fn is_active(self, state: PinState) -> bool {
        state == self.active_state()
    }
}

/// Output pin that is either active or inactive.
///
/// The pin is driven inactive as soon as it is wrapped.
#[derive(Debug)]
pub struct GpioOutputPin<P> {
    pin: P,
    active: ActiveLevel,
}

impl<P: OutputPin> GpioOutputPin<P> {
    pub fn new(pin: P, active: ActiveLevel) -> Result<Self, P::Error> {
        let mut gpio = Self { pin, active };
        gpio.inactive()?;
        Ok(gpio)
    }

    pub fn active(&mut self) -> Result<(), P::Error> {
        self.pin.set_state(self.active.active_state())
    }

    pub fn inactive(&mut self) -> Result<(), P::Error> {
        self.pin.set_state(self.active.inactive_state())
    }

    /// Changes which level counts as active. The pin itself is not touched.
    pub fn set_active_level(&mut self, active: ActiveLevel) {
        self.active = active;
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    pub fn release(self) -> P {
        self.pin
    }
}

/// Input pin that reads as active or inactive.
///
/// Pull-up selection belongs to the HAL pin type (e.g. `into_pull_up_input()`),
/// so it happens before the pin is handed over.
#[derive(Debug)]
pub struct GpioInputPin<P> {
    pin: P,
    active: ActiveLevel,
}

impl<P: InputPin> GpioInputPin<P> {
    pub fn new(pin: P, active: ActiveLevel) -> Self {
        Self { pin, active }
    }

    pub fn active(&mut self) -> Result<bool, P::Error> {
        let state = PinState::from(self.pin.is_high()?);
        Ok(self.active.is_active(state))
    }

    pub fn inactive(&mut self) -> Result<bool, P::Error> {
        Ok(!self.active()?)
    }

    pub fn set_active_level(&mut self, active: ActiveLevel) {
        self.active = active;
    }

    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    pub fn release(self) -> P {
        self.pin
    }
}
