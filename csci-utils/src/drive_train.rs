//! Open-loop mecanum drive train on a Tetrix PRIZM + EXPANSION pair.
//!
//! Distances are turned into wheel degrees and handed to the controllers' own
//! degree targets. The conversion is calibrated per car through
//! [`MovementMultipliers`].

use core::f32::consts::{PI, SQRT_2};

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;
use uom::si::{
    f32::Length,
    length::{inch, millimeter},
};

use crate::tetrix::{Motor, MotorController, PrizmController};

/// Direction of travel. Every movement keeps the car's heading except the rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum MoveState {
    Forward,
    Reverse,
    Left,
    Right,
    /// Diagonal forward left.
    DiagFL,
    DiagFR,
    /// Diagonal reverse left.
    DiagRL,
    DiagRR,
    /// Spin in place.
    RotateCW,
    RotateCCW,
    #[default]
    Stop,
}

/// Measured-over-expected correction factors, one per kind of movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementMultipliers {
    pub front_back: f32,
    pub left_right: f32,
    pub diagonal: f32,
    pub spin: f32,
}

impl MovementMultipliers {
    /// Values measured on the course's smart car.
    pub const SMART_CAR: Self = Self {
        front_back: 36.0 / 35.5,
        left_right: 36.0 / 32.75,
        diagonal: 36.0 / 34.0,
        spin: 360.0 / 355.0,
    };

    pub const fn new(front_back: f32, left_right: f32, diagonal: f32, spin: f32) -> Self {
        Self {
            front_back,
            left_right,
            diagonal,
            spin,
        }
    }

    /// Scale a requested distance into the wheel distance that achieves it.
    ///
    /// Diagonal and spinning wheels roll at 45 degrees to the direction of travel.
    pub fn adjust_distance(&self, state: MoveState, distance: Length) -> Length {
        let factor = match state {
            MoveState::Forward | MoveState::Reverse => self.front_back,
            MoveState::Left | MoveState::Right => self.left_right,
            MoveState::DiagFL | MoveState::DiagFR | MoveState::DiagRL | MoveState::DiagRR => {
                self.diagonal * SQRT_2
            }
            MoveState::RotateCW | MoveState::RotateCCW => self.spin * SQRT_2,
            MoveState::Stop => 0.0,
        };
        distance * factor
    }
}

impl Default for MovementMultipliers {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// A drive train that moves by direction and distance.
pub trait DriveTrain {
    type Error;

    /// Fraction of full speed, 0.0 to 1.0.
    fn set_speed_fraction(&mut self, fraction: f32);

    fn speed_fraction(&self) -> f32;

    /// One-time controller setup. Leaves the car stopped.
    fn setup(&mut self) -> Result<(), Self::Error>;

    /// Expected time to cover `distance` in `state` at the current speed.
    fn distance_travel_time(&self, state: MoveState, distance: Length) -> MillisDurationU32;

    fn mm_travel_time(&self, state: MoveState, millimeters: f32) -> MillisDurationU32 {
        self.distance_travel_time(state, Length::new::<millimeter>(millimeters))
    }

    fn inches_travel_time(&self, state: MoveState, inches: f32) -> MillisDurationU32 {
        self.distance_travel_time(state, Length::new::<inch>(inches))
    }

    /// Expected time to turn the wheels by `degrees`; no multiplier applies.
    fn degrees_travel_time(&self, state: MoveState, degrees: f32) -> MillisDurationU32;

    fn spin_cw_travel_time(&self, spin_degrees: f32) -> MillisDurationU32;

    fn spin_ccw_travel_time(&self, spin_degrees: f32) -> MillisDurationU32;

    /// Start moving with no target. `Stop` halts.
    fn drive(&mut self, state: MoveState) -> Result<(), Self::Error> {
        self.move_degrees(state, 0.0)
    }

    /// Turn the wheels by `degrees`, rounded to a whole degree. Zero means no target.
    fn move_degrees(&mut self, state: MoveState, degrees: f32) -> Result<(), Self::Error>;

    fn move_distance(&mut self, state: MoveState, distance: Length) -> Result<(), Self::Error>;

    fn move_mm(&mut self, state: MoveState, millimeters: f32) -> Result<(), Self::Error> {
        self.move_distance(state, Length::new::<millimeter>(millimeters))
    }

    fn move_inches(&mut self, state: MoveState, inches: f32) -> Result<(), Self::Error> {
        self.move_distance(state, Length::new::<inch>(inches))
    }

    /// Spin clockwise by `spin_degrees` of car heading.
    fn spin_cw(&mut self, spin_degrees: f32) -> Result<(), Self::Error>;

    fn spin_ccw(&mut self, spin_degrees: f32) -> Result<(), Self::Error>;

    fn stop(&mut self) -> Result<(), Self::Error>;

    fn move_state(&self) -> MoveState;

    /// `true` while any wheel of the current movement is short of its target.
    fn is_busy(&mut self) -> Result<bool, Self::Error>;

    /// Poll [`DriveTrain::is_busy`] every `poll` until the movement completes.
    fn wait_until_idle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        poll: MillisDurationU32,
    ) -> Result<(), Self::Error> {
        while self.is_busy()? {
            delay.delay_ms(poll.ticks());
        }
        Ok(())
    }
}

const WHEEL_DIAMETER_MM: f32 = 98.0;
const MAX_SPEED_DPS: f32 = 720.0;
/// Distance between diagonally opposite wheels.
const WHEEL_BASE_DIAGONAL_MM: f32 = 15.0 * 25.4;
const DEFAULT_SPEED_FRACTION: f32 = 0.1;

/// Which wheels a movement drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Wheels {
    All,
    FrontRightRearLeft,
    FrontLeftRearRight,
}

/// Motor inversion per controller side, and the wheels to drive.
#[derive(Clone, Copy, Debug)]
struct Motion {
    prizm_left: bool,
    expansion_left: bool,
    prizm_right: bool,
    expansion_right: bool,
    wheels: Wheels,
}

impl Motion {
    const fn new(invert: [bool; 4], wheels: Wheels) -> Self {
        Self {
            prizm_left: invert[0],
            expansion_left: invert[1],
            prizm_right: invert[2],
            expansion_right: invert[3],
            wheels,
        }
    }

    const fn of(state: MoveState) -> Option<Self> {
        use Wheels::*;

        let motion = match state {
            MoveState::Forward => Self::new([true, true, false, false], All),
            MoveState::Reverse => Self::new([false, false, true, true], All),
            MoveState::Left => Self::new([false, true, false, true], All),
            MoveState::Right => Self::new([true, false, true, false], All),
            MoveState::DiagFL => Self::new([false, true, false, false], FrontRightRearLeft),
            MoveState::DiagFR => Self::new([true, false, false, false], FrontLeftRearRight),
            MoveState::DiagRL => Self::new([false, false, false, true], FrontLeftRearRight),
            MoveState::DiagRR => Self::new([false, false, true, false], FrontRightRearLeft),
            MoveState::RotateCW => Self::new([true, true, true, true], All),
            MoveState::RotateCCW => Self::new([false, false, false, false], All),
            MoveState::Stop => return None,
        };
        Some(motion)
    }
}

/// Tetrix mecanum drive train.
///
/// The PRIZM drives the front wheels and the EXPANSION (id 1) the rear ones; motor 1
/// is the left wheel on both.
pub struct TmDriveTrain<P, E> {
    prizm: P,
    expansion: E,
    multipliers: MovementMultipliers,
    speed_fraction: f32,
    speed_dps: i32,
    move_state: MoveState,
}

impl<P, E> TmDriveTrain<P, E>
where
    P: PrizmController,
    E: MotorController<Error = P::Error>,
{
    const LEFT: Motor = Motor::One;
    const RIGHT: Motor = Motor::Two;

    pub fn new(prizm: P, expansion: E, multipliers: MovementMultipliers) -> Self {
        let mut drive_train = Self {
            prizm,
            expansion,
            multipliers,
            speed_fraction: 0.0,
            speed_dps: 0,
            move_state: MoveState::Stop,
        };
        drive_train.set_speed_fraction(DEFAULT_SPEED_FRACTION);
        drive_train
    }

    pub fn multipliers(&self) -> MovementMultipliers {
        self.multipliers
    }

    /// Wheel speed in degrees per second.
    pub fn speed_dps(&self) -> i32 {
        self.speed_dps
    }

    pub fn prizm(&self) -> &P {
        &self.prizm
    }

    pub fn prizm_mut(&mut self) -> &mut P {
        &mut self.prizm
    }

    pub fn expansion_mut(&mut self) -> &mut E {
        &mut self.expansion
    }

    pub fn release(self) -> (P, E) {
        (self.prizm, self.expansion)
    }

    fn wheel_degrees(distance: Length) -> f32 {
        distance.get::<millimeter>() * (360.0 / (WHEEL_DIAMETER_MM * PI))
    }

    fn spin_distance(spin_degrees: f32) -> Length {
        Length::new::<millimeter>(WHEEL_BASE_DIAGONAL_MM * PI / 360.0 * spin_degrees)
    }

    fn halt(&mut self) -> Result<(), P::Error> {
        self.prizm.set_motor_speeds(0, 0)?;
        self.expansion.set_motor_speeds(0, 0)?;
        self.prizm.reset_encoders()?;
        self.expansion.reset_encoders()?;
        self.move_state = MoveState::Stop;
        Ok(())
    }

    fn start(&mut self, state: MoveState, degrees: i32) -> Result<(), P::Error> {
        let Some(motion) = Motion::of(state) else {
            return self.halt();
        };

        self.prizm.set_motor_invert(Self::LEFT, motion.prizm_left)?;
        self.expansion
            .set_motor_invert(Self::LEFT, motion.expansion_left)?;
        self.prizm.set_motor_invert(Self::RIGHT, motion.prizm_right)?;
        self.expansion
            .set_motor_invert(Self::RIGHT, motion.expansion_right)?;

        match motion.wheels {
            Wheels::All => self.run_all(degrees)?,
            Wheels::FrontRightRearLeft => self.run_pair(Self::RIGHT, Self::LEFT, degrees)?,
            Wheels::FrontLeftRearRight => self.run_pair(Self::LEFT, Self::RIGHT, degrees)?,
        }

        self.move_state = state;
        Ok(())
    }

    fn run_all(&mut self, degrees: i32) -> Result<(), P::Error> {
        let speed = self.speed_dps;
        if degrees == 0 {
            self.prizm.set_motor_speeds(speed, speed)?;
            self.expansion.set_motor_speeds(speed, speed)
        } else {
            self.prizm
                .set_motor_degrees(speed, degrees, speed, degrees)?;
            self.expansion
                .set_motor_degrees(speed, degrees, speed, degrees)
        }
    }

    /// Drive one front and the opposite rear wheel; the other two idle.
    fn run_pair(&mut self, front: Motor, rear: Motor, degrees: i32) -> Result<(), P::Error> {
        let (idle_front, idle_rear) = (other(front), other(rear));

        if self.move_state != MoveState::Stop {
            self.prizm.set_motor_speed(idle_front, 0)?;
            self.expansion.set_motor_speed(idle_rear, 0)?;
            self.prizm.reset_encoder(idle_front)?;
            self.expansion.reset_encoder(idle_rear)?;
        }

        let speed = self.speed_dps;
        if degrees == 0 {
            self.prizm.set_motor_speed(front, speed)?;
            self.expansion.set_motor_speed(rear, speed)
        } else {
            self.prizm.set_motor_degree(front, speed, degrees)?;
            self.expansion.set_motor_degree(rear, speed, degrees)
        }
    }

    fn any_busy(&mut self, front: &[Motor], rear: &[Motor]) -> Result<bool, P::Error> {
        for &motor in front {
            if self.prizm.read_motor_busy(motor)? {
                return Ok(true);
            }
        }
        for &motor in rear {
            if self.expansion.read_motor_busy(motor)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn other(motor: Motor) -> Motor {
    match motor {
        Motor::One => Motor::Two,
        Motor::Two => Motor::One,
    }
}

impl<P, E> DriveTrain for TmDriveTrain<P, E>
where
    P: PrizmController,
    E: MotorController<Error = P::Error>,
{
    type Error = P::Error;

    fn set_speed_fraction(&mut self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.speed_fraction = fraction;
        self.speed_dps = (MAX_SPEED_DPS * fraction + 0.5) as i32;
    }

    fn speed_fraction(&self) -> f32 {
        self.speed_fraction
    }

    fn setup(&mut self) -> Result<(), Self::Error> {
        self.prizm.begin()?;
        self.halt()
    }

    fn distance_travel_time(&self, state: MoveState, distance: Length) -> MillisDurationU32 {
        let distance = self.multipliers.adjust_distance(state, distance);
        self.degrees_travel_time(state, Self::wheel_degrees(distance))
    }

    fn degrees_travel_time(&self, _state: MoveState, degrees: f32) -> MillisDurationU32 {
        let seconds = degrees / self.speed_dps as f32;
        // Saturates to u32::MAX when stopped.
        MillisDurationU32::from_ticks((seconds * 1000.0 + 0.5) as u32)
    }

    fn spin_cw_travel_time(&self, spin_degrees: f32) -> MillisDurationU32 {
        self.distance_travel_time(MoveState::RotateCW, Self::spin_distance(spin_degrees))
    }

    fn spin_ccw_travel_time(&self, spin_degrees: f32) -> MillisDurationU32 {
        self.distance_travel_time(MoveState::RotateCCW, Self::spin_distance(spin_degrees))
    }

    fn move_degrees(&mut self, state: MoveState, degrees: f32) -> Result<(), Self::Error> {
        // Negative targets round to zero, i.e. no target.
        let degrees = i32::try_from((degrees + 0.5) as u32).unwrap_or(i32::MAX);
        self.start(state, degrees)
    }

    fn move_distance(&mut self, state: MoveState, distance: Length) -> Result<(), Self::Error> {
        let distance = self.multipliers.adjust_distance(state, distance);
        self.move_degrees(state, Self::wheel_degrees(distance))
    }

    fn spin_cw(&mut self, spin_degrees: f32) -> Result<(), Self::Error> {
        self.move_distance(MoveState::RotateCW, Self::spin_distance(spin_degrees))
    }

    fn spin_ccw(&mut self, spin_degrees: f32) -> Result<(), Self::Error> {
        self.move_distance(MoveState::RotateCCW, Self::spin_distance(spin_degrees))
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.halt()
    }

    fn move_state(&self) -> MoveState {
        self.move_state
    }

    fn is_busy(&mut self) -> Result<bool, Self::Error> {
        const BOTH: &[Motor] = &[Motor::One, Motor::Two];

        match self.move_state {
            MoveState::Forward
            | MoveState::Reverse
            | MoveState::Left
            | MoveState::Right
            | MoveState::RotateCW
            | MoveState::RotateCCW => self.any_busy(BOTH, BOTH),
            MoveState::DiagFL | MoveState::DiagRR => self.any_busy(&[Self::RIGHT], &[Self::LEFT]),
            MoveState::DiagFR | MoveState::DiagRL => self.any_busy(&[Self::LEFT], &[Self::RIGHT]),
            MoveState::Stop => Ok(false),
        }
    }
}
