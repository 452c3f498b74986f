#![cfg_attr(not(test), no_std)]

//! Device wrappers for the CSCI smart car.
//!
//! Everything here is written against `embedded-hal` 1.0 traits, plus two small
//! controller traits ([`tetrix::MotorController`] and [`tetrix::PrizmController`])
//! standing in for the Tetrix PRIZM/EXPANSION vendor library. The firmware crate
//! plugs in the real board; tests plug in mocks.

pub mod analog;
pub mod color;
pub mod color_sensor;
pub mod digital;
pub mod display;
pub mod drive_train;
pub mod gpio;
pub mod led;
pub mod smart_car;
pub mod sound;
pub mod switch;
pub mod tcs34725;
pub mod tetrix;

pub use uom;
