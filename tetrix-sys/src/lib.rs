//! Raw bindings to the Tetrix PRIZM library, the Arduino core clock and a small
//! bridge to the Arduino `Wire` object.
//!
//! Bindings are generated for AVR targets only; elsewhere this crate is empty.

#![no_std]
#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::all)]

#[cfg(target_arch = "avr")]
include!(concat!(env!("OUT_DIR"), "/tetrix.rs"));
