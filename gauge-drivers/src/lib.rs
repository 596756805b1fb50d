//! Sensor and actuator adapters
//!
//! Concrete implementations of the sensor traits defined in gauge-core,
//! converting raw 10-bit ADC counts into the values the nodes serve:
//!
//! - Motor speed potentiometer and PWM motor output
//! - Analog single-axis accelerometer
//! - LM35 temperature sensor

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod motor;
pub mod sensor;

pub use adc::{AdcReader, ADC_MAX, ADC_STEPS};
