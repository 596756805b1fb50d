//! Latest sensor readings of a node
//!
//! Written by the foreground sampling loop, read by the TWI interrupt when
//! a device read is answered. Lock-free so the interrupt never waits; each
//! value is a single atomic word, so a reader sees either the old or the new
//! value, never a mix.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use gauge_twi::DeviceSource;

use crate::traits::{AccelerationSensor, MotorSpeedInput, SensorError, TemperatureSensor};

/// Readings shared between the sampling loop and the interrupt handler
///
/// Can live in a `static`.
pub struct SharedReadings {
    duty_cycle: AtomicU8,
    /// `f32` bit pattern
    acceleration: AtomicU32,
    /// `f32` bit pattern
    temperature: AtomicU32,
}

impl Default for SharedReadings {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedReadings {
    /// All readings zero
    pub const fn new() -> Self {
        Self {
            duty_cycle: AtomicU8::new(0),
            acceleration: AtomicU32::new(0),
            temperature: AtomicU32::new(0),
        }
    }

    pub fn set_motor_duty_cycle(&self, percent: u8) {
        self.duty_cycle.store(percent.min(100), Ordering::Relaxed);
    }

    pub fn set_accelerometer_g(&self, g: f32) {
        self.acceleration.store(g.to_bits(), Ordering::Relaxed);
    }

    pub fn set_temperature_c(&self, celsius: f32) {
        self.temperature.store(celsius.to_bits(), Ordering::Relaxed);
    }

    /// Sample every sensor once and publish the results
    ///
    /// A sensor that fails keeps its previous reading; the other sensors
    /// are still sampled. Returns the first error seen.
    pub fn sample<M, A, T>(
        &self,
        motor: &mut M,
        accelerometer: &mut A,
        thermometer: &mut T,
    ) -> Result<(), SensorError>
    where
        M: MotorSpeedInput,
        A: AccelerationSensor,
        T: TemperatureSensor,
    {
        let mut first_error = None;

        match motor.read_duty_cycle() {
            Ok(percent) => self.set_motor_duty_cycle(percent),
            Err(e) => {
                warn!("motor input: {:?}", e);
                first_error.get_or_insert(e);
            }
        }
        match accelerometer.read_g() {
            Ok(g) => self.set_accelerometer_g(g),
            Err(e) => {
                warn!("accelerometer: {:?}", e);
                first_error.get_or_insert(e);
            }
        }
        match thermometer.read_celsius() {
            Ok(celsius) => self.set_temperature_c(celsius),
            Err(e) => {
                warn!("temperature sensor: {:?}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl DeviceSource for SharedReadings {
    fn motor_duty_cycle(&self) -> u8 {
        self.duty_cycle.load(Ordering::Relaxed)
    }

    fn accelerometer_g(&self) -> f32 {
        f32::from_bits(self.acceleration.load(Ordering::Relaxed))
    }

    fn temperature_c(&self) -> f32 {
        f32::from_bits(self.temperature.load(Ordering::Relaxed))
    }
}
