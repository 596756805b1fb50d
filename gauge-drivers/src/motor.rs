//! DC motor speed control
//!
//! A potentiometer sets the motor speed; the node reads it, drives the
//! motor PWM with the same duty cycle and serves that duty cycle on the bus.
//!
//! ```ignore
//! let mut motor = MotorChannel::new(SpeedPotentiometer::new(adc), pwm);
//!
//! // In the sampling loop:
//! let duty = motor.update()?;
//! readings.set_motor_duty_cycle(duty);
//! ```

use embedded_hal::pwm::SetDutyCycle;
use gauge_core::traits::{MotorSpeedInput, SensorError};

use crate::adc::{AdcReader, ADC_MAX, ADC_STEPS};

/// Errors that can occur while updating the motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Speed set point could not be read
    Sensor(SensorError),
    /// PWM output rejected the duty cycle
    Pwm,
}

impl From<SensorError> for MotorError {
    fn from(err: SensorError) -> Self {
        MotorError::Sensor(err)
    }
}

/// Speed set point potentiometer
pub struct SpeedPotentiometer<ADC> {
    adc: ADC,
}

impl<ADC> SpeedPotentiometer<ADC> {
    pub fn new(adc: ADC) -> Self {
        Self { adc }
    }

    /// `round(adc * 100 / 1024)`, clamped to 0-100
    pub fn adc_to_duty(adc_value: u16) -> Result<u8, SensorError> {
        if adc_value > ADC_MAX {
            return Err(SensorError::OutOfRange);
        }
        let duty = (adc_value as u32 * 100 + ADC_STEPS / 2) / ADC_STEPS;
        Ok(duty.min(100) as u8)
    }
}

impl<ADC: AdcReader> MotorSpeedInput for SpeedPotentiometer<ADC> {
    fn read_duty_cycle(&mut self) -> Result<u8, SensorError> {
        let adc_value = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        Self::adc_to_duty(adc_value)
    }
}

/// Potentiometer-controlled PWM motor
pub struct MotorChannel<I, P> {
    input: I,
    pwm: P,
    duty: u8,
}

impl<I, P> MotorChannel<I, P>
where
    I: MotorSpeedInput,
    P: SetDutyCycle,
{
    /// Create a channel; the motor stays off until the first update
    pub fn new(input: I, pwm: P) -> Self {
        Self { input, pwm, duty: 0 }
    }

    /// Read the set point and apply it to the PWM output
    ///
    /// Returns the applied duty cycle. On error the output keeps its
    /// previous duty cycle.
    pub fn update(&mut self) -> Result<u8, MotorError> {
        let duty = self.input.read_duty_cycle()?;
        self.pwm
            .set_duty_cycle_percent(duty)
            .map_err(|_| MotorError::Pwm)?;
        self.duty = duty;
        Ok(duty)
    }

    /// Duty cycle currently applied, in percent
    pub fn duty_cycle(&self) -> u8 {
        self.duty
    }

    /// Stop the motor
    pub fn stop(&mut self) -> Result<(), MotorError> {
        self.pwm.set_duty_cycle_fully_off().map_err(|_| MotorError::Pwm)?;
        self.duty = 0;
        Ok(())
    }
}

/// The channel reports the duty cycle it applies
impl<I, P> MotorSpeedInput for MotorChannel<I, P>
where
    I: MotorSpeedInput,
    P: SetDutyCycle,
{
    fn read_duty_cycle(&mut self) -> Result<u8, SensorError> {
        match self.update() {
            Ok(duty) => Ok(duty),
            Err(MotorError::Sensor(e)) => Err(e),
            Err(MotorError::Pwm) => Err(SensorError::ConversionError),
        }
    }
}
