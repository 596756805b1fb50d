//! Analog single-axis accelerometer
//!
//! Output swings linearly over the full ADC range: 0 counts is -1 g, full
//! scale is +1 g.

use gauge_core::traits::{AccelerationSensor, SensorError};

use crate::adc::{AdcReader, ADC_MAX};

pub struct AnalogAccelerometer<ADC> {
    adc: ADC,
}

impl<ADC> AnalogAccelerometer<ADC> {
    pub fn new(adc: ADC) -> Self {
        Self { adc }
    }

    /// `g = adc * 2 / 1023 - 1`
    pub fn adc_to_g(adc_value: u16) -> Result<f32, SensorError> {
        if adc_value > ADC_MAX {
            return Err(SensorError::OutOfRange);
        }
        Ok(adc_value as f32 * 2.0 / ADC_MAX as f32 - 1.0)
    }
}

impl<ADC: AdcReader> AccelerationSensor for AnalogAccelerometer<ADC> {
    fn read_g(&mut self) -> Result<f32, SensorError> {
        let adc_value = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        Self::adc_to_g(adc_value)
    }
}
