//! LM35 precision temperature sensor
//!
//! Linear output of 10 mV per degree Celsius, read single-ended against the
//! ADC reference.

use gauge_core::traits::{SensorError, TemperatureSensor};

use crate::adc::{AdcReader, ADC_MAX, ADC_STEPS};

/// Sensor output per degree Celsius
const MV_PER_DEGREE: f32 = 10.0;

pub struct Lm35Sensor<ADC> {
    adc: ADC,
    /// ADC reference voltage in mV
    vref_mv: u16,
}

impl<ADC> Lm35Sensor<ADC> {
    /// Create a new LM35 sensor
    ///
    /// # Arguments
    /// - `adc`: ADC channel the sensor output is wired to
    /// - `vref_mv`: Reference voltage in millivolts (5000 on the reference board)
    pub fn new(adc: ADC, vref_mv: u16) -> Self {
        Self { adc, vref_mv }
    }

    /// Convert a conversion result to degrees Celsius
    pub fn adc_to_celsius(&self, adc_value: u16) -> Result<f32, SensorError> {
        if adc_value > ADC_MAX {
            return Err(SensorError::OutOfRange);
        }
        let millivolts = adc_value as f32 * self.vref_mv as f32 / ADC_STEPS as f32;
        Ok(millivolts / MV_PER_DEGREE)
    }
}

impl<ADC: AdcReader> TemperatureSensor for Lm35Sensor<ADC> {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let adc_value = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        self.adc_to_celsius(adc_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::{DummyAdc, FailingAdc};

    #[test]
    fn test_adc_to_celsius() {
        let sensor = Lm35Sensor::new(DummyAdc(0), 5000);
        assert_eq!(sensor.adc_to_celsius(0), Ok(0.0));

        // 512 counts at 5 V = 2500 mV = 250 °C
        assert_eq!(sensor.adc_to_celsius(512), Ok(250.0));

        // ~25 °C: 250 mV is 51.2 counts
        let t = sensor.adc_to_celsius(51).unwrap();
        assert!((t - 25.0).abs() < 0.5);
    }

    #[test]
    fn test_read() {
        let mut sensor = Lm35Sensor::new(DummyAdc(1024), 5000);
        assert_eq!(sensor.read_celsius(), Err(SensorError::OutOfRange));

        let mut sensor = Lm35Sensor::new(FailingAdc, 5000);
        assert_eq!(sensor.read_celsius(), Err(SensorError::ConversionError));
    }
}
