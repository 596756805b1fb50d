//! Sensor traits

/// Errors that can occur while sampling a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// ADC conversion error
    ConversionError,
    /// Reading outside the range the sensor can produce
    OutOfRange,
}

/// Motor speed set point (potentiometer)
///
/// Takes `&mut self` because ADC reads typically require mutable access.
pub trait MotorSpeedInput {
    /// Requested duty cycle in percent (0-100)
    fn read_duty_cycle(&mut self) -> Result<u8, SensorError>;
}

/// Single-axis accelerometer
pub trait AccelerationSensor {
    /// Acceleration in g, -1.0..=1.0
    fn read_g(&mut self) -> Result<f32, SensorError>;
}

/// Temperature sensor
pub trait TemperatureSensor {
    /// Temperature in degrees Celsius
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}
