//! Hardware abstraction traits
//!
//! Interface between the application logic and the sensor adapters of a
//! node. Conversions from raw ADC counts live with the implementations.

pub mod sensor;

pub use sensor::{AccelerationSensor, MotorSpeedInput, SensorError, TemperatureSensor};
