//! Analog sensors

pub mod accelerometer;
pub mod lm35;

pub use accelerometer::AnalogAccelerometer;
pub use lm35::Lm35Sensor;
