//! Logical devices and their payload encoding

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest payload carried for any device
pub const MAX_PAYLOAD_LEN: usize = 4;

/// Raw payload bytes as they travel on the bus and the serial link
pub type PayloadBytes = Vec<u8, MAX_PAYLOAD_LEN>;

// Wire format values
const DEVICE_MOTOR: u8 = 0x01;
const DEVICE_ACCELEROMETER: u8 = 0x02;
const DEVICE_TEMPERATURE_SENSOR: u8 = 0x03;

/// Logical device behind a sensor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DeviceId {
    /// DC motor, reports its PWM duty cycle in percent
    Motor = DEVICE_MOTOR,
    /// Single-axis accelerometer, reports g in -1.0..=1.0
    Accelerometer = DEVICE_ACCELEROMETER,
    /// LM35 temperature sensor, reports degrees Celsius
    TemperatureSensor = DEVICE_TEMPERATURE_SENSOR,
}

impl DeviceId {
    /// Every device, in polling order
    pub const ALL: [DeviceId; 3] = [
        DeviceId::Motor,
        DeviceId::Accelerometer,
        DeviceId::TemperatureSensor,
    ];

    /// Parse a device id from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            DEVICE_MOTOR => Some(DeviceId::Motor),
            DEVICE_ACCELEROMETER => Some(DeviceId::Accelerometer),
            DEVICE_TEMPERATURE_SENSOR => Some(DeviceId::TemperatureSensor),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Number of payload bytes this device transfers
    pub fn payload_length(self) -> usize {
        payload_length(self)
    }
}

/// Number of payload bytes a device transfers
///
/// One byte for the motor, four for the float-valued sensors. Master,
/// slave and host decoder all size their transfers from this function.
pub const fn payload_length(device: DeviceId) -> usize {
    match device {
        DeviceId::Motor => 1,
        DeviceId::Accelerometer | DeviceId::TemperatureSensor => MAX_PAYLOAD_LEN,
    }
}

/// Current value of a device
///
/// Floats are reinterpreted bit for bit; comparisons in tests should use
/// [`f32::to_bits`] when exact equality matters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DevicePayload {
    /// Single raw byte (motor duty cycle, 0-100)
    Byte(u8),
    /// IEEE-754 single precision value
    Float(f32),
}

impl DevicePayload {
    /// Encode into wire bytes, least significant byte first
    pub fn to_bytes(&self) -> PayloadBytes {
        let mut bytes = PayloadBytes::new();
        match self {
            DevicePayload::Byte(value) => {
                let _ = bytes.push(*value);
            }
            DevicePayload::Float(value) => {
                let _ = bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }

    /// Decode the payload of `device` from wire bytes
    ///
    /// Returns `None` unless `bytes` is exactly
    /// [`payload_length(device)`](payload_length) long.
    pub fn from_bytes(device: DeviceId, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != payload_length(device) {
            return None;
        }
        match device {
            DeviceId::Motor => Some(DevicePayload::Byte(bytes[0])),
            DeviceId::Accelerometer | DeviceId::TemperatureSensor => {
                let mut raw = [0u8; MAX_PAYLOAD_LEN];
                raw.copy_from_slice(bytes);
                Some(DevicePayload::Float(f32::from_le_bytes(raw)))
            }
        }
    }

    /// Check that this payload has the shape `device` transfers
    pub fn fits(&self, device: DeviceId) -> bool {
        matches!(
            (self, device),
            (DevicePayload::Byte(_), DeviceId::Motor)
                | (
                    DevicePayload::Float(_),
                    DeviceId::Accelerometer | DeviceId::TemperatureSensor
                )
        )
    }

    /// Raw byte value, if this is a byte payload
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            DevicePayload::Byte(value) => Some(*value),
            DevicePayload::Float(_) => None,
        }
    }

    /// Float value, if this is a float payload
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            DevicePayload::Float(value) => Some(*value),
            DevicePayload::Byte(_) => None,
        }
    }
}
