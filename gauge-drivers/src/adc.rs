//! ADC access shared by the analog sensors

/// Largest 10-bit conversion result
pub const ADC_MAX: u16 = 1023;

/// Number of 10-bit conversion steps
pub const ADC_STEPS: u32 = 1024;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (10-bit, 0-1023)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Dummy ADC for testing (returns a fixed value)
#[cfg(test)]
pub struct DummyAdc(pub u16);

#[cfg(test)]
impl AdcReader for DummyAdc {
    fn read(&mut self) -> Result<u16, ()> {
        Ok(self.0)
    }
}

/// ADC whose conversions always fail
#[cfg(test)]
pub struct FailingAdc;

#[cfg(test)]
impl AdcReader for FailingAdc {
    fn read(&mut self) -> Result<u16, ()> {
        Err(())
    }
}
