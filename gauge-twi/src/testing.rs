//! In-memory TWI register bank
//!
//! Plays the hardware side of a bus from a script. Every control write that
//! clears the interrupt flag consumes the next scripted step: the status
//! register takes the step's code, a received byte (if any) lands in the
//! data register and the flag is raised again. STOP completes immediately
//! and consumes nothing. With the script exhausted the flag stays clear,
//! which looks like a hung bus to the engine.

use gauge_hal::twi::{control, TwiRegisters};
use heapless::{Deque, Vec};

use crate::status::BusEvent;

const SCRIPT_DEPTH: usize = 32;
const LOG_DEPTH: usize = 64;

/// Status reported before any operation ("no relevant state")
const IDLE_STATUS: u8 = 0xF8;

#[derive(Debug, Clone, Copy)]
struct Step {
    status: u8,
    data: Option<u8>,
}

/// Scripted register bank
#[derive(Debug)]
pub struct SimulatedTwi {
    control: u8,
    status: u8,
    data: u8,
    bit_rate: u8,
    own_address: u8,
    hold_stop: bool,
    script: Deque<Step, SCRIPT_DEPTH>,
    control_writes: Vec<u8, LOG_DEPTH>,
    transmitted: Vec<u8, LOG_DEPTH>,
}

impl Default for SimulatedTwi {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTwi {
    pub fn new() -> Self {
        Self {
            control: 0,
            status: IDLE_STATUS,
            data: 0,
            bit_rate: 0,
            own_address: 0,
            hold_stop: false,
            script: Deque::new(),
            control_writes: Vec::new(),
            transmitted: Vec::new(),
        }
    }

    /// Queue the event reported by the next operation
    pub fn script(&mut self, event: BusEvent) -> &mut Self {
        self.push(event.status_code().raw(), None)
    }

    /// Queue an event that also delivers a received byte
    pub fn script_receive(&mut self, event: BusEvent, data: u8) -> &mut Self {
        self.push(event.status_code().raw(), Some(data))
    }

    /// Queue a raw status register value
    pub fn script_raw(&mut self, status: u8, data: u8) -> &mut Self {
        self.push(status, Some(data))
    }

    /// Queue each event in order
    pub fn script_all(&mut self, events: &[BusEvent]) -> &mut Self {
        for event in events {
            self.script(*event);
        }
        self
    }

    /// Report an event right away, as the hardware does when a remote
    /// master addresses this node
    pub fn raise(&mut self, event: BusEvent, data: Option<u8>) {
        self.status = event.status_code().raw();
        if let Some(byte) = data {
            self.data = byte;
        }
        self.control |= control::TWINT;
    }

    /// Keep the STOP bit set forever
    pub fn hold_stop(&mut self) {
        self.hold_stop = true;
    }

    /// Steps not yet consumed
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    /// Every value written to the control register, oldest first
    pub fn control_writes(&self) -> &[u8] {
        &self.control_writes
    }

    /// Every value written to the data register, oldest first
    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    pub fn start_count(&self) -> usize {
        self.count_writes(control::TWSTA)
    }

    pub fn stop_count(&self) -> usize {
        self.count_writes(control::TWSTO)
    }

    pub fn bit_rate(&self) -> u8 {
        self.bit_rate
    }

    pub fn own_address(&self) -> u8 {
        self.own_address
    }

    fn count_writes(&self, bit: u8) -> usize {
        self.control_writes
            .iter()
            .filter(|value| *value & bit != 0)
            .count()
    }

    fn push(&mut self, status: u8, data: Option<u8>) -> &mut Self {
        if self.script.push_back(Step { status, data }).is_err() {
            panic!("simulated TWI script full");
        }
        self
    }
}

impl TwiRegisters for SimulatedTwi {
    fn control(&self) -> u8 {
        self.control
    }

    fn write_control(&mut self, value: u8) {
        if self.control_writes.push(value).is_err() {
            panic!("simulated TWI control log full");
        }

        // Writing one to the flag clears it
        self.control = value & !control::TWINT;
        if value & control::TWINT == 0 {
            return;
        }

        if value & control::TWSTO != 0 {
            if !self.hold_stop {
                self.control &= !control::TWSTO;
            }
            return;
        }

        if let Some(step) = self.script.pop_front() {
            self.status = step.status;
            if let Some(byte) = step.data {
                self.data = byte;
            }
            self.control |= control::TWINT;
        }
    }

    fn status(&self) -> u8 {
        self.status
    }

    fn write_status(&mut self, value: u8) {
        // Only the prescaler bits are writable
        self.status = (self.status & 0xF8) | (value & 0x03);
    }

    fn data(&self) -> u8 {
        self.data
    }

    fn write_data(&mut self, value: u8) {
        if self.transmitted.push(value).is_err() {
            panic!("simulated TWI data log full");
        }
        self.data = value;
    }

    fn write_bit_rate(&mut self, value: u8) {
        self.bit_rate = value;
    }

    fn write_own_address(&mut self, value: u8) {
        self.own_address = value;
    }
}
