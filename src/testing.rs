//! Test doubles: a register-file MPR121, an IRQ line and a yielding delay.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::ErrorType as PinErrorType;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};

use crate::reg::{self, Reg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Read(u8),
  Write(u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl embedded_hal::i2c::Error for FakeError {
  fn kind(&self) -> ErrorKind {
    ErrorKind::Other
  }
}

struct Chip {
  regs: [u8; 256],
  log: Vec<Access>,
  fail_all: bool,
  fail_writes_to: Option<u8>,
}

impl Chip {
  fn power_on(&mut self) {
    self.regs = [0; 256];
    self.regs[Reg::Afe1 as usize] = 0x10;
    self.regs[Reg::Afe2 as usize] = reg::AFE2_RESET_VALUE;
  }

  fn running(&self) -> bool {
    self.regs[Reg::Ecr as usize] & 0x3F != 0
  }

  fn write(&mut self, register: u8, value: u8) {
    self.log.push(Access::Write(register, value));
    if register == Reg::SoftReset as u8 {
      if value == reg::SOFT_RESET_MAGIC {
        self.power_on();
      }
      return;
    }
    // The chip ignores configuration writes while sensing.
    if self.running() && !reg::writable_in_run_mode(register) {
      return;
    }
    if register == Reg::TouchStatus as u8 || register == Reg::TouchStatusHigh as u8 {
      if register == Reg::TouchStatusHigh as u8 && value & reg::OVERCURRENT_CLEAR != 0 {
        self.regs[register as usize] &= !reg::OVERCURRENT_CLEAR;
      }
      return;
    }
    self.regs[register as usize] = value;
  }
}

/// Register-file model of an MPR121 that rejects writes outside Stop Mode
/// the way the chip does.
#[derive(Clone)]
pub struct FakeBus {
  chip: Rc<RefCell<Chip>>,
}

impl FakeBus {
  pub fn new() -> Self {
    let mut chip = Chip { regs: [0; 256], log: Vec::new(), fail_all: false, fail_writes_to: None };
    chip.power_on();
    Self { chip: Rc::new(RefCell::new(chip)) }
  }

  /// Set a register behind the driver's back, bypassing Stop Mode checks.
  pub fn set(&self, register: u8, value: u8) {
    self.chip.borrow_mut().regs[register as usize] = value;
  }

  pub fn get(&self, register: u8) -> u8 {
    self.chip.borrow().regs[register as usize]
  }

  pub fn set_touch(&self, mask: u16) {
    let [low, high] = mask.to_le_bytes();
    self.set(Reg::TouchStatus as u8, low);
    self.set(Reg::TouchStatusHigh as u8, high);
  }

  pub fn log(&self) -> Vec<Access> {
    self.chip.borrow().log.clone()
  }

  pub fn writes(&self) -> Vec<(u8, u8)> {
    self
      .chip
      .borrow()
      .log
      .iter()
      .filter_map(|access| match *access {
        Access::Write(register, value) => Some((register, value)),
        Access::Read(_) => None,
      })
      .collect()
  }

  pub fn clear_log(&self) {
    self.chip.borrow_mut().log.clear();
  }

  pub fn fail_all(&self) {
    self.chip.borrow_mut().fail_all = true;
  }

  pub fn fail_writes_to(&self, register: u8) {
    self.chip.borrow_mut().fail_writes_to = Some(register);
  }
}

impl ErrorType for FakeBus {
  type Error = FakeError;
}

impl I2c<SevenBitAddress> for FakeBus {
  async fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    let mut chip = self.chip.borrow_mut();
    if chip.fail_all {
      return Err(FakeError);
    }

    let mut pointer = 0u8;
    for operation in operations.iter_mut() {
      match operation {
        Operation::Write(bytes) => {
          let Some((&register, data)) = bytes.split_first() else {
            continue;
          };
          pointer = register;
          if !data.is_empty() && chip.fail_writes_to == Some(register) {
            return Err(FakeError);
          }
          for &value in data {
            chip.write(pointer, value);
            pointer = pointer.wrapping_add(1);
          }
        }
        Operation::Read(buf) => {
          for byte in buf.iter_mut() {
            *byte = chip.regs[pointer as usize];
            chip.log.push(Access::Read(pointer));
            pointer = pointer.wrapping_add(1);
          }
        }
      }
    }
    Ok(())
  }
}

/// Delay that yields once instead of sleeping and counts its calls.
#[derive(Clone, Default)]
pub struct YieldDelay {
  calls: Rc<Cell<usize>>,
}

impl YieldDelay {
  pub fn calls(&self) -> usize {
    self.calls.get()
  }
}

impl DelayNs for YieldDelay {
  async fn delay_ns(&mut self, _ns: u32) {
    self.calls.set(self.calls.get() + 1);
    embassy_futures::yield_now().await;
  }
}

/// Active-low IRQ line controlled by the test.
#[derive(Clone)]
pub struct FakeIrq {
  low: Rc<Cell<bool>>,
}

impl FakeIrq {
  pub fn new() -> Self {
    Self { low: Rc::new(Cell::new(false)) }
  }

  pub fn assert(&self) {
    self.low.set(true);
  }

  pub fn release(&self) {
    self.low.set(false);
  }
}

impl PinErrorType for FakeIrq {
  type Error = core::convert::Infallible;
}

impl Wait for FakeIrq {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    while self.low.get() {
      embassy_futures::yield_now().await;
    }
    Ok(())
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    while !self.low.get() {
      embassy_futures::yield_now().await;
    }
    Ok(())
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    self.wait_for_low().await?;
    self.wait_for_high().await
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    self.wait_for_high().await?;
    self.wait_for_low().await
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    let start = self.low.get();
    while self.low.get() == start {
      embassy_futures::yield_now().await;
    }
    Ok(())
  }
}
