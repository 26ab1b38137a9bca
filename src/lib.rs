#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Async, `no_std` driver for the NXP MPR121 capacitive touch and proximity
//! controller.
//!
//! The MPR121 senses twelve electrodes plus a virtual proximity electrode
//! built from a prefix of the physical ones. This crate exposes a typed API
//! on top of the raw register map, with helpers for:
//!
//! - Bringing the chip up with an empirically tuned baseline filter preset
//! - Adjusting thresholds, debounce, proximity combination, calibration lock,
//!   auto-configuration and charge parameters at runtime, honouring the
//!   chip's Stop Mode write protection
//! - Reading touch status, filtered data, baselines and fault flags
//! - Dispatching per-channel press/release callbacks from an IRQ-driven or
//!   polled loop (see [`Dispatcher`])
//! - Using `embedded-hal` / `embedded-hal-async` 1.0 traits so the driver works
//!   across MCU families
//!
//! ```no_run
//! use embedded_hal_async::{delay::DelayNs, i2c::{I2c, SevenBitAddress}};
//! use mpr121::{Config, Mpr121};
//!
//! async fn example<I2C, D, E>(i2c: I2C, mut delay: D) -> Result<(), mpr121::Error<E>>
//! where
//!   I2C: I2c<SevenBitAddress, Error = E>,
//!   D: DelayNs,
//! {
//!   let config = Config::default().with_thresholds(24, 12);
//!   let mut sensor = Mpr121::new(i2c, config);
//!   sensor.initialize(&mut delay).await?;
//!   let touched = sensor.touch_mask().await?;
//!   Ok(())
//! }
//! ```
extern crate alloc;

mod config;
mod control;
mod dispatch;
mod field;
mod init;
mod reg;
mod rw;
mod status;
#[cfg(test)]
mod testing;

use embedded_hal::digital::ErrorKind;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

pub use config::*;
pub use dispatch::*;
pub use field::{ByteOrder, Field, Width};
pub use reg::{CHANNELS, PHYSICAL_CHANNELS, PROXIMITY_CHANNEL};
pub use status::*;

/// Errors that can occur while interacting with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I²C bus transaction failed with the underlying driver error.
  I2c(E),
  /// Waiting on the IRQ line failed.
  Pin(ErrorKind),
  /// After a soft reset AFE2 did not hold its power-on value, so the device
  /// on the bus is not an MPR121 or did not reset.
  UnexpectedConfig(u8),
}

/// Driver-side view of the electrode configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct DeviceState {
  /// Last ECR value read from or written to the chip.
  pub ecr: u8,
  /// Last ECR value that had sensing enabled, restored by
  /// [`Mpr121::enter_run_mode`].
  pub run_ecr: u8,
}

impl DeviceState {
  pub(crate) fn record_ecr(&mut self, ecr: u8) {
    self.ecr = ecr;
    if ecr & 0x3F != 0 {
      self.run_ecr = ecr;
    }
  }
}

/// Driver for a single MPR121.
///
/// The driver owns the I²C peripheral. Create an instance with
/// [`Mpr121::new`], then call [`Mpr121::initialize`] to reset the chip and
/// apply the [`Config`]. Several sensors on one bus are driven by one
/// instance each, sharing the bus through `embedded-hal-bus` or similar.
pub struct Mpr121<I> {
  i2c: I,
  address: u8,
  config: Config,
  state: DeviceState,
}

impl<I, E> Mpr121<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  /// Create a driver for a chip at the default address (0x5A, ADDR tied to
  /// VSS).
  ///
  /// Nothing is sent to the device until [`Mpr121::initialize`] or a setter
  /// is called.
  pub fn new(i2c: I, config: Config) -> Self {
    Self::with_address(i2c, reg::DEFAULT_ADDRESS, config)
  }

  /// Create a driver for a chip at `address`.
  ///
  /// # Panics
  ///
  /// When `address` is outside 0x58..=0x5D.
  pub fn with_address(i2c: I, address: u8, config: Config) -> Self {
    assert!(reg::ADDRESS_RANGE.contains(&address), "MPR121 address {:#04x} out of range", address);
    Self { i2c, address, config, state: DeviceState::default() }
  }

  pub fn address(&self) -> u8 {
    self.address
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Release the underlying bus.
  pub fn release(self) -> I {
    self.i2c
  }
}

#[cfg(test)]
#[ctor::ctor]
fn init_log() {
  let _ = env_logger::builder().filter_level(log::LevelFilter::Debug).is_test(true).try_init();
}
