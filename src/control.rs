use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::debug;

use crate::field::{self, Field};
use crate::reg::{self, Reg};
use crate::{CalibrationLock, Error, Mpr121, ProximityMode, PHYSICAL_CHANNELS, PROXIMITY_CHANNEL};

impl<I, E> Mpr121<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  /// Apply the same touch/release threshold to all twelve electrodes.
  pub async fn set_thresholds(&mut self, touch: u8, release: u8) -> Result<(), Error<E>> {
    for channel in 0..PHYSICAL_CHANNELS {
      self.write_thresholds(channel, touch, release).await?;
    }
    Ok(())
  }

  /// Set the touch/release threshold of one electrode.
  ///
  /// # Panics
  ///
  /// When `channel` is not a physical electrode (0..=11).
  pub async fn set_channel_thresholds(&mut self, channel: u8, touch: u8, release: u8) -> Result<(), Error<E>> {
    assert!(channel < PHYSICAL_CHANNELS, "channel {} is not an electrode", channel);
    self.write_thresholds(channel, touch, release).await
  }

  /// Read back the `(touch, release)` thresholds of one electrode.
  ///
  /// # Panics
  ///
  /// When `channel` is not a physical electrode (0..=11).
  pub async fn channel_thresholds(&mut self, channel: u8) -> Result<(u8, u8), Error<E>> {
    assert!(channel < PHYSICAL_CHANNELS, "channel {} is not an electrode", channel);
    let touch = self.read_field(field::THRESHOLD.at(reg::touch_threshold(channel))).await?;
    let release = self.read_field(field::THRESHOLD.at(reg::release_threshold(channel))).await?;
    Ok((touch as u8, release as u8))
  }

  /// Set the touch/release threshold of the proximity electrode.
  pub async fn set_proximity_thresholds(&mut self, touch: u8, release: u8) -> Result<(), Error<E>> {
    self.write_thresholds(PROXIMITY_CHANNEL, touch, release).await
  }

  async fn write_thresholds(&mut self, channel: u8, touch: u8, release: u8) -> Result<(), Error<E>> {
    self.write_field(field::THRESHOLD.at(reg::touch_threshold(channel)), touch as i32).await?;
    self.write_field(field::THRESHOLD.at(reg::release_threshold(channel)), release as i32).await
  }

  /// Set the touch and release debounce counts, 0..=7 each.
  ///
  /// # Panics
  ///
  /// When either count exceeds 7.
  pub async fn set_debounce(&mut self, touch: u8, release: u8) -> Result<(), Error<E>> {
    assert!(touch <= 7 && release <= 7, "debounce counts are 3 bit");
    let current = self.read_u8(Reg::Debounce as u8).await? as u16;
    let raw = field::DEBOUNCE_RELEASE.merge(field::DEBOUNCE_TOUCH.merge(current, touch as i32), release as i32);
    self.write_field(Field::u8(Reg::Debounce as u8), raw as i32).await
  }

  /// Combine a prefix of the electrodes into the proximity electrode.
  pub async fn set_proximity_mode(&mut self, mode: ProximityMode) -> Result<(), Error<E>> {
    self.write_field(field::ECR_PROXIMITY, mode as i32).await
  }

  /// Select baseline tracking behaviour.
  pub async fn set_calibration_lock(&mut self, lock: CalibrationLock) -> Result<(), Error<E>> {
    self.write_field(field::ECR_CALIBRATION_LOCK, lock as i32).await
  }

  /// Enable the first `count` electrodes; zero enters Stop Mode for the
  /// electrodes.
  ///
  /// # Panics
  ///
  /// When `count` exceeds 12.
  pub async fn set_touch_pins_enabled(&mut self, count: u8) -> Result<(), Error<E>> {
    assert!(count <= PHYSICAL_CHANNELS, "at most 12 electrodes");
    self.write_field(field::ECR_ELECTRODES, count as i32).await
  }

  /// Turn auto-configuration on or off.
  ///
  /// Enabling writes the configured limits, then ACCR0 with both the
  /// auto-configuration and auto-reconfiguration bits set and FFI/BVA taken
  /// from the configured AFE and calibration lock. Disabling clears only the
  /// auto-configuration bit.
  pub async fn set_autoconfig(&mut self, enabled: bool) -> Result<(), Error<E>> {
    if !enabled {
      return self.write_field(field::AUTOCONFIG_ENABLE, 0).await;
    }

    let config = self.config;
    let limits = config.autoconfig_limits;
    self.write_u8(Reg::UpperLimit as u8, limits.upper).await?;
    self.write_u8(Reg::TargetLevel as u8, limits.target).await?;
    self.write_u8(Reg::LowerLimit as u8, limits.lower).await?;
    self.write_u8(Reg::AutoConfig0 as u8, config.autoconfig_control()).await
  }

  /// Charge-discharge current of one electrode in µA, 0 meaning the
  /// global AFE1 value.
  ///
  /// # Panics
  ///
  /// When `channel` exceeds 12 or `current` exceeds 63.
  pub async fn set_channel_charge_current(&mut self, channel: u8, current: u8) -> Result<(), Error<E>> {
    assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
    assert!(current <= 63, "charge current is 6 bit");
    self.write_field(field::CHARGE_CURRENT.at(reg::charge_current(channel)), current as i32).await
  }

  /// # Panics
  ///
  /// When `channel` exceeds 12.
  pub async fn channel_charge_current(&mut self, channel: u8) -> Result<u8, Error<E>> {
    assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
    Ok(self.read_field(field::CHARGE_CURRENT.at(reg::charge_current(channel))).await? as u8)
  }

  /// Charge-discharge time of one electrode (0.5 µs · 2^(n-1)), 0 meaning
  /// the global AFE2 value.
  ///
  /// # Panics
  ///
  /// When `channel` exceeds 12 or `time` exceeds 7.
  pub async fn set_channel_charge_time(&mut self, channel: u8, time: u8) -> Result<(), Error<E>> {
    assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
    assert!(time <= 7, "charge time is 3 bit");
    self.write_field(charge_time_field(channel), time as i32).await
  }

  /// # Panics
  ///
  /// When `channel` exceeds 12.
  pub async fn channel_charge_time(&mut self, channel: u8) -> Result<u8, Error<E>> {
    assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
    Ok(self.read_field(charge_time_field(channel)).await? as u8)
  }

  /// Global charge-discharge current in µA (AFE1), 1..=63.
  pub async fn set_global_charge_current(&mut self, current: u8) -> Result<(), Error<E>> {
    assert!((1..=63).contains(&current), "global charge current is 1..=63");
    self.write_field(field::AFE1_CHARGE_CURRENT, current as i32).await
  }

  /// Global charge-discharge time (AFE2), 1..=7.
  pub async fn set_global_charge_time(&mut self, time: u8) -> Result<(), Error<E>> {
    assert!((1..=7).contains(&time), "global charge time is 1..=7");
    self.write_field(field::AFE2_CHARGE_TIME, time as i32).await
  }

  /// Stop sensing, remembering the electrode configuration for
  /// [`Mpr121::enter_run_mode`].
  pub async fn enter_stop_mode(&mut self) -> Result<(), Error<E>> {
    let ecr = self.read_u8(Reg::Ecr as u8).await?;
    self.state.record_ecr(ecr);
    debug!("MPR121 {:#04x}: stop mode", self.address);
    self.write_u8(Reg::Ecr as u8, 0).await
  }

  /// Resume sensing with the last running ECR value, or the staged
  /// configuration if the chip never ran.
  pub async fn enter_run_mode(&mut self) -> Result<(), Error<E>> {
    let ecr = match self.state.run_ecr {
      0 => self.config.run_mode_ecr(),
      ecr => ecr,
    };
    debug!("MPR121 {:#04x}: run mode, ECR {:#04x}", self.address, ecr);
    self.write_u8(Reg::Ecr as u8, ecr).await
  }

  /// Whether the last ECR value seen had any electrode enabled.
  pub fn is_running(&self) -> bool {
    self.state.ecr & 0x3F != 0
  }

  /// Electrodes enabled per the last ECR value seen.
  pub fn touch_pins_enabled(&self) -> u8 {
    field::ECR_ELECTRODES.decode(self.state.ecr as u16) as u8
  }

  /// Proximity mode per the last ECR value seen.
  pub fn proximity_mode(&self) -> ProximityMode {
    match ProximityMode::try_from(field::ECR_PROXIMITY.decode(self.state.ecr as u16) as u8) {
      Ok(mode) => mode,
      Err(()) => ProximityMode::Disabled,
    }
  }
}

fn charge_time_field(channel: u8) -> Field {
  let field = if channel % 2 == 0 { field::CHARGE_TIME_EVEN } else { field::CHARGE_TIME_ODD };
  field.at(reg::charge_time(channel))
}
