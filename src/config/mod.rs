mod autoconfig;
mod filter;

pub use autoconfig::*;
pub use filter::*;

/// Complete sensing configuration applied by [`crate::Mpr121::initialize`].
///
/// The defaults reproduce a preset that works for typical 10–20 mm
/// electrodes: touch/release thresholds of 40/20, debounce of one sample
/// each way, all twelve electrodes enabled, proximity disabled and baseline
/// tracking seeded from the five high bits of the first reading.
///
/// # Example
/// ```no_run
/// use mpr121::{CalibrationLock, Config, Debounce, ProximityMode};
///
/// let config = Config::default()
///   .with_thresholds(24, 12)
///   .with_debounce(Debounce::new(2, 2))
///   .with_electrodes(8)
///   .with_proximity(ProximityMode::Channels0To3)
///   .with_calibration_lock(CalibrationLock::TrackingLoad10Bits)
///   .with_autoconfig(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  pub touch_threshold: u8,
  pub release_threshold: u8,
  pub proximity_touch_threshold: u8,
  pub proximity_release_threshold: u8,
  pub debounce: Debounce,
  /// Baseline filter for ELE0..ELE11.
  pub electrode_filter: BaselineFilter,
  /// Baseline filter for the proximity electrode.
  pub proximity_filter: BaselineFilter,
  pub afe: Afe,
  /// Number of electrodes enabled from ELE0 upwards.
  pub electrodes: u8,
  pub proximity: ProximityMode,
  pub calibration_lock: CalibrationLock,
  pub autoconfig: bool,
  pub autoconfig_limits: AutoconfigLimits,
}

impl Config {
  pub const fn new() -> Self {
    Self {
      touch_threshold: 40,
      release_threshold: 20,
      proximity_touch_threshold: 40,
      proximity_release_threshold: 20,
      debounce: Debounce::new(1, 1),
      electrode_filter: BaselineFilter::electrodes(),
      proximity_filter: BaselineFilter::proximity(),
      afe: Afe::new(),
      electrodes: crate::PHYSICAL_CHANNELS,
      proximity: ProximityMode::Disabled,
      calibration_lock: CalibrationLock::TrackingLoad5Bits,
      autoconfig: false,
      autoconfig_limits: AutoconfigLimits::for_supply_millivolts(3300),
    }
  }

  pub const fn with_thresholds(mut self, touch: u8, release: u8) -> Self {
    self.touch_threshold = touch;
    self.release_threshold = release;
    self
  }

  pub const fn with_proximity_thresholds(mut self, touch: u8, release: u8) -> Self {
    self.proximity_touch_threshold = touch;
    self.proximity_release_threshold = release;
    self
  }

  pub const fn with_debounce(mut self, debounce: Debounce) -> Self {
    self.debounce = debounce;
    self
  }

  pub const fn with_electrode_filter(mut self, filter: BaselineFilter) -> Self {
    self.electrode_filter = filter;
    self
  }

  pub const fn with_proximity_filter(mut self, filter: BaselineFilter) -> Self {
    self.proximity_filter = filter;
    self
  }

  pub const fn with_afe(mut self, afe: Afe) -> Self {
    self.afe = afe;
    self
  }

  /// # Panics
  ///
  /// When `count` exceeds 12.
  pub const fn with_electrodes(mut self, count: u8) -> Self {
    assert!(count <= crate::PHYSICAL_CHANNELS, "at most 12 electrodes");
    self.electrodes = count;
    self
  }

  pub const fn with_proximity(mut self, mode: ProximityMode) -> Self {
    self.proximity = mode;
    self
  }

  pub const fn with_calibration_lock(mut self, lock: CalibrationLock) -> Self {
    self.calibration_lock = lock;
    self
  }

  pub const fn with_autoconfig(mut self, enabled: bool) -> Self {
    self.autoconfig = enabled;
    self
  }

  pub const fn with_autoconfig_limits(mut self, limits: AutoconfigLimits) -> Self {
    self.autoconfig_limits = limits;
    self
  }

  /// Auto-configuration control 0 (ACCR0) with ACE and ARE set.
  ///
  /// FFI must match AFE1 and BVA must match the ECR calibration lock.
  pub const fn autoconfig_control(&self) -> u8 {
    self.afe.first_filter_iterations << 6 | (self.calibration_lock as u8) << 2 | 0b11
  }

  /// ECR value that puts the chip into Run Mode with this configuration.
  pub const fn run_mode_ecr(&self) -> u8 {
    (self.calibration_lock as u8) << 6 | (self.proximity as u8) << 4 | self.electrodes
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}

/// Number of consecutive samples that must agree before a touch or release
/// is latched, 0..=7 each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debounce {
  pub touch: u8,
  pub release: u8,
}

impl Debounce {
  /// # Panics
  ///
  /// When either count exceeds 7.
  pub const fn new(touch: u8, release: u8) -> Self {
    assert!(touch <= 7 && release <= 7, "debounce counts are 3 bit");
    Self { touch, release }
  }
}

impl Default for Debounce {
  fn default() -> Self {
    Self::new(1, 1)
  }
}

/// Which electrodes are combined into the proximity electrode (ECR ELEPROX_EN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProximityMode {
  Disabled = 0b00,
  Channels0To1 = 0b01,
  Channels0To3 = 0b10,
  Channels0To11 = 0b11,
}

impl From<ProximityMode> for u8 {
  fn from(v: ProximityMode) -> Self {
    v as u8
  }
}

impl TryFrom<u8> for ProximityMode {
  type Error = ();

  fn try_from(bits: u8) -> Result<Self, Self::Error> {
    match bits {
      0b00 => Ok(Self::Disabled),
      0b01 => Ok(Self::Channels0To1),
      0b10 => Ok(Self::Channels0To3),
      0b11 => Ok(Self::Channels0To11),
      _ => Err(()),
    }
  }
}

/// Baseline tracking behaviour entering Run Mode (ECR CL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationLock {
  /// Tracking enabled, baseline starts from the current baseline register.
  Tracking = 0b00,
  /// Tracking disabled.
  Locked = 0b01,
  /// Tracking enabled, the five high bits of the first reading seed the baseline.
  TrackingLoad5Bits = 0b10,
  /// Tracking enabled, the full first reading seeds the baseline.
  TrackingLoad10Bits = 0b11,
}

impl From<CalibrationLock> for u8 {
  fn from(v: CalibrationLock) -> Self {
    v as u8
  }
}

impl TryFrom<u8> for CalibrationLock {
  type Error = ();

  fn try_from(bits: u8) -> Result<Self, Self::Error> {
    match bits {
      0b00 => Ok(Self::Tracking),
      0b01 => Ok(Self::Locked),
      0b10 => Ok(Self::TrackingLoad5Bits),
      0b11 => Ok(Self::TrackingLoad10Bits),
      _ => Err(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_run_mode_ecr() {
    assert_eq!(Config::default().run_mode_ecr(), 0x8C);
  }

  #[test]
  fn run_mode_ecr_packs_fields() {
    let config = Config::default()
      .with_electrodes(4)
      .with_proximity(ProximityMode::Channels0To3)
      .with_calibration_lock(CalibrationLock::Locked);
    assert_eq!(config.run_mode_ecr(), 0x64);
  }

  #[test]
  fn autoconfig_control_mirrors_afe_and_calibration_lock() {
    assert_eq!(Config::default().autoconfig_control(), 0xCB);
    let config = Config::default()
      .with_afe(Afe { first_filter_iterations: 1, ..Afe::new() })
      .with_calibration_lock(CalibrationLock::TrackingLoad10Bits);
    assert_eq!(config.autoconfig_control(), 0x4F);
  }

  #[test]
  fn enum_round_trips() {
    for bits in 0..4u8 {
      assert_eq!(u8::from(ProximityMode::try_from(bits).unwrap()), bits);
      assert_eq!(u8::from(CalibrationLock::try_from(bits).unwrap()), bits);
    }
    assert!(ProximityMode::try_from(4).is_err());
    assert!(CalibrationLock::try_from(4).is_err());
  }

  #[test]
  #[should_panic]
  fn too_many_electrodes() {
    let _ = Config::default().with_electrodes(13);
  }

  #[test]
  #[should_panic]
  fn debounce_out_of_range() {
    let _ = Debounce::new(8, 0);
  }
}
