use crate::reg::Reg;

/// One stage of the baseline filter (AN3891).
///
/// `max_half_delta` is the largest variation passed through as baseline
/// drift; `noise_half_delta` the step applied once `noise_count_limit`
/// consecutive samples exceeded it; `filter_delay_limit` slows the update rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterStage {
  pub max_half_delta: u8,
  pub noise_half_delta: u8,
  pub noise_count_limit: u8,
  pub filter_delay_limit: u8,
}

impl FilterStage {
  pub const fn new(max_half_delta: u8, noise_half_delta: u8, noise_count_limit: u8, filter_delay_limit: u8) -> Self {
    assert!(max_half_delta <= 0x3F && noise_half_delta <= 0x3F, "half deltas are 6 bit");
    Self { max_half_delta, noise_half_delta, noise_count_limit, filter_delay_limit }
  }
}

/// Baseline filter for the rising, falling and touched cases.
///
/// The touched stage has no max half delta register; its value is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaselineFilter {
  pub rising: FilterStage,
  pub falling: FilterStage,
  pub touched: FilterStage,
}

impl BaselineFilter {
  pub const fn new(rising: FilterStage, falling: FilterStage, touched: FilterStage) -> Self {
    Self { rising, falling, touched }
  }

  /// Preset for ELE0..ELE11.
  pub const fn electrodes() -> Self {
    Self::new(
      FilterStage::new(0x01, 0x01, 0x10, 0x20),
      FilterStage::new(0x01, 0x01, 0x10, 0x20),
      FilterStage::new(0x00, 0x01, 0x10, 0xFF),
    )
  }

  /// Preset for the proximity electrode, slower to follow a hand.
  pub const fn proximity() -> Self {
    Self::new(
      FilterStage::new(0x0F, 0x0F, 0x00, 0x00),
      FilterStage::new(0x01, 0x01, 0xFF, 0xFF),
      FilterStage::new(0x00, 0x00, 0x00, 0x00),
    )
  }

  /// Register/value pairs starting at `base` (MHDR for electrodes,
  /// MHDPROXR for the proximity electrode).
  pub(crate) const fn registers(&self, base: Reg) -> [(u8, u8); 11] {
    let b = base as u8;
    [
      (b, self.rising.max_half_delta),
      (b + 1, self.rising.noise_half_delta),
      (b + 2, self.rising.noise_count_limit),
      (b + 3, self.rising.filter_delay_limit),
      (b + 4, self.falling.max_half_delta),
      (b + 5, self.falling.noise_half_delta),
      (b + 6, self.falling.noise_count_limit),
      (b + 7, self.falling.filter_delay_limit),
      (b + 8, self.touched.noise_half_delta),
      (b + 9, self.touched.noise_count_limit),
      (b + 10, self.touched.filter_delay_limit),
    ]
  }
}

impl Default for BaselineFilter {
  fn default() -> Self {
    Self::electrodes()
  }
}

/// Analog front end settings (AFE1/AFE2) shared by all electrodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Afe {
  /// First filter iterations, 0..=3 (6, 10, 18 or 34 samples).
  pub first_filter_iterations: u8,
  /// Global charge-discharge current in µA, 1..=63.
  pub charge_current: u8,
  /// Global charge-discharge time, 1..=7 (0.5 µs · 2^(n-1)).
  pub charge_time: u8,
  /// Second filter iterations, 0..=3 (4, 6, 10 or 18 samples).
  pub second_filter_iterations: u8,
  /// Electrode sample interval, 0..=7 (1 ms · 2^n).
  pub sample_interval: u8,
}

impl Afe {
  pub const fn new() -> Self {
    Self { first_filter_iterations: 3, charge_current: 63, charge_time: 1, second_filter_iterations: 2, sample_interval: 0 }
  }

  pub const fn afe1(&self) -> u8 {
    assert!(self.first_filter_iterations <= 3 && self.charge_current <= 63, "AFE1 field out of range");
    self.first_filter_iterations << 6 | self.charge_current
  }

  pub const fn afe2(&self) -> u8 {
    assert!(
      self.charge_time <= 7 && self.second_filter_iterations <= 3 && self.sample_interval <= 7,
      "AFE2 field out of range"
    );
    self.charge_time << 5 | self.second_filter_iterations << 3 | self.sample_interval
  }
}

impl Default for Afe {
  fn default() -> Self {
    Self::new()
  }
}
