/// Auto-configuration search limits (USL, TL, LSL), expressed in the chip's
/// 8-bit scale of the 10-bit electrode reading.
///
/// AN3889 derives them from the supply voltage: the upper limit keeps the
/// electrode voltage 0.7 V below VDD, the target sits at 90 % and the lower
/// limit at 65 % of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoconfigLimits {
  pub upper: u8,
  pub target: u8,
  pub lower: u8,
}

impl AutoconfigLimits {
  pub const fn new(upper: u8, target: u8, lower: u8) -> Self {
    Self { upper, target, lower }
  }

  /// Recommended limits for a supply of `millivolts`.
  ///
  /// # Panics
  ///
  /// When the supply is outside the chip's 1.71–3.6 V range.
  pub const fn for_supply_millivolts(millivolts: u16) -> Self {
    assert!(millivolts >= 1710 && millivolts <= 3600, "MPR121 supply is 1.71 V to 3.6 V");
    let vdd = millivolts as u32;
    let upper = (vdd - 700) * 256 / vdd;
    let target = upper * 9 / 10;
    let lower = upper * 65 / 100;
    Self::new(upper as u8, target as u8, lower as u8)
  }
}

impl Default for AutoconfigLimits {
  fn default() -> Self {
    Self::for_supply_millivolts(3300)
  }
}
