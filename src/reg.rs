/******************************************************************************
 * Refer to the MPR121 datasheet and application notes AN3889..AN3894 for    *
 * more information, available here:                                          *
 * - https://www.nxp.com/docs/en/data-sheet/MPR121.pdf                        *
 * ========================================================================== *
 *                        MPR121 - Registers & Memory Map                     *
*******************************************************************************/

pub(crate) const DEFAULT_ADDRESS: u8 = 0x5A;
pub(crate) const ADDRESS_RANGE: core::ops::RangeInclusive<u8> = 0x58..=0x5D;

/// Number of physical electrodes (ELE0..ELE11).
pub const PHYSICAL_CHANNELS: u8 = 12;
/// Index of the virtual proximity electrode (ELEPROX).
pub const PROXIMITY_CHANNEL: u8 = 12;
/// Physical electrodes plus the proximity electrode.
pub const CHANNELS: usize = 13;

#[allow(dead_code)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reg {
  // Touch & out-of-range status (0x00..0x03)
  TouchStatus = 0x00,
  TouchStatusHigh = 0x01,
  OutOfRangeStatus = 0x02,

  // Electrode filtered data, 10 bit LE (0x04..0x1D)
  FilteredData0 = 0x04,

  // Baseline values, upper 8 of 10 bits (0x1E..0x2A)
  Baseline0 = 0x1E,

  // Baseline filtering for ELE0..ELE11 (0x2B..0x35)
  MhdRising = 0x2B,
  NhdRising = 0x2C,
  NclRising = 0x2D,
  FdlRising = 0x2E,
  MhdFalling = 0x2F,
  NhdFalling = 0x30,
  NclFalling = 0x31,
  FdlFalling = 0x32,
  NhdTouched = 0x33,
  NclTouched = 0x34,
  FdlTouched = 0x35,

  // Baseline filtering for ELEPROX (0x36..0x40)
  ProxMhdRising = 0x36,
  ProxNhdRising = 0x37,
  ProxNclRising = 0x38,
  ProxFdlRising = 0x39,
  ProxMhdFalling = 0x3A,
  ProxNhdFalling = 0x3B,
  ProxNclFalling = 0x3C,
  ProxFdlFalling = 0x3D,
  ProxNhdTouched = 0x3E,
  ProxNclTouched = 0x3F,
  ProxFdlTouched = 0x40,

  // Touch / release thresholds, interleaved per electrode (0x41..0x5A)
  TouchThreshold0 = 0x41,
  ReleaseThreshold0 = 0x42,
  ProxTouchThreshold = 0x59,
  ProxReleaseThreshold = 0x5A,

  // Debounce, AFE and electrode configuration (0x5B..0x5E)
  Debounce = 0x5B,
  Afe1 = 0x5C,
  Afe2 = 0x5D,
  Ecr = 0x5E,

  // Per electrode charge current (0x5F..0x6B) and time (0x6C..0x72)
  ChargeCurrent0 = 0x5F,
  ChargeTime0 = 0x6C,

  // GPIO block (0x73..0x7A)
  GpioControl0 = 0x73,
  GpioControl1 = 0x74,
  GpioData = 0x75,
  GpioDirection = 0x76,
  GpioEnable = 0x77,
  GpioSet = 0x78,
  GpioClear = 0x79,
  GpioToggle = 0x7A,

  // Auto-configuration (0x7B..0x7F)
  AutoConfig0 = 0x7B,
  AutoConfig1 = 0x7C,
  UpperLimit = 0x7D,
  LowerLimit = 0x7E,
  TargetLevel = 0x7F,

  SoftReset = 0x80,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

/// Value written to [`Reg::SoftReset`] to reset the chip.
pub(crate) const SOFT_RESET_MAGIC: u8 = 0x63;

/// Power-on value of AFE2 (CDT = 0.5 us, SFI = 4 samples, ESI = 16 ms).
pub(crate) const AFE2_RESET_VALUE: u8 = 0x24;

/// Written to the high status byte to clear the over-current flag.
pub(crate) const OVERCURRENT_CLEAR: u8 = 0x80;

const GPIO_BLOCK: core::ops::RangeInclusive<u8> = (Reg::GpioControl0 as u8)..=(Reg::GpioToggle as u8);

/// Writes to these registers are accepted in Run Mode.
#[inline]
pub(crate) fn writable_in_run_mode(register: u8) -> bool {
  register == Reg::Ecr as u8
    || register == Reg::SoftReset as u8
    || GPIO_BLOCK.contains(&register)
}

#[inline]
pub(crate) const fn touch_threshold(channel: u8) -> u8 {
  Reg::TouchThreshold0 as u8 + 2 * channel
}

#[inline]
pub(crate) const fn release_threshold(channel: u8) -> u8 {
  Reg::ReleaseThreshold0 as u8 + 2 * channel
}

#[inline]
pub(crate) const fn filtered_data(channel: u8) -> u8 {
  Reg::FilteredData0 as u8 + 2 * channel
}

#[inline]
pub(crate) const fn baseline(channel: u8) -> u8 {
  Reg::Baseline0 as u8 + channel
}

#[inline]
pub(crate) const fn charge_current(channel: u8) -> u8 {
  Reg::ChargeCurrent0 as u8 + channel
}

/// Two electrodes share one charge time register, even channel in the low nibble.
#[inline]
pub(crate) const fn charge_time(channel: u8) -> u8 {
  Reg::ChargeTime0 as u8 + channel / 2
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn per_channel_addresses() {
    assert_eq!(touch_threshold(0), 0x41);
    assert_eq!(release_threshold(0), 0x42);
    assert_eq!(touch_threshold(11), 0x57);
    assert_eq!(release_threshold(11), 0x58);
    assert_eq!(touch_threshold(PROXIMITY_CHANNEL), Reg::ProxTouchThreshold as u8);
    assert_eq!(filtered_data(PROXIMITY_CHANNEL), 0x1C);
    assert_eq!(baseline(PROXIMITY_CHANNEL), 0x2A);
    assert_eq!(charge_current(PROXIMITY_CHANNEL), 0x6B);
    assert_eq!(charge_time(0), 0x6C);
    assert_eq!(charge_time(1), 0x6C);
    assert_eq!(charge_time(PROXIMITY_CHANNEL), 0x72);
  }

  #[test]
  fn run_mode_writable_set() {
    assert!(writable_in_run_mode(0x5E));
    assert!(writable_in_run_mode(0x73));
    assert!(writable_in_run_mode(0x7A));
    assert!(writable_in_run_mode(0x80));
    assert!(!writable_in_run_mode(0x72));
    assert!(!writable_in_run_mode(0x7B));
    assert!(!writable_in_run_mode(0x41));
    assert!(!writable_in_run_mode(0x01));
  }
}
