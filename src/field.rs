//! Bit-field descriptors over the MPR121 register space.
//!
//! A [`Field`] names a register, a mask inside it and the offset of the
//! field's least significant bit. The driver reads and writes fields through
//! [`crate::Mpr121::read_field`] and [`crate::Mpr121::write_field`], which take
//! care of read-modify-write for partial fields and of the Stop Mode protocol.

use crate::reg::Reg;

/// Byte order of a 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
  /// Low byte at the lower address. Used by every MPR121 data register.
  Little,
  Big,
}

/// Transfer width of a register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
  U8,
  U16(ByteOrder),
}

impl Width {
  /// Mask covering every bit of the register.
  pub const fn full_mask(self) -> u16 {
    match self {
      Width::U8 => 0x00FF,
      Width::U16(_) => 0xFFFF,
    }
  }

  pub const fn bits(self) -> u8 {
    match self {
      Width::U8 => 8,
      Width::U16(_) => 16,
    }
  }
}

/// A (possibly partial) field inside an 8- or 16-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
  register: u8,
  mask: u16,
  offset: u8,
  width: Width,
  signed: bool,
}

impl Field {
  /// Full 8-bit register.
  pub const fn u8(register: u8) -> Self {
    Self { register, mask: 0x00FF, offset: 0, width: Width::U8, signed: false }
  }

  /// Full 16-bit register pair starting at `register`.
  pub const fn u16(register: u8, order: ByteOrder) -> Self {
    Self { register, mask: 0xFFFF, offset: 0, width: Width::U16(order), signed: false }
  }

  /// Narrow the field to `mask`; the offset becomes the mask's lowest set bit.
  pub const fn masked(mut self, mask: u16) -> Self {
    assert!(mask != 0, "empty field mask");
    assert!(mask & !self.width.full_mask() == 0, "mask exceeds register width");
    self.mask = mask;
    self.offset = mask.trailing_zeros() as u8;
    self
  }

  /// Override the offset derived from the mask.
  pub const fn with_offset(mut self, offset: u8) -> Self {
    assert!(offset < self.width.bits(), "offset exceeds register width");
    self.offset = offset;
    self
  }

  /// Interpret the field as two's complement.
  pub const fn signed(mut self) -> Self {
    self.signed = true;
    self
  }

  /// Same field layout at another address.
  pub const fn at(mut self, register: u8) -> Self {
    self.register = register;
    self
  }

  pub const fn register(&self) -> u8 {
    self.register
  }

  pub const fn mask(&self) -> u16 {
    self.mask
  }

  pub const fn offset(&self) -> u8 {
    self.offset
  }

  pub const fn width(&self) -> Width {
    self.width
  }

  pub const fn is_signed(&self) -> bool {
    self.signed
  }

  /// `true` when a write replaces the whole register and needs no prior read.
  pub const fn is_full_width(&self) -> bool {
    self.offset == 0 && self.mask == self.width.full_mask()
  }

  /// Mask of the field's value once shifted down to bit 0.
  pub const fn span(&self) -> u16 {
    self.mask >> self.offset
  }

  const fn value_bits(&self) -> u32 {
    16 - self.span().leading_zeros()
  }

  /// Whether `value` can be stored in this field.
  pub fn fits(&self, value: i32) -> bool {
    if self.signed {
      let bits = self.value_bits();
      let min = -(1i32 << (bits - 1));
      let max = (1i32 << (bits - 1)) - 1;
      (min..=max).contains(&value)
    } else {
      value & self.span() as i32 == value
    }
  }

  /// Position `value` inside the register.
  ///
  /// # Panics
  ///
  /// When the value does not fit the field.
  pub fn encode(&self, value: i32) -> u16 {
    assert!(
      self.fits(value),
      "value {} out of range for field {:#06x}@{:#04x}",
      value,
      self.mask,
      self.register
    );
    let raw = (value as u16) & self.span();
    (raw << self.offset) & self.mask
  }

  /// Extract the field from a raw register value.
  pub fn decode(&self, raw: u16) -> i32 {
    let value = (raw & self.mask) >> self.offset;
    let bits = self.value_bits();
    if self.signed && value & (1 << (bits - 1)) != 0 {
      value as i32 - (1i32 << bits)
    } else {
      value as i32
    }
  }

  /// Replace the field inside `current`, leaving the other bits untouched.
  pub fn merge(&self, current: u16, value: i32) -> u16 {
    (current & !self.mask) | self.encode(value)
  }
}

pub(crate) const TOUCH_STATUS: Field = Field::u16(Reg::TouchStatus as u8, ByteOrder::Little).masked(0x0FFF);
pub(crate) const TOUCH_STATUS_WITH_PROXIMITY: Field = TOUCH_STATUS.masked(0x1FFF);
pub(crate) const OVERCURRENT: Field = TOUCH_STATUS.masked(0x8000);

pub(crate) const OUT_OF_RANGE: Field = Field::u16(Reg::OutOfRangeStatus as u8, ByteOrder::Little);

pub(crate) const FILTERED_DATA: Field = Field::u16(Reg::FilteredData0 as u8, ByteOrder::Little).masked(0x03FF);
pub(crate) const BASELINE: Field = Field::u8(Reg::Baseline0 as u8);
pub(crate) const THRESHOLD: Field = Field::u8(Reg::TouchThreshold0 as u8);

pub(crate) const DEBOUNCE_TOUCH: Field = Field::u8(Reg::Debounce as u8).masked(0x07);
pub(crate) const DEBOUNCE_RELEASE: Field = Field::u8(Reg::Debounce as u8).masked(0x70);

pub(crate) const AFE1_CHARGE_CURRENT: Field = Field::u8(Reg::Afe1 as u8).masked(0x3F);
pub(crate) const AFE2_CHARGE_TIME: Field = Field::u8(Reg::Afe2 as u8).masked(0xE0);

pub(crate) const ECR_ELECTRODES: Field = Field::u8(Reg::Ecr as u8).masked(0x0F);
pub(crate) const ECR_PROXIMITY: Field = Field::u8(Reg::Ecr as u8).masked(0x30);
pub(crate) const ECR_CALIBRATION_LOCK: Field = Field::u8(Reg::Ecr as u8).masked(0xC0);

pub(crate) const CHARGE_CURRENT: Field = Field::u8(Reg::ChargeCurrent0 as u8).masked(0x3F);
pub(crate) const CHARGE_TIME_EVEN: Field = Field::u8(Reg::ChargeTime0 as u8).masked(0x07);
pub(crate) const CHARGE_TIME_ODD: Field = Field::u8(Reg::ChargeTime0 as u8).masked(0x70);

pub(crate) const AUTOCONFIG_ENABLE: Field = Field::u8(Reg::AutoConfig0 as u8).masked(0x01);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offset_follows_mask() {
    assert_eq!(DEBOUNCE_TOUCH.offset(), 0);
    assert_eq!(DEBOUNCE_RELEASE.offset(), 4);
    assert_eq!(ECR_PROXIMITY.offset(), 4);
    assert_eq!(ECR_CALIBRATION_LOCK.offset(), 6);
    assert_eq!(AFE2_CHARGE_TIME.offset(), 5);
    assert_eq!(OVERCURRENT.offset(), 15);
  }

  #[test]
  fn offset_override() {
    let field = Field::u8(0x10).masked(0xF0).with_offset(2);
    assert_eq!(field.offset(), 2);
    assert_eq!(field.span(), 0x3C);
  }

  #[test]
  fn full_width_detection() {
    assert!(Field::u8(0x41).is_full_width());
    assert!(Field::u16(0x00, ByteOrder::Big).is_full_width());
    assert!(OUT_OF_RANGE.is_full_width());
    assert!(!TOUCH_STATUS.is_full_width());
    assert!(!ECR_ELECTRODES.is_full_width());
    assert!(!Field::u8(0x41).masked(0xFF).with_offset(1).is_full_width());
  }

  #[test]
  fn merge_keeps_neighbouring_bits() {
    assert_eq!(DEBOUNCE_RELEASE.merge(0x05, 3), 0x35);
    assert_eq!(DEBOUNCE_TOUCH.merge(0x35, 0), 0x30);
    assert_eq!(ECR_PROXIMITY.merge(0x8C, 2), 0xAC);
    assert_eq!(CHARGE_TIME_ODD.merge(0x07, 5), 0x57);
  }

  #[test]
  fn decode_ignores_bits_outside_mask() {
    assert_eq!(TOUCH_STATUS.decode(0xF123), 0x0123);
    assert_eq!(TOUCH_STATUS_WITH_PROXIMITY.decode(0xF123), 0x1123);
    assert_eq!(ECR_CALIBRATION_LOCK.decode(0x8C), 2);
  }

  #[test]
  fn signed_fields() {
    let full = Field::u8(0x20).signed();
    assert!(full.fits(-128));
    assert!(full.fits(127));
    assert!(!full.fits(128));
    assert_eq!(full.encode(-1), 0xFF);
    assert_eq!(full.decode(0x80), -128);
    assert_eq!(full.decode(0x7F), 127);

    let nibble = Field::u8(0x20).masked(0xF0).signed();
    assert_eq!(nibble.encode(-2), 0xE0);
    assert_eq!(nibble.decode(0xE5), -2);
    assert!(!nibble.fits(8));

    let wide = Field::u16(0x20, ByteOrder::Big).signed();
    assert_eq!(wide.decode(0x8000), -32768);
    assert_eq!(wide.encode(-32768), 0x8000);
  }

  #[test]
  fn unsigned_fit() {
    assert!(DEBOUNCE_TOUCH.fits(7));
    assert!(!DEBOUNCE_TOUCH.fits(8));
    assert!(!DEBOUNCE_TOUCH.fits(-1));
    assert!(CHARGE_CURRENT.fits(63));
    assert!(!CHARGE_CURRENT.fits(64));
  }

  #[test]
  #[should_panic]
  fn encode_rejects_oversized_value() {
    let _ = DEBOUNCE_RELEASE.encode(8);
  }
}
