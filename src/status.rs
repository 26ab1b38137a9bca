use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::warn;

use crate::field;
use crate::reg::{self, Reg};
use crate::{Error, Mpr121, CHANNELS, PROXIMITY_CHANNEL};

/// Touch bits of ELE0..ELE11, plus bit 12 for the proximity electrode when
/// read with [`Mpr121::touch_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchMask(u16);

impl TouchMask {
  pub const EMPTY: Self = Self(0);

  pub const fn from_bits(bits: u16) -> Self {
    Self(bits & 0x1FFF)
  }

  pub const fn bits(self) -> u16 {
    self.0
  }

  pub const fn is_touched(self, channel: u8) -> bool {
    (channel as usize) < CHANNELS && self.0 & (1 << channel) != 0
  }

  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// Proximity electrode state. Always `false` for a mask from
  /// [`Mpr121::touch_mask`].
  pub const fn is_proximity(self) -> bool {
    self.is_touched(PROXIMITY_CHANNEL)
  }

  pub const fn count(self) -> u32 {
    self.0.count_ones()
  }

  /// Channels set in this mask, lowest first.
  pub fn touched(self) -> impl Iterator<Item = u8> {
    (0..CHANNELS as u8).filter(move |&channel| self.is_touched(channel))
  }
}

impl From<TouchMask> for u16 {
  fn from(mask: TouchMask) -> Self {
    mask.0
  }
}

impl core::ops::BitXor for TouchMask {
  type Output = Self;

  fn bitxor(self, rhs: Self) -> Self {
    Self(self.0 ^ rhs.0)
  }
}

impl core::ops::BitAnd for TouchMask {
  type Output = Self;

  fn bitand(self, rhs: Self) -> Self {
    Self(self.0 & rhs.0)
  }
}

/// Out-of-range electrodes and sticky auto-configuration failure flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange {
  /// Electrodes whose reading left the auto-configuration window.
  pub channels: TouchMask,
  pub autoconfig_failed: bool,
  pub autoreconfig_failed: bool,
}

impl From<u16> for OutOfRange {
  fn from(raw: u16) -> Self {
    Self {
      channels: TouchMask::from_bits(raw),
      autoconfig_failed: raw & 1 << 15 != 0,
      autoreconfig_failed: raw & 1 << 14 != 0,
    }
  }
}

impl<I, E> Mpr121<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  /// Touched electrodes ELE0..ELE11.
  pub async fn touch_mask(&mut self) -> Result<TouchMask, Error<E>> {
    let bits = self.read_field(field::TOUCH_STATUS).await?;
    Ok(TouchMask::from_bits(bits as u16))
  }

  /// Touched electrodes including the proximity electrode at bit 12.
  pub async fn touch_status(&mut self) -> Result<TouchMask, Error<E>> {
    let bits = self.read_field(field::TOUCH_STATUS_WITH_PROXIMITY).await?;
    Ok(TouchMask::from_bits(bits as u16))
  }

  /// 10-bit filtered electrode reading, 0 for a channel above 12.
  pub async fn filtered_data(&mut self, channel: u8) -> Result<u16, Error<E>> {
    if channel > PROXIMITY_CHANNEL {
      return Ok(0);
    }
    let value = self.read_field(field::FILTERED_DATA.at(reg::filtered_data(channel))).await?;
    Ok(value as u16)
  }

  /// Electrode baseline on the 10-bit scale of [`Mpr121::filtered_data`].
  /// The chip keeps only the upper eight bits. 0 for a channel above 12.
  pub async fn baseline(&mut self, channel: u8) -> Result<u16, Error<E>> {
    if channel > PROXIMITY_CHANNEL {
      return Ok(0);
    }
    let value = self.read_field(field::BASELINE.at(reg::baseline(channel))).await?;
    Ok((value as u16) << 2)
  }

  pub async fn out_of_range_status(&mut self) -> Result<OutOfRange, Error<E>> {
    let raw = self.read_field(field::OUT_OF_RANGE).await?;
    Ok(OutOfRange::from(raw as u16))
  }

  /// Over-current on REXT. The chip stops sensing until the flag is
  /// cleared with [`Mpr121::clear_overcurrent_flag`].
  pub async fn is_overcurrent(&mut self) -> Result<bool, Error<E>> {
    let overcurrent = self.read_field(field::OVERCURRENT).await? != 0;
    if overcurrent {
      warn!("MPR121 {:#04x}: over-current", self.address);
    }
    Ok(overcurrent)
  }

  pub async fn clear_overcurrent_flag(&mut self) -> Result<(), Error<E>> {
    self.write_u8(Reg::TouchStatusHigh as u8, reg::OVERCURRENT_CLEAR).await
  }
}
