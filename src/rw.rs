use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{debug, warn};

use crate::field::{ByteOrder, Field, Width};
use crate::reg::{self, Reg};
use crate::{Error, Mpr121};

impl<I, E> Mpr121<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  /// Read a field and return its value shifted down to bit 0, sign-extended
  /// for signed fields.
  pub async fn read_field(&mut self, field: Field) -> Result<i32, Error<E>> {
    let raw = self.read_raw(field.register(), field.width()).await?;
    Ok(field.decode(raw))
  }

  /// Write `value` into a field.
  ///
  /// Whole-register fields are written directly; narrower fields are merged
  /// into the current register content first. Registers outside the ECR and
  /// GPIO block are written through the Stop Mode sequence, see
  /// [`Mpr121::write_register`].
  ///
  /// # Panics
  ///
  /// When `value` does not fit the field. Nothing is sent to the bus in that
  /// case.
  pub async fn write_field(&mut self, field: Field, value: i32) -> Result<(), Error<E>> {
    assert!(
      field.fits(value),
      "value {} does not fit field {:#06x} of register {:#04x}",
      value,
      field.mask(),
      field.register()
    );

    let raw = if field.is_full_width() {
      field.encode(value)
    } else {
      let current = self.read_raw(field.register(), field.width()).await?;
      field.merge(current, value)
    };

    match field.width() {
      Width::U8 => self.write_register(field.register(), &[raw as u8]).await,
      Width::U16(order) => self.write_u16(field.register(), raw, order).await,
    }
  }

  /// Write `data` starting at `register`, entering Stop Mode around the
  /// write when the chip only accepts it there.
  ///
  /// The ECR content is read first, ECR is cleared, the data is written and
  /// the saved ECR is written back. The restore is attempted even when the
  /// data write fails, so the electrodes are not left disabled.
  pub(crate) async fn write_register(&mut self, register: u8, data: &[u8]) -> Result<(), Error<E>> {
    if reg::writable_in_run_mode(register) {
      return self.write_bytes(register, data).await;
    }

    let ecr = self.read_u8(Reg::Ecr as u8).await?;
    self.state.record_ecr(ecr);
    if ecr != 0 {
      debug!("MPR121 {:#04x}: stop mode for write to {:#04x}", self.address, register);
    }

    self.write_bytes(Reg::Ecr as u8, &[0]).await?;
    let written = self.write_bytes(register, data).await;
    let restored = self.write_bytes(Reg::Ecr as u8, &[ecr]).await;

    if written.is_err() {
      warn!("MPR121 {:#04x}: write to {:#04x} failed", self.address, register);
    }
    written.and(restored)
  }

  pub(crate) async fn read_raw(&mut self, register: u8, width: Width) -> Result<u16, Error<E>> {
    match width {
      Width::U8 => Ok(self.read_u8(register).await? as u16),
      Width::U16(order) => self.read_u16(register, order).await,
    }
  }

  pub(crate) async fn read_u8(&mut self, register: u8) -> Result<u8, Error<E>> {
    let mut buf = [0u8; 1];
    self.read_bytes(register, &mut buf).await?;
    Ok(buf[0])
  }

  pub(crate) async fn read_u16(&mut self, register: u8, order: ByteOrder) -> Result<u16, Error<E>> {
    let mut buf = [0u8; 2];
    self.read_bytes(register, &mut buf).await?;
    Ok(match order {
      ByteOrder::Little => u16::from_le_bytes(buf),
      ByteOrder::Big => u16::from_be_bytes(buf),
    })
  }

  pub(crate) async fn write_u8(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
    self.write_register(register, &[value]).await
  }

  pub(crate) async fn write_u16(&mut self, register: u8, value: u16, order: ByteOrder) -> Result<(), Error<E>> {
    let data = match order {
      ByteOrder::Little => value.to_le_bytes(),
      ByteOrder::Big => value.to_be_bytes(),
    };
    self.write_register(register, &data).await
  }

  pub(crate) async fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Error<E>> {
    let addr = [register];
    self.i2c.write_read(self.address, &addr, buf).await.map_err(|e| {
      warn!("MPR121 {:#04x}: read of {:#04x} failed", self.address, register);
      Error::I2c(e)
    })
  }

  pub(crate) async fn write_bytes(&mut self, register: u8, data: &[u8]) -> Result<(), Error<E>> {
    let len = data.len();
    debug_assert!(len <= 2);
    let mut buf = [0u8; 3];
    buf[0] = register;
    buf[1..=len].copy_from_slice(data);
    self.i2c.write(self.address, &buf[..=len]).await.map_err(|e| {
      warn!("MPR121 {:#04x}: write to {:#04x} failed", self.address, register);
      Error::I2c(e)
    })?;

    if register == Reg::Ecr as u8 {
      self.state.record_ecr(data[0]);
    }
    Ok(())
  }
}
