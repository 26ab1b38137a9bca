use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{debug, info};

use crate::reg::{self, Reg};
use crate::{DeviceState, Error, Mpr121};

impl<I, E> Mpr121<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  /// Reset the chip and bring it into Run Mode with the staged [`crate::Config`].
  ///
  /// Sequence: soft reset, check AFE2 holds its power-on value, baseline
  /// filter preset for the electrodes and the proximity electrode, AFE1/AFE2,
  /// thresholds, debounce, GPIO function off, optional auto-configuration and
  /// finally the ECR value that starts sensing.
  pub async fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
    self.soft_reset(delay).await?;

    // Verify the chip came back from reset
    let afe2 = self.read_u8(Reg::Afe2 as u8).await?;
    if afe2 != reg::AFE2_RESET_VALUE {
      return Err(Error::UnexpectedConfig(afe2));
    }

    // Configure device
    let config = self.config;
    self.write_table(&config.electrode_filter.registers(Reg::MhdRising)).await?;
    self.write_table(&config.proximity_filter.registers(Reg::ProxMhdRising)).await?;
    self.write_u8(Reg::Afe1 as u8, config.afe.afe1()).await?;
    self.write_u8(Reg::Afe2 as u8, config.afe.afe2()).await?;

    self.set_thresholds(config.touch_threshold, config.release_threshold).await?;
    self.set_proximity_thresholds(config.proximity_touch_threshold, config.proximity_release_threshold).await?;
    self.set_debounce(config.debounce.touch, config.debounce.release).await?;

    self.disable_gpio().await?;

    if config.autoconfig {
      self.set_autoconfig(true).await?;
    }

    // Enter Run Mode
    let ecr = config.run_mode_ecr();
    self.write_u8(Reg::Ecr as u8, ecr).await?;
    info!("MPR121 {:#04x}: running, ECR {:#04x}", self.address, ecr);
    Ok(())
  }

  /// Issue a soft reset and wait for the chip to come back.
  ///
  /// All registers return to their power-on values, which leaves the chip
  /// in Stop Mode.
  pub async fn soft_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
    self.write_u8(Reg::SoftReset as u8, reg::SOFT_RESET_MAGIC).await?;
    delay.delay_ms(1).await;
    self.state = DeviceState::default();
    debug!("MPR121 {:#04x}: soft reset", self.address);
    Ok(())
  }

  async fn write_table(&mut self, table: &[(u8, u8)]) -> Result<(), Error<E>> {
    for &(register, value) in table {
      self.write_u8(register, value).await?;
    }
    Ok(())
  }

  // Electrodes 4..11 double as GPIO; hand them all to sensing.
  async fn disable_gpio(&mut self) -> Result<(), Error<E>> {
    self.write_u8(Reg::GpioEnable as u8, 0).await?;
    self.write_u8(Reg::GpioControl0 as u8, 0).await?;
    self.write_u8(Reg::GpioControl1 as u8, 0).await
  }
}
