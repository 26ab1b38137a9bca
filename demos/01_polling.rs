//! Bring-up and polling example: touched pads, filtered data and faults.
#![allow(unused)]
use embedded_hal_async::{
  delay::DelayNs,
  i2c::{I2c, SevenBitAddress},
};
use mpr121::{Config, Debounce, Mpr121, ProximityMode, PHYSICAL_CHANNELS};

#[allow(dead_code)]
async fn main_async<I2C, D, E>(i2c: I2C, mut delay: D) -> Result<(), mpr121::Error<E>>
where
  I2C: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  let config = Config::default()
    .with_thresholds(24, 12)
    .with_debounce(Debounce::new(2, 2))
    .with_proximity(ProximityMode::Channels0To3)
    .with_autoconfig(true);

  let mut sensor = Mpr121::new(i2c, config);
  sensor.initialize(&mut delay).await?;

  loop {
    if sensor.is_overcurrent().await? {
      sensor.clear_overcurrent_flag().await?;
      sensor.initialize(&mut delay).await?;
      continue;
    }

    let status = sensor.touch_status().await?;
    for channel in status.touched() {
      let _delta = sensor.baseline(channel).await? as i32 - sensor.filtered_data(channel).await? as i32;
    }
    if status.is_proximity() {
      // hand nearby
    }

    let out_of_range = sensor.out_of_range_status().await?;
    if out_of_range.autoconfig_failed {
      // electrodes need manual charge settings
      for channel in 0..PHYSICAL_CHANNELS {
        sensor.set_channel_charge_current(channel, 16).await?;
      }
    }

    delay.delay_ms(20).await;
  }
}

fn main() {}
