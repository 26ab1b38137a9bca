//! Callback dispatch example: per-pad press/release handlers driven by IRQ.
#![allow(unused)]
use embedded_hal_async::{
  delay::DelayNs,
  digital::Wait,
  i2c::{I2c, SevenBitAddress},
};
use embassy_futures::join::join;
use mpr121::{Config, Dispatcher, Mpr121, PROXIMITY_CHANNEL};

#[allow(dead_code)]
async fn main_async<I2C, IRQ, D, E>(i2c: I2C, irq: IRQ, mut delay: D) -> Result<(), mpr121::Error<E>>
where
  I2C: I2c<SevenBitAddress, Error = E>,
  IRQ: Wait,
  D: DelayNs + Clone,
{
  let mut sensor = Mpr121::new(i2c, Config::default());
  sensor.initialize(&mut delay).await?;

  let dispatcher = Dispatcher::with_interrupt(sensor, irq, delay.clone()).with_settle_interval(20);

  for pad in 0..4 {
    let pad_delay = delay.clone();
    dispatcher.on_press(pad, move || {
      let mut pad_delay = pad_delay.clone();
      async move {
        // long press after one second, dropped if the pad is pressed again
        pad_delay.delay_ms(1000).await;
        log::info!("pad {} long press", pad);
      }
    });
    dispatcher.on_release(pad, move || async move { log::info!("pad {} released", pad) });
  }
  dispatcher.on_press(PROXIMITY_CHANNEL, || async { log::info!("hand nearby") });

  let tune = async {
    dispatcher.device().lock().await.set_thresholds(30, 15).await?;
    Ok::<(), mpr121::Error<E>>(())
  };
  let (run, tuned) = join(dispatcher.run(), tune).await;
  tuned?;
  run
}

fn main() {}
