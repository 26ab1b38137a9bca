//! Press/release callback dispatch on top of the touch status register.
//!
//! A [`Dispatcher`] owns the driver and runs one polling loop: wait for the
//! IRQ line to go low (or not at all with [`NoInterrupt`]), read the touch
//! status, diff it against the previous reading and start the callbacks
//! registered for every channel that was pressed or released. Callbacks are
//! futures polled next to the loop on the same task; the loop never waits for
//! them to finish.
//!
//! At most one invocation per channel and edge is in flight. A new edge on
//! the same channel drops the running invocation before starting a fresh one.
//! Dropping is cooperative: it takes effect at the callback's next `.await`,
//! and a callback that blocks synchronously is not interrupted.
//!
//! ```no_run
//! use embedded_hal_async::{delay::DelayNs, digital::Wait, i2c::{I2c, SevenBitAddress}};
//! use mpr121::{Dispatcher, Mpr121};
//!
//! async fn example<I2C, IRQ, D, E>(sensor: Mpr121<I2C>, irq: IRQ, delay: D) -> Result<(), mpr121::Error<E>>
//! where
//!   I2C: I2c<SevenBitAddress, Error = E>,
//!   IRQ: Wait,
//!   D: DelayNs,
//! {
//!   let dispatcher = Dispatcher::with_interrupt(sensor, irq, delay);
//!   dispatcher.on_press(0, || async { log::info!("pad 0 down") });
//!   dispatcher.on_release(0, || async { log::info!("pad 0 up") });
//!   dispatcher.run().await
//! }
//! ```

use alloc::boxed::Box;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::future::{poll_fn, Future};
use core::mem;
use core::task::Poll;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::{Error as _, ErrorType};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, error};

use crate::{Error, Mpr121, TouchMask, CHANNELS, PROXIMITY_CHANNEL};

/// Settle interval between two status reads unless configured otherwise.
pub const DEFAULT_SETTLE_MS: u32 = 50;

/// Channels that changed between two touch readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edges {
  pub pressed: TouchMask,
  pub released: TouchMask,
}

impl Edges {
  pub fn between(previous: TouchMask, current: TouchMask) -> Self {
    let changed = previous ^ current;
    Self { pressed: changed & current, released: changed & previous }
  }

  pub fn is_empty(&self) -> bool {
    self.pressed.is_empty() && self.released.is_empty()
  }
}

/// IRQ stand-in for boards without the line wired: every wait resolves at
/// once, so the dispatcher polls at the settle interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterrupt;

impl ErrorType for NoInterrupt {
  type Error = Infallible;
}

impl Wait for NoInterrupt {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}

type Callback<'a> = Box<dyn FnMut() -> LocalBoxFuture<'a, ()> + 'a>;

enum Slot<'a> {
  Idle,
  Running(LocalBoxFuture<'a, ()>),
  // Taken out of the slot while being polled.
  Polling,
}

impl<'a> Slot<'a> {
  fn take_running(&mut self) -> Option<LocalBoxFuture<'a, ()>> {
    match mem::replace(self, Slot::Polling) {
      Slot::Running(task) => Some(task),
      other => {
        *self = other;
        None
      }
    }
  }
}

/// Callbacks and in-flight invocations for one edge direction.
struct Handlers<'a> {
  callbacks: [Option<Callback<'a>>; CHANNELS],
  tasks: [Slot<'a>; CHANNELS],
}

impl<'a> Handlers<'a> {
  fn new() -> Self {
    Self { callbacks: core::array::from_fn(|_| None), tasks: core::array::from_fn(|_| Slot::Idle) }
  }

  fn cancel(&mut self, channel: usize) -> Slot<'a> {
    mem::replace(&mut self.tasks[channel], Slot::Idle)
  }

  fn cancel_all(&mut self) -> [Slot<'a>; CHANNELS] {
    mem::replace(&mut self.tasks, core::array::from_fn(|_| Slot::Idle))
  }
}

/// Per-channel press/release callback dispatcher owning an [`Mpr121`].
///
/// Every method takes `&self`, so registration, [`Dispatcher::stop`] and
/// [`Dispatcher::device`] can be used from futures running next to
/// [`Dispatcher::run`] on the same executor.
pub struct Dispatcher<'a, I, D, IRQ = NoInterrupt> {
  device: Mutex<NoopRawMutex, Mpr121<I>>,
  irq: RefCell<IRQ>,
  delay: RefCell<D>,
  settle_ms: u32,
  press: RefCell<Handlers<'a>>,
  release: RefCell<Handlers<'a>>,
  running: Cell<bool>,
  stop: Signal<NoopRawMutex, ()>,
}

impl<'a, I, D> Dispatcher<'a, I, D, NoInterrupt> {
  /// Dispatcher that polls the status register every settle interval.
  pub fn new(device: Mpr121<I>, delay: D) -> Self {
    Self::with_interrupt(device, NoInterrupt, delay)
  }
}

impl<'a, I, D, IRQ> Dispatcher<'a, I, D, IRQ> {
  /// Dispatcher that reads the status register only while `irq` (active
  /// low) is asserted.
  pub fn with_interrupt(device: Mpr121<I>, irq: IRQ, delay: D) -> Self {
    Self {
      device: Mutex::new(device),
      irq: RefCell::new(irq),
      delay: RefCell::new(delay),
      settle_ms: DEFAULT_SETTLE_MS,
      press: RefCell::new(Handlers::new()),
      release: RefCell::new(Handlers::new()),
      running: Cell::new(false),
      stop: Signal::new(),
    }
  }

  /// Wait `ms` milliseconds after each status read.
  pub fn with_settle_interval(mut self, ms: u32) -> Self {
    self.settle_ms = ms;
    self
  }

  pub fn settle_interval(&self) -> u32 {
    self.settle_ms
  }

  /// Driver access while the loop runs. The loop holds the lock only for
  /// the status read.
  pub fn device(&self) -> &Mutex<NoopRawMutex, Mpr121<I>> {
    &self.device
  }

  /// Release the driver, dropping every callback.
  pub fn into_device(self) -> Mpr121<I> {
    self.device.into_inner()
  }

  pub fn is_running(&self) -> bool {
    self.running.get()
  }

  /// Run `callback` whenever `channel` goes from released to touched.
  /// Replaces a previous press callback; its in-flight invocation keeps
  /// running.
  ///
  /// # Panics
  ///
  /// When `channel` exceeds 12.
  pub fn on_press<F, Fut>(&self, channel: u8, callback: F)
  where
    F: FnMut() -> Fut + 'a,
    Fut: Future<Output = ()> + 'a,
  {
    register(&self.press, channel, callback);
  }

  /// Run `callback` whenever `channel` goes from touched to released.
  ///
  /// # Panics
  ///
  /// When `channel` exceeds 12.
  pub fn on_release<F, Fut>(&self, channel: u8, callback: F)
  where
    F: FnMut() -> Fut + 'a,
    Fut: Future<Output = ()> + 'a,
  {
    register(&self.release, channel, callback);
  }

  /// Drop both callbacks of `channel` and cancel their invocations.
  pub fn remove(&self, channel: u8) {
    self.remove_on_press(channel);
    self.remove_on_release(channel);
  }

  pub fn remove_on_press(&self, channel: u8) {
    unregister(&self.press, channel);
  }

  pub fn remove_on_release(&self, channel: u8) {
    unregister(&self.release, channel);
  }

  /// Cancel every in-flight invocation and end an active [`Dispatcher::run`],
  /// which then returns `Ok(())`. Registrations are kept. Calling it when
  /// nothing runs has no effect.
  pub fn stop(&self) {
    self.cancel_all();
    if self.running.get() {
      debug!("MPR121 dispatcher: stop requested");
      self.stop.signal(());
    }
  }

  fn cancel_all(&self) {
    for handlers in [&self.press, &self.release] {
      let cancelled = handlers.borrow_mut().cancel_all();
      drop(cancelled);
    }
  }

  // Start the callbacks of every channel in `channels`, dropping the
  // invocation each one preempts first.
  fn fire(&self, handlers: &RefCell<Handlers<'a>>, channels: TouchMask) {
    for channel in channels.touched() {
      let index = channel as usize;
      let Some(mut callback) = handlers.borrow_mut().callbacks[index].take() else {
        continue;
      };
      let preempted = handlers.borrow_mut().cancel(index);
      drop(preempted);

      let task = callback();
      let mut handlers = handlers.borrow_mut();
      if handlers.callbacks[index].is_none() {
        handlers.callbacks[index] = Some(callback);
      }
      handlers.tasks[index] = Slot::Running(task);
    }
  }

  // Poll every in-flight invocation. Never completes.
  async fn drive(&self) -> Infallible {
    poll_fn(|cx| {
      for handlers in [&self.press, &self.release] {
        for index in 0..CHANNELS {
          let Some(mut task) = handlers.borrow_mut().tasks[index].take_running() else {
            continue;
          };
          let pending = task.as_mut().poll(cx).is_pending();

          // A callback may have removed itself or stopped the dispatcher.
          let mut handlers = handlers.borrow_mut();
          let slot = &mut handlers.tasks[index];
          if let Slot::Polling = slot {
            if pending {
              *slot = Slot::Running(task);
              continue;
            }
            *slot = Slot::Idle;
          }
          drop(handlers);
          drop(task);
        }
      }
      Poll::Pending
    })
    .await
  }
}

impl<'a, I, E, D, IRQ> Dispatcher<'a, I, D, IRQ>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  IRQ: Wait,
{
  /// The dispatch loop. Resolves with `Ok(())` after [`Dispatcher::stop`],
  /// or with the first bus or IRQ error. Returns `Ok(())` at once when
  /// another `run` is active.
  ///
  /// However the loop ends, including the future being dropped, every
  /// in-flight invocation is cancelled.
  ///
  /// The first reading is compared against an empty mask, so channels
  /// already touched when the loop starts fire their press callbacks.
  pub async fn run(&self) -> Result<(), Error<E>> {
    if self.running.replace(true) {
      debug!("MPR121 dispatcher: already running");
      return Ok(());
    }
    let _running = RunningGuard(self);
    self.stop.reset();

    match select(self.poll_loop(), self.stop.wait()).await {
      Either::First(err) => {
        error!("MPR121 dispatcher: stopped on error");
        Err(err)
      }
      Either::Second(()) => Ok(()),
    }
  }

  async fn poll_loop(&self) -> Error<E> {
    let mut previous = TouchMask::EMPTY;
    loop {
      let current = match select(self.next_status(), self.drive()).await {
        Either::First(Ok(current)) => current,
        Either::First(Err(err)) => return err,
        Either::Second(never) => match never {},
      };

      let edges = Edges::between(previous, current);
      if !edges.is_empty() {
        debug!("MPR121 dispatcher: pressed {:#06x} released {:#06x}", edges.pressed.bits(), edges.released.bits());
        self.fire(&self.press, edges.pressed);
        self.fire(&self.release, edges.released);
      }
      previous = current;

      let settle = async { self.delay.borrow_mut().delay_ms(self.settle_ms).await };
      if let Either::Second(never) = select(settle, self.drive()).await {
        match never {}
      }
    }
  }

  async fn next_status(&self) -> Result<TouchMask, Error<E>> {
    self.irq.borrow_mut().wait_for_low().await.map_err(|e| Error::Pin(e.kind()))?;
    self.device.lock().await.touch_status().await
  }
}

fn register<'a, F, Fut>(handlers: &RefCell<Handlers<'a>>, channel: u8, mut callback: F)
where
  F: FnMut() -> Fut + 'a,
  Fut: Future<Output = ()> + 'a,
{
  assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
  let boxed: Callback<'a> = Box::new(move || callback().boxed_local());
  let replaced = handlers.borrow_mut().callbacks[channel as usize].replace(boxed);
  drop(replaced);
}

fn unregister(handlers: &RefCell<Handlers<'_>>, channel: u8) {
  assert!(channel <= PROXIMITY_CHANNEL, "channel {} out of range", channel);
  let (callback, task) = {
    let mut handlers = handlers.borrow_mut();
    let index = channel as usize;
    (handlers.callbacks[index].take(), handlers.cancel(index))
  };
  drop(task);
  drop(callback);
}

// Clears the running flag and cancels leftover invocations when `run` ends.
struct RunningGuard<'r, 'a, I, D, IRQ>(&'r Dispatcher<'a, I, D, IRQ>);

impl<I, D, IRQ> Drop for RunningGuard<'_, '_, I, D, IRQ> {
  fn drop(&mut self) {
    self.0.cancel_all();
    self.0.running.set(false);
  }
}
