//! Vdd/Reset sequencing.
//!
//! These complete in-line and raise no events: they precede any bus
//! traffic, so there is nothing asynchronous to report. Pin failures are
//! board configuration faults and propagate as [`Error::Gpio`].

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::Error;
use crate::event::FrameEventHandler;
use crate::phy::{Inner, OptigaPhy, STATE_CONTROL};

impl<M, I2C, D, VDD, RST, H> OptigaPhy<M, I2C, D, VDD, RST, H>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs,
    VDD: OutputPin,
    RST: OutputPin,
    H: FrameEventHandler,
{
    /// Bring the chip to an addressable state: assert reset, raise Vdd,
    /// wait the startup settle time, release reset, wait again.
    pub async fn power_up(&self) -> Result<(), Error> {
        let _guard = self.claim(STATE_CONTROL)?;
        let mut inner = self.inner.lock().await;
        inner.power_up_sequence().await
    }

    /// Inverse ordering of [`power_up`](Self::power_up): assert reset,
    /// then drop Vdd.
    pub async fn power_down(&self) -> Result<(), Error> {
        let _guard = self.claim(STATE_CONTROL)?;
        let mut inner = self.inner.lock().await;
        inner.power_down_sequence().await
    }

    /// Pulse the reset line with Vdd untouched.
    pub async fn warm_reset(&self) -> Result<(), Error> {
        let _guard = self.claim(STATE_CONTROL)?;
        let mut inner = self.inner.lock().await;
        inner.warm_reset_sequence().await
    }
}

impl<I2C, D, VDD, RST> Inner<I2C, D, VDD, RST>
where
    D: DelayNs,
    VDD: OutputPin,
    RST: OutputPin,
{
    pub(crate) async fn power_up_sequence(&mut self) -> Result<(), Error> {
        self.rst.set_low().map_err(|_| Error::Gpio)?;
        self.vdd.set_high().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(self.config.startup_time_ms).await;
        self.rst.set_high().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(self.config.startup_time_ms).await;
        Ok(())
    }

    pub(crate) async fn power_down_sequence(&mut self) -> Result<(), Error> {
        self.rst.set_low().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(self.config.reset_low_time_ms).await;
        self.vdd.set_low().map_err(|_| Error::Gpio)?;
        Ok(())
    }

    pub(crate) async fn warm_reset_sequence(&mut self) -> Result<(), Error> {
        self.rst.set_low().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(self.config.reset_low_time_ms).await;
        self.rst.set_high().map_err(|_| Error::Gpio)?;
        self.delay.delay_ms(self.config.startup_time_ms).await;
        Ok(())
    }
}
