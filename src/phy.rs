use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::once_lock::OnceLock;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{
    self, ErrorKind, I2c, NoAcknowledgeSource, Operation,
};
use portable_atomic::{AtomicU8, Ordering};

use crate::config::Config;
use crate::error::{Error, TransferError};
use crate::event::{Event, FrameEventHandler};
use crate::registers;
use crate::MAX_FRAME_SIZE;

pub(crate) const STATE_IDLE: u8 = 0;
const STATE_SEND: u8 = 1;
const STATE_RECEIVE: u8 = 2;
/// Internal refinement of the busy states: a synchronous-style operation
/// (address change, power sequencing) holds the link without a transfer.
pub(crate) const STATE_CONTROL: u8 = 3;

/// Where a slave address change takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressStorage {
    /// Update the driver context only; reverts on the next cold reset.
    Volatile,
    /// Additionally commit the address to the chip's non-volatile memory.
    Persistent,
}

/// One secure-element endpoint.
///
/// Owns the injected bus, delay source and power pins for its lifetime.
/// All methods take `&self`; mutual exclusion is a lock-free state gate,
/// so a second request while one is in flight fails with [`Error::Busy`]
/// instead of queueing.
pub struct OptigaPhy<M: RawMutex, I2C, D, VDD, RST, H> {
    state: AtomicU8,
    handler: OnceLock<H>,
    pub(crate) inner: Mutex<M, Inner<I2C, D, VDD, RST>>,
}

pub(crate) struct Inner<I2C, D, VDD, RST> {
    pub(crate) i2c: I2C,
    pub(crate) delay: D,
    pub(crate) vdd: VDD,
    pub(crate) rst: RST,
    pub(crate) address: u8,
    pub(crate) config: Config,
    rx: [u8; MAX_FRAME_SIZE],
}

/// Releases the state gate when the operation finishes, or when its future
/// is dropped mid-transfer (the operation is then abandoned without an
/// event, matching "ignore the eventual callback" semantics).
pub(crate) struct OpGuard<'a> {
    state: &'a AtomicU8,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.state.store(STATE_IDLE, Ordering::Release);
    }
}

impl<M, I2C, D, VDD, RST, H> OptigaPhy<M, I2C, D, VDD, RST, H>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs,
    VDD: OutputPin,
    RST: OutputPin,
    H: FrameEventHandler,
{
    pub const fn new(
        i2c: I2C,
        delay: D,
        vdd: VDD,
        rst: RST,
        config: Config,
    ) -> Self {
        Self {
            state: AtomicU8::new(STATE_IDLE),
            handler: OnceLock::new(),
            inner: Mutex::new(Inner {
                i2c,
                delay,
                vdd,
                rst,
                address: config.slave_address,
                config,
                rx: [0; MAX_FRAME_SIZE],
            }),
        }
    }

    /// Register the event handler. Must be called once before any transfer.
    pub fn init(&self, handler: H) -> Result<(), Error> {
        self.handler
            .init(handler)
            .map_err(|_| Error::AlreadyInitialized)
    }

    /// Whether an operation is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.state.load(Ordering::Acquire) != STATE_IDLE
    }

    /// Write one frame to the chip's data register.
    ///
    /// The busy check happens before the first await point: a rejected call
    /// returns [`Error::Busy`] without touching the bus. An accepted call
    /// runs the transfer and delivers exactly one [`Event::SendDone`] or
    /// [`Event::SendError`] before the future resolves. The frame buffer is
    /// only borrowed for the duration of the bus transaction.
    pub async fn send_frame(&self, frame: &[u8]) -> Result<(), Error> {
        let handler = self.handler.try_get().ok_or(Error::NotInitialized)?;
        let guard = self.claim(STATE_SEND)?;

        let mut inner = self.inner.lock().await;
        let outcome = inner.write_data(frame).await;

        // Back to idle before the event fires, so the handler may queue
        // the next request.
        drop(guard);
        match outcome {
            Ok(()) => handler.on_event(Event::SendDone),
            Err(e) => handler.on_event(Event::SendError(e)),
        }
        Ok(())
    }

    /// Fetch the chip's pending response frame.
    ///
    /// Polls `I2C_STATE` up to `max_poll_attempts` times with capped
    /// exponential backoff while the chip reports busy, then reads the
    /// announced number of bytes from the data register. Delivers exactly
    /// one [`Event::ReceiveDone`] or [`Event::ReceiveError`]; busy answers
    /// are never surfaced individually.
    pub async fn receive_frame(&self) -> Result<(), Error> {
        let handler = self.handler.try_get().ok_or(Error::NotInitialized)?;
        let guard = self.claim(STATE_RECEIVE)?;

        let mut inner = self.inner.lock().await;
        let outcome = inner.read_frame().await;

        drop(guard);
        match outcome {
            Ok(len) => handler.on_event(Event::ReceiveDone(&inner.rx[..len])),
            Err(e) => handler.on_event(Event::ReceiveError(e)),
        }
        Ok(())
    }

    /// Change the chip's slave address.
    ///
    /// Synchronous from the caller's point of view: the result comes back in
    /// the return value and no event is raised. Fails with [`Error::Busy`]
    /// while a transfer is in flight, so an address change can never race
    /// one. A persisted change is verified by reading `BASE_ADDR` back at
    /// the new address; on any failure the stored address is left unchanged.
    pub async fn write_slave_address(
        &self,
        address: u8,
        storage: AddressStorage,
    ) -> Result<(), Error> {
        if address > 0x7F {
            return Err(Error::InvalidAddress);
        }
        let _guard = self.claim(STATE_CONTROL)?;

        let mut inner = self.inner.lock().await;
        match storage {
            AddressStorage::Volatile => {
                inner.address = address;
                Ok(())
            }
            AddressStorage::Persistent => inner.persist_address(address).await,
        }
    }

    pub(crate) fn claim(&self, target: u8) -> Result<OpGuard<'_>, Error> {
        self.state
            .compare_exchange(
                STATE_IDLE,
                target,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| Error::Busy)?;
        Ok(OpGuard { state: &self.state })
    }
}

impl<I2C, D, VDD, RST> Inner<I2C, D, VDD, RST>
where
    I2C: I2c,
    D: DelayNs,
    VDD: OutputPin,
    RST: OutputPin,
{
    async fn write_data(&mut self, frame: &[u8]) -> Result<(), TransferError> {
        let address = self.address;
        let res = self
            .i2c
            .transaction(
                address,
                &mut [
                    Operation::Write(&[registers::DATA]),
                    Operation::Write(frame),
                ],
            )
            .await;
        self.guard_time().await;
        res.map_err(TransferError::from_bus)
    }

    async fn read_frame(&mut self) -> Result<usize, TransferError> {
        let mut backoff = self.config.poll_interval_us;
        for attempt in 0..self.config.max_poll_attempts {
            if attempt != 0 {
                self.delay.delay_us(backoff).await;
                backoff = (backoff * 2).min(self.config.poll_interval_max_us);
            }
            if let Some(len) = self.poll_status().await? {
                return self.read_data(len).await;
            }
        }
        Err(TransferError::RetryExhausted)
    }

    /// One `I2C_STATE` poll. `Ok(None)` is the chip's busy-wait signal:
    /// either its address is NACKed outright or the status register says
    /// no response is ready yet.
    async fn poll_status(&mut self) -> Result<Option<usize>, TransferError> {
        let address = self.address;

        let res = self.i2c.write(address, &[registers::I2C_STATE]).await;
        self.guard_time().await;
        if let Err(e) = res {
            return busy_or_fault(e);
        }

        let mut raw = [0u8; 4];
        let res = self.i2c.read(address, &mut raw).await;
        self.guard_time().await;
        if let Err(e) = res {
            return busy_or_fault(e);
        }

        let state = registers::I2cState::from_bytes(raw);
        Ok(state.response_len().map(|len| len.min(MAX_FRAME_SIZE)))
    }

    async fn read_data(&mut self, len: usize) -> Result<usize, TransferError> {
        let address = self.address;

        let res = self.i2c.write(address, &[registers::DATA]).await;
        self.guard_time().await;
        res.map_err(TransferError::from_bus)?;

        let res = self.i2c.read(address, &mut self.rx[..len]).await;
        self.guard_time().await;
        res.map_err(TransferError::from_bus)?;
        Ok(len)
    }

    async fn persist_address(&mut self, address: u8) -> Result<(), Error> {
        let current = self.address;
        let res = self
            .i2c
            .write(
                current,
                &[
                    registers::BASE_ADDR,
                    registers::BASE_ADDR_PERSIST,
                    address,
                ],
            )
            .await;
        self.guard_time().await;
        res.map_err(|_| Error::PersistFailed)?;

        // Once the write took effect the chip answers on the new address;
        // read the register back to confirm the commit.
        let res = self.i2c.write(address, &[registers::BASE_ADDR]).await;
        self.guard_time().await;
        res.map_err(|_| Error::PersistFailed)?;

        let mut raw = [0u8; 2];
        let res = self.i2c.read(address, &mut raw).await;
        self.guard_time().await;
        res.map_err(|_| Error::PersistFailed)?;

        if raw[1] & 0x7F != address {
            return Err(Error::PersistFailed);
        }
        self.address = address;
        Ok(())
    }

    pub(crate) async fn guard_time(&mut self) {
        self.delay.delay_us(self.config.guard_time_us).await;
    }
}

/// Classify a bus error on the receive polling path. An address NACK is the
/// chip's busy-wait pattern, not a fault.
fn busy_or_fault<E: i2c::Error>(
    err: E,
) -> Result<Option<usize>, TransferError> {
    match err.kind() {
        ErrorKind::NoAcknowledge(
            NoAcknowledgeSource::Address | NoAcknowledgeSource::Unknown,
        ) => Ok(None),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => {
            Err(TransferError::Nack)
        }
        kind => Err(TransferError::Bus(kind)),
    }
}
