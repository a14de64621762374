use crate::error::TransferError;

/// Outcome of one accepted transfer.
///
/// Delivered to the registered [`FrameEventHandler`] exactly once per
/// accepted `send_frame`/`receive_frame` request, and never for a request
/// rejected with [`Error::Busy`](crate::Error::Busy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event<'a> {
    /// The frame was written and acknowledged by the chip.
    SendDone,
    SendError(TransferError),
    /// A response frame arrived. The slice borrows the driver's receive
    /// buffer and is only valid for the duration of the callback.
    ReceiveDone(&'a [u8]),
    ReceiveError(TransferError),
}

/// Upper-layer sink for transfer outcomes.
///
/// Invoked from the task driving the transfer, after the link has returned
/// to idle, so the handler may immediately queue the next request. Handlers
/// are typically thin: push the outcome into a channel or flip a signal for
/// the data-link task.
pub trait FrameEventHandler {
    fn on_event(&self, event: Event<'_>);
}

impl<F> FrameEventHandler for F
where
    F: for<'a> Fn(Event<'a>),
{
    fn on_event(&self, event: Event<'_>) {
        self(event)
    }
}
