/// Timing and retry policy of the physical layer.
///
/// The defaults follow the host-library profile for the SLS32 chip family;
/// board integrations should override them from the datasheet of the exact
/// part in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit slave address the chip ships with.
    pub slave_address: u8,
    /// Number of `I2C_STATE` polls before a receive gives up.
    pub max_poll_attempts: u32,
    /// Delay before the first poll retry; doubles on each busy answer.
    pub poll_interval_us: u32,
    /// Upper bound for the poll backoff.
    pub poll_interval_max_us: u32,
    /// Idle time inserted after every bus access.
    pub guard_time_us: u32,
    /// Settle time after a power or reset transition before the chip is
    /// addressable.
    pub startup_time_ms: u32,
    /// Minimum time the reset line is held low.
    pub reset_low_time_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            slave_address: 0x30,
            max_poll_attempts: 200,
            poll_interval_us: 1_000,
            poll_interval_max_us: 8_000,
            guard_time_us: 50,
            startup_time_ms: 15,
            reset_low_time_ms: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
