use thiserror::Error;

/// Closed error set shared by the engine, the configuration store and the
/// host gateways.
///
/// Setters never mutate state when they fail: an error always means the
/// aggregate is exactly as it was before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A caller-supplied identifier (relay, queue, slot, month, pump, hour,
    /// weekday) is out of range.
    #[error("invalid parameter")]
    Param,

    /// A caller-supplied value exceeds the width of its configuration field.
    #[error("value out of range")]
    Range,

    /// The resource is in use and the operation cannot proceed now.
    #[error("busy")]
    Busy,

    /// A hardware gateway operation failed.
    #[error("hardware fault")]
    Hardware,

    /// Loading or storing the persisted configuration failed.
    #[error("storage fault")]
    Storage,

    /// Generic failure. The tick returns this when the clock source fails;
    /// runtime state is left untouched so the next tick can retry.
    #[error("operation failed")]
    Fail,
}

pub type Result<T> = core::result::Result<T, Error>;
