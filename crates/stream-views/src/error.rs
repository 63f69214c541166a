/// Errors returned by stream view accessors.
///
/// These are precondition violations the caller avoids by checking
/// `is_enabled()` / `mode_count()` first; there is no retry or recovery in
/// this crate, and derived stages propagate a source's error unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("no mode bound to the stream")]
    NoModeBound,
    #[error("no frame has been published yet")]
    NoFrame,
    #[error("{what} is not supported by this stream variant")]
    UnsupportedOperation { what: &'static str },
    #[error("mode index {index} out of range (stream has {count} modes)")]
    ModeOutOfRange { index: usize, count: usize },
    #[error("intrinsics index {index} out of range (table has {count} entries)")]
    IntrinsicsOutOfRange { index: usize, count: usize },
    #[error("frame number {offered} does not advance past {last}")]
    NonMonotonicFrame { last: u64, offered: u64 },
}
