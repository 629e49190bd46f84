//! Global log stream instance.
//!
//! One stream is enough: the edge handlers never log (their budget is a
//! few hundred cycles), so the producers are the main loop and whatever
//! bring-up code runs before it, and the console is the single consumer.

use crate::logging::LogStream;

/// Process-wide log stream, drained to the console by the main loop.
pub static LOG_STREAM: LogStream = LogStream::new();
