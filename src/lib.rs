//! Mirrors a process's output stream to remote console viewers while keeping
//! a size-bounded, serializable log of everything written.
pub mod console;
pub mod error;
pub mod logging;
pub mod remote;
pub mod sink;
pub mod web;

pub use console::{ConsoleOptions, ConsoleWriter, OutputCoordinator};
pub use error::{FormatError, ParseError, RemoteError, SinkError};
pub use logging::{LogBuffer, LogEntry, LogLevel, LogOptions};
pub use remote::{ClientCredentials, RemoteClient};
pub use sink::{OutputMessage, OutputSink};
