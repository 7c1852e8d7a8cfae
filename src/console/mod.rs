//! The output multiplexer: configuration, color markup, object formatting
//! and the coordinator that ties them to the log and the sinks.
pub mod color;
pub mod coordinator;
pub mod formatter;
pub mod markup;
pub mod options;
pub mod writer;

pub use color::{ColorPair, ConsoleColor};
pub use coordinator::OutputCoordinator;
pub use formatter::{AnalyzeOptions, JsonFormatter, ObjectFormatter};
pub use markup::Markup;
pub use options::ConsoleOptions;
pub use writer::{ConsoleWriter, LineSplitter, Segment};
