pub mod command;
pub mod replicate;
pub mod sink;

pub use command::{copy_structure, AssumeYes, ConfirmPort, CopyReport, CopyRequest};
pub use replicate::{Replication, ReplicationStats, Replicator};
pub use sink::{ChannelSink, MessageLog, ProgressSink};

// Re-export the types every caller of the pipeline needs
pub use treeskel_core::{ProgressMessage, RunState};
pub use treeskel_scanner::{Outcome, ValidatedPair, ValidationError, Validator};
