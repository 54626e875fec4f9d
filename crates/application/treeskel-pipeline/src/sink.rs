use std::sync::mpsc::Sender;
use tracing::debug;
use treeskel_core::ProgressMessage;

/// Receiver of status messages, in production order.
pub trait ProgressSink {
    fn emit(&mut self, message: &ProgressMessage);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressMessage),
{
    fn emit(&mut self, message: &ProgressMessage) {
        self(message)
    }
}

/// Forwards messages to another thread. A hung-up receiver is ignored.
pub struct ChannelSink(pub Sender<ProgressMessage>);

impl ProgressSink for ChannelSink {
    fn emit(&mut self, message: &ProgressMessage) {
        if self.0.send(message.clone()).is_err() {
            debug!("Progress receiver gone, dropping: {}", message);
        }
    }
}

/// In-memory transcript of a run.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    pub messages: Vec<ProgressMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status lines as a user would see them.
    pub fn lines(&self) -> Vec<String> {
        self.messages.iter().map(ToString::to_string).collect()
    }

    pub fn last(&self) -> Option<&ProgressMessage> {
        self.messages.last()
    }
}

impl ProgressSink for MessageLog {
    fn emit(&mut self, message: &ProgressMessage) {
        self.messages.push(message.clone());
    }
}
