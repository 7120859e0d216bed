//! The single delay timer of an actor.

use crate::actor::context::{Command, Mailbox};
use std::time::Duration;
use tokio::task::JoinHandle;

/// One active timer at a time, tagged with a generation.
///
/// Every schedule or cancel bumps the generation, and the run loop only
/// accepts an expiry whose generation is current. An expiry already sitting
/// in the mailbox when its timer is cancelled is therefore discarded.
pub(crate) struct DelayTimer {
    generation: u64,
    active: Option<JoinHandle<()>>,
}

impl DelayTimer {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            active: None,
        }
    }

    pub(crate) fn schedule<S, E>(&mut self, duration: Duration, mailbox: &Mailbox<S, E>)
    where
        S: Send + 'static,
        E: Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let mailbox = mailbox.clone();
        self.active = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            mailbox.command(Command::Timer { generation });
        }));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Accept an expiry. The timer is spent afterwards.
    pub(crate) fn fire(&mut self, generation: u64) -> bool {
        if self.active.is_none() || generation != self.generation {
            return false;
        }
        self.active = None;
        true
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
