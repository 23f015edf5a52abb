//! Restart latch state machine.
//!
//! A kernel restart is only observable through asynchronous status events on
//! a connection the host owns. The latch arms on a user request and fires
//! after seeing the full `connecting -> connected` transition once, so a
//! websocket hiccup months later never replays initialization.
//!
//! There is deliberately no timeout: a kernel that starts reconnecting but
//! never completes parks the latch in `Connecting`, and the next restart
//! request re-arms it.

use crate::host::{ConnectionStatus, KernelLink, KernelUnavailable};
use log::{info, warn};

/// Latch stage. `Idle` doubles as the post-fire state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartStage {
    /// No restart pending; all status events are ignored.
    #[default]
    Idle,
    /// Restart requested; waiting for the link to start reconnecting.
    Armed,
    /// Reconnect observed; waiting for the link to come back up.
    Connecting,
}

impl RestartStage {
    /// Pure transition function.
    ///
    /// Returns the next stage and whether scene initialization fires. Every
    /// pair not in the table below leaves the stage unchanged:
    ///
    /// | stage      | status     | next       | fire |
    /// |------------|------------|------------|------|
    /// | Armed      | connecting | Connecting | no   |
    /// | Connecting | connected  | Idle       | yes  |
    pub fn advance(self, status: ConnectionStatus) -> (RestartStage, bool) {
        match (self, status) {
            (Self::Armed, ConnectionStatus::Connecting) => (Self::Connecting, false),
            (Self::Connecting, ConnectionStatus::Connected) => (Self::Idle, true),
            (stage, _) => (stage, false),
        }
    }
}

/// Result of a restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// Latch armed and restart issued. `subscribe` is `true` exactly once per
    /// coordinator; the glue must then install the status listener.
    Armed { subscribe: bool },
    /// No live kernel; the request was skipped.
    KernelMissing,
}

/// Per-notebook restart latch.
#[derive(Debug, Default)]
pub struct RestartCoordinator {
    stage: RestartStage,
    subscription_issued: bool,
}

impl RestartCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current latch stage.
    pub fn stage(&self) -> RestartStage {
        self.stage
    }

    /// Arms the latch and asks the host to restart the kernel.
    ///
    /// A request while a sequence is already pending re-arms the latch and
    /// discards the pending sequence. A missing kernel skips the request.
    pub fn request_restart<K: KernelLink>(&mut self, kernel: Option<&mut K>) -> RestartOutcome {
        let Some(kernel) = kernel else {
            warn!("event=restart_request module=restart status=skipped reason=no_kernel");
            return RestartOutcome::KernelMissing;
        };

        if let Err(KernelUnavailable(reason)) = kernel.restart() {
            warn!("event=restart_request module=restart status=skipped reason={reason}");
            return RestartOutcome::KernelMissing;
        }

        self.stage = RestartStage::Armed;
        let subscribe = !self.subscription_issued;
        self.subscription_issued = true;
        info!("event=restart_request module=restart status=armed subscribe={subscribe}");
        RestartOutcome::Armed { subscribe }
    }

    /// Feeds one connection-status event into the latch.
    ///
    /// Returns `true` when the restart sequence completed and tagged-cell
    /// initialization should run now.
    pub fn on_connection_status(&mut self, status: ConnectionStatus) -> bool {
        let (next, fire) = self.stage.advance(status);
        if next != self.stage {
            info!(
                "event=restart_stage module=restart status={status} from={:?} to={next:?}",
                self.stage
            );
        }
        self.stage = next;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::{RestartCoordinator, RestartOutcome, RestartStage};
    use crate::host::memory::MemoryKernel;
    use crate::host::ConnectionStatus;

    fn armed() -> (RestartCoordinator, MemoryKernel) {
        let mut coordinator = RestartCoordinator::new();
        let mut kernel = MemoryKernel::new();
        let outcome = coordinator.request_restart(Some(&mut kernel));
        assert_eq!(outcome, RestartOutcome::Armed { subscribe: true });
        (coordinator, kernel)
    }

    #[test]
    fn full_sequence_fires_exactly_once() {
        let (mut coordinator, _kernel) = armed();
        assert!(!coordinator.on_connection_status(ConnectionStatus::Connecting));
        assert!(coordinator.on_connection_status(ConnectionStatus::Connected));
        assert_eq!(coordinator.stage(), RestartStage::Idle);

        // Unrelated churn after firing stays ignored.
        assert!(!coordinator.on_connection_status(ConnectionStatus::Connecting));
        assert!(!coordinator.on_connection_status(ConnectionStatus::Connected));
        assert_eq!(coordinator.stage(), RestartStage::Idle);
    }

    #[test]
    fn connected_without_connecting_never_fires() {
        let (mut coordinator, _kernel) = armed();
        assert!(!coordinator.on_connection_status(ConnectionStatus::Connected));
        assert_eq!(coordinator.stage(), RestartStage::Armed);
    }

    #[test]
    fn disconnected_is_ignored_in_every_stage() {
        let (mut coordinator, _kernel) = armed();
        assert!(!coordinator.on_connection_status(ConnectionStatus::Disconnected));
        assert_eq!(coordinator.stage(), RestartStage::Armed);

        coordinator.on_connection_status(ConnectionStatus::Connecting);
        assert!(!coordinator.on_connection_status(ConnectionStatus::Disconnected));
        assert_eq!(coordinator.stage(), RestartStage::Connecting);
    }

    #[test]
    fn second_request_rearms_and_skips_resubscription() {
        let (mut coordinator, mut kernel) = armed();
        coordinator.on_connection_status(ConnectionStatus::Connecting);

        let outcome = coordinator.request_restart(Some(&mut kernel));
        assert_eq!(outcome, RestartOutcome::Armed { subscribe: false });
        assert_eq!(coordinator.stage(), RestartStage::Armed);
        assert_eq!(kernel.restart_requests(), 2);
    }

    #[test]
    fn missing_or_dead_kernel_leaves_stage_untouched() {
        let mut coordinator = RestartCoordinator::new();
        assert_eq!(
            coordinator.request_restart::<MemoryKernel>(None),
            RestartOutcome::KernelMissing
        );
        assert_eq!(coordinator.stage(), RestartStage::Idle);

        let mut kernel = MemoryKernel::new();
        kernel.reachable = false;
        assert_eq!(
            coordinator.request_restart(Some(&mut kernel)),
            RestartOutcome::KernelMissing
        );
        assert_eq!(coordinator.stage(), RestartStage::Idle);
    }
}
