//! Remote status vocabularies and their mapping onto pod lifecycle types.
//!
//! Containers and capsules report status from two different vocabularies.
//! Each gets its own enum and its own mapping; neither is ever used to
//! interpret the other.

use zunlet_core::{
    ContainerState, ContainerStateRunning, ContainerStateTerminated, ContainerStateWaiting,
    PodPhase,
};
use zunlet_capsule::CapsuleContainer;

/// Status of a container inside a capsule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Creating,
    Created,
    Running,
    Stopped,
    Paused,
    Restarting,
    Rebuilding,
    Deleting,
    Deleted,
    Error,
    Dead,
    Unknown,
    Other(String),
}

impl ContainerStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Creating" => Self::Creating,
            "Created" => Self::Created,
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            "Paused" => Self::Paused,
            "Restarting" => Self::Restarting,
            "Rebuilding" => Self::Rebuilding,
            "Deleting" => Self::Deleting,
            "Deleted" => Self::Deleted,
            "Error" => Self::Error,
            "Dead" => Self::Dead,
            "Unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Phase this container counts as when judging readiness.
    pub fn phase(&self) -> PodPhase {
        match self {
            Self::Running => PodPhase::Running,
            Self::Stopped => PodPhase::Succeeded,
            Self::Error | Self::Dead => PodPhase::Failed,
            Self::Creating
            | Self::Created
            | Self::Restarting
            | Self::Rebuilding
            | Self::Paused
            | Self::Deleting
            | Self::Deleted => PodPhase::Pending,
            Self::Unknown | Self::Other(_) => PodPhase::Unknown,
        }
    }
}

/// Status of a capsule as a whole.
///
/// Besides the pod-style names, the engine reports `Error` for a capsule
/// whose creation or containers failed; it counts as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapsuleStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Error,
    Other(String),
}

impl CapsuleStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn phase(&self) -> PodPhase {
        match self {
            Self::Pending => PodPhase::Pending,
            Self::Running => PodPhase::Running,
            Self::Succeeded => PodPhase::Succeeded,
            Self::Failed | Self::Error => PodPhase::Failed,
            Self::Other(_) => PodPhase::Unknown,
        }
    }
}

pub fn container_phase(status: &str) -> PodPhase {
    ContainerStatus::parse(status).phase()
}

pub fn capsule_phase(status: &str) -> PodPhase {
    CapsuleStatus::parse(status).phase()
}

/// Lifecycle state of a capsule container.
///
/// The engine reports no start time or exit code: the creation time stands
/// in for the start, the update time for the finish, and exit codes are 0.
pub fn container_state(container: &CapsuleContainer) -> ContainerState {
    match ContainerStatus::parse(&container.status) {
        ContainerStatus::Running | ContainerStatus::Stopped => {
            ContainerState::Running(ContainerStateRunning {
                started_at: container.created_at,
            })
        }
        ContainerStatus::Error | ContainerStatus::Dead => {
            ContainerState::Terminated(ContainerStateTerminated {
                exit_code: 0,
                reason: container.status.clone(),
                message: container.status_detail.clone(),
                started_at: container.created_at,
                finished_at: container.updated_at,
            })
        }
        _ => ContainerState::Waiting(ContainerStateWaiting {
            reason: container.status.clone(),
            message: container.status_detail.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const CONTAINER_STATUSES: &[&str] = &[
        "Creating", "Created", "Running", "Stopped", "Paused", "Restarting", "Rebuilding",
        "Deleting", "Deleted", "Error", "Dead", "Unknown", "", "Exploded",
    ];

    fn container(status: &str) -> CapsuleContainer {
        CapsuleContainer {
            name: "c1".to_string(),
            status: status.to_string(),
            status_detail: format!("detail for {status}"),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap()),
            ..CapsuleContainer::default()
        }
    }

    #[test]
    fn container_state_is_total() {
        for status in CONTAINER_STATUSES {
            let state = container_state(&container(status));
            let expected_running = matches!(*status, "Running" | "Stopped");
            let expected_terminated = matches!(*status, "Error" | "Dead");
            match state {
                ContainerState::Running(_) => assert!(expected_running, "{status}"),
                ContainerState::Terminated(_) => assert!(expected_terminated, "{status}"),
                ContainerState::Waiting(w) => {
                    assert!(!expected_running && !expected_terminated, "{status}");
                    assert_eq!(w.reason, *status);
                }
            }
        }
    }

    #[test]
    fn running_uses_creation_time_as_start() {
        let c = container("Running");
        match container_state(&c) {
            ContainerState::Running(r) => assert_eq!(r.started_at, c.created_at),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dead_is_terminated_with_status_as_reason() {
        let c = container("Dead");
        match container_state(&c) {
            ContainerState::Terminated(t) => {
                assert_eq!(t.exit_code, 0);
                assert_eq!(t.reason, "Dead");
                assert_eq!(t.message, "detail for Dead");
                assert_eq!(t.started_at, c.created_at);
                assert_eq!(t.finished_at, c.updated_at);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn container_phases() {
        assert_eq!(container_phase("Running"), PodPhase::Running);
        assert_eq!(container_phase("Stopped"), PodPhase::Succeeded);
        assert_eq!(container_phase("Error"), PodPhase::Failed);
        assert_eq!(container_phase("Dead"), PodPhase::Failed);
        for s in ["Creating", "Created", "Restarting", "Rebuilding", "Paused", "Deleting", "Deleted"] {
            assert_eq!(container_phase(s), PodPhase::Pending, "{s}");
        }
        assert_eq!(container_phase("Unknown"), PodPhase::Unknown);
        assert_eq!(container_phase("running"), PodPhase::Unknown);
    }

    #[test]
    fn capsule_phases_are_separate_from_container_phases() {
        assert_eq!(capsule_phase("Running"), PodPhase::Running);
        assert_eq!(capsule_phase("Succeeded"), PodPhase::Succeeded);
        assert_eq!(capsule_phase("Failed"), PodPhase::Failed);
        assert_eq!(capsule_phase("Pending"), PodPhase::Pending);
        assert_eq!(capsule_phase("Error"), PodPhase::Failed);
        // Container vocabulary means nothing at capsule level.
        assert_eq!(capsule_phase("Stopped"), PodPhase::Unknown);
        assert_eq!(capsule_phase("Dead"), PodPhase::Unknown);
        assert_eq!(capsule_phase(""), PodPhase::Unknown);
    }
}
