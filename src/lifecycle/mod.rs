//! Ride lifecycle view-model: how a status is displayed and which actions a
//! driver may take from it.

use serde::Serialize;

use crate::models::ride::RideStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Yellow,
    Blue,
    Indigo,
    Purple,
    Green,
    Red,
    Gray,
}

impl RideStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RideStatus::Requested => "Requested",
            RideStatus::Accepted => "Accepted",
            RideStatus::PickedUp => "Picked Up",
            RideStatus::InTransit => "In Transit",
            RideStatus::Completed => "Completed",
            RideStatus::Cancelled => "Cancelled",
            RideStatus::Unknown(_) => "Unknown",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            RideStatus::Requested => StatusColor::Yellow,
            RideStatus::Accepted => StatusColor::Blue,
            RideStatus::PickedUp => StatusColor::Indigo,
            RideStatus::InTransit => StatusColor::Purple,
            RideStatus::Completed => StatusColor::Green,
            RideStatus::Cancelled => StatusColor::Red,
            RideStatus::Unknown(_) => StatusColor::Gray,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// A driver is currently working this ride.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RideStatus::Accepted | RideStatus::PickedUp | RideStatus::InTransit
        )
    }
}

/// A driver-initiated transition.
///
/// Accepting is its own backend operation because it also assigns the
/// driver; every other move goes through the generic status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideAction {
    Accept,
    Advance(RideStatus),
}

impl RideAction {
    pub fn target(&self) -> RideStatus {
        match self {
            RideAction::Accept => RideStatus::Accepted,
            RideAction::Advance(status) => status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    /// `"accept"` for the accept operation, otherwise `"status"`.
    pub kind: &'static str,
    pub target: RideStatus,
    pub label: &'static str,
}

/// Legal next actions for a driver looking at a ride in `status`.
pub fn next_actions(status: &RideStatus) -> Vec<(RideAction, &'static str)> {
    match status {
        RideStatus::Requested => vec![
            (RideAction::Accept, "Accept Ride"),
            (RideAction::Advance(RideStatus::Cancelled), "Decline"),
        ],
        RideStatus::Accepted => vec![
            (RideAction::Advance(RideStatus::PickedUp), "Mark as Picked Up"),
            (RideAction::Advance(RideStatus::Cancelled), "Cancel"),
        ],
        RideStatus::PickedUp => vec![
            (RideAction::Advance(RideStatus::InTransit), "Start Trip"),
            (RideAction::Advance(RideStatus::Cancelled), "Cancel"),
        ],
        RideStatus::InTransit => vec![(RideAction::Advance(RideStatus::Completed), "Complete Ride")],
        RideStatus::Completed | RideStatus::Cancelled | RideStatus::Unknown(_) => Vec::new(),
    }
}

pub fn action_views(status: &RideStatus) -> Vec<ActionView> {
    next_actions(status)
        .into_iter()
        .map(|(action, label)| ActionView {
            kind: match action {
                RideAction::Accept => "accept",
                RideAction::Advance(_) => "status",
            },
            target: action.target(),
            label,
        })
        .collect()
}

/// Riders may withdraw a ride until the driver has picked them up.
pub fn rider_can_cancel(status: &RideStatus) -> bool {
    matches!(status, RideStatus::Requested | RideStatus::Accepted)
}

pub fn rider_can_rate(status: &RideStatus, already_rated: bool) -> bool {
    *status == RideStatus::Completed && !already_rated
}

#[cfg(test)]
mod tests {
    use super::{action_views, next_actions, rider_can_cancel, RideAction, StatusColor};
    use crate::models::ride::RideStatus;

    fn targets(status: RideStatus) -> Vec<RideAction> {
        next_actions(&status).into_iter().map(|(a, _)| a).collect()
    }

    #[test]
    fn transition_table_matches_driver_flow() {
        assert_eq!(
            targets(RideStatus::Requested),
            vec![RideAction::Accept, RideAction::Advance(RideStatus::Cancelled)]
        );
        assert_eq!(
            targets(RideStatus::Accepted),
            vec![
                RideAction::Advance(RideStatus::PickedUp),
                RideAction::Advance(RideStatus::Cancelled)
            ]
        );
        assert_eq!(
            targets(RideStatus::PickedUp),
            vec![
                RideAction::Advance(RideStatus::InTransit),
                RideAction::Advance(RideStatus::Cancelled)
            ]
        );
        assert_eq!(
            targets(RideStatus::InTransit),
            vec![RideAction::Advance(RideStatus::Completed)]
        );
        assert!(targets(RideStatus::Completed).is_empty());
        assert!(targets(RideStatus::Cancelled).is_empty());
    }

    #[test]
    fn unknown_status_is_neutral_and_inert() {
        let status = RideStatus::from("teleported");
        assert_eq!(status.label(), "Unknown");
        assert_eq!(status.color(), StatusColor::Gray);
        assert!(next_actions(&status).is_empty());
    }

    #[test]
    fn labels_follow_the_table() {
        let labels: Vec<_> = action_views(&RideStatus::Requested)
            .into_iter()
            .map(|v| (v.kind, v.label))
            .collect();
        assert_eq!(labels, vec![("accept", "Accept Ride"), ("status", "Decline")]);

        let complete = action_views(&RideStatus::InTransit);
        assert_eq!(complete[0].label, "Complete Ride");
        assert_eq!(complete[0].target, RideStatus::Completed);
    }

    #[test]
    fn accept_lands_in_accepted() {
        assert_eq!(RideAction::Accept.target(), RideStatus::Accepted);
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for status in RideStatus::KNOWN {
            assert_eq!(status.is_terminal(), next_actions(&status).is_empty());
        }
    }

    #[test]
    fn rider_cancel_window() {
        assert!(rider_can_cancel(&RideStatus::Requested));
        assert!(rider_can_cancel(&RideStatus::Accepted));
        assert!(!rider_can_cancel(&RideStatus::InTransit));
    }
}
