use serde::{Deserialize, Serialize};

use crate::domain::{Content, MenuId, Slot, SurfaceId, UserId};

/// Raw interaction reported by the host, always scoped to one surface instance
/// (except disconnects, which are scoped to the user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HostEvent {
    Click {
        surface_id: SurfaceId,
        slot: Slot,
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current: Option<Content>,
    },
    Open {
        surface_id: SurfaceId,
        user_id: UserId,
    },
    Close {
        surface_id: SurfaceId,
        user_id: UserId,
    },
    Disconnect {
        user_id: UserId,
    },
}

impl HostEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Click { user_id, .. }
            | Self::Open { user_id, .. }
            | Self::Close { user_id, .. }
            | Self::Disconnect { user_id } => *user_id,
        }
    }
}

/// What the host should do with the event after the listeners ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventVerdict {
    /// Apply the host's default behavior (e.g. move the clicked payload).
    #[default]
    PassThrough,
    /// Suppress the host's default behavior.
    Cancel,
}

impl EventVerdict {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancel
    }

    /// Combines verdicts of several listeners; any cancel wins.
    pub fn merge(self, other: Self) -> Self {
        if self.is_cancelled() || other.is_cancelled() {
            Self::Cancel
        } else {
            Self::PassThrough
        }
    }
}

/// Session lifecycle notifications published by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    Presented {
        user_id: UserId,
        menu_id: MenuId,
        surface_id: SurfaceId,
    },
    Opened {
        user_id: UserId,
        menu_id: MenuId,
    },
    CloseVetoed {
        user_id: UserId,
        menu_id: MenuId,
        reopen_in_ticks: u64,
    },
    Reopened {
        user_id: UserId,
        menu_id: MenuId,
    },
    Closed {
        user_id: UserId,
        menu_id: MenuId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_event_uses_tagged_snake_case_layout() {
        let user_id = UserId::random();
        let event = HostEvent::Close {
            surface_id: SurfaceId(7),
            user_id,
        };
        let value = serde_json::to_value(&event).expect("json");
        assert_eq!(value["type"], "close");
        assert_eq!(value["payload"]["surface_id"], 7);
        assert_eq!(value["payload"]["user_id"], user_id.0.to_string());
    }

    #[test]
    fn click_without_current_content_omits_field() {
        let event = HostEvent::Click {
            surface_id: SurfaceId(1),
            slot: -999,
            user_id: UserId::random(),
            current: None,
        };
        let value = serde_json::to_value(&event).expect("json");
        assert!(value["payload"].get("current").is_none());

        let parsed: HostEvent = serde_json::from_value(value).expect("parse");
        assert_eq!(parsed, event);
    }

    #[test]
    fn cancel_wins_when_merging_verdicts() {
        assert_eq!(
            EventVerdict::PassThrough.merge(EventVerdict::Cancel),
            EventVerdict::Cancel
        );
        assert_eq!(
            EventVerdict::PassThrough.merge(EventVerdict::PassThrough),
            EventVerdict::PassThrough
        );
    }
}
