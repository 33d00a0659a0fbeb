//! Single-slot notification channel.
//!
//! At most one [`Alert`] is visible. Showing a new one replaces the old one
//! outright; nothing is queued. Every alert carries an [`AlertId`] so that a
//! delayed auto-dismiss only clears the alert it was scheduled for.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub success: bool,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    /// Non-modal; cleared automatically after `after`.
    Toast { after: Duration },
    /// Stays until dismissed.
    Modal,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy::Toast {
            after: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertId(pub u64);

#[derive(Debug, Clone, Default)]
pub struct AlertChannel {
    current: Option<(AlertId, Alert)>,
    next_id: u64,
}

impl AlertChannel {
    pub fn show(&mut self, alert: Alert) -> AlertId {
        self.next_id += 1;
        let id = AlertId(self.next_id);
        self.current = Some((id, alert));
        id
    }

    /// Returns whether an alert was actually removed.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn expire(&mut self, id: AlertId) -> bool {
        if self.current_id() == Some(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref().map(|(_, alert)| alert)
    }

    pub fn current_id(&self) -> Option<AlertId> {
        self.current.as_ref().map(|(id, _)| *id)
    }
}
