use std::collections::HashMap;

use crate::model::{Notification, NotificationId};

/// Newest first.
pub fn sorted_notifications(notifications: &HashMap<NotificationId, Notification>) -> Vec<Notification> {
    let mut sorted: Vec<Notification> = notifications.values().cloned().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    sorted
}

pub fn unread_count(notifications: &HashMap<NotificationId, Notification>) -> usize {
    notifications.values().filter(|n| n.unread).count()
}
