/// Severity or category for user-visible notifications.
///
/// This enum classifies notifications by their intent, allowing the UI to
/// display them appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Neutral informational message, e.g. a hint that a click is needed to
    /// start playback.
    Info,
    /// Indicates a non-critical issue, such as an action refused on the
    /// current page.
    Warning,
    /// Indicates a failure, such as a commentary that could not be generated.
    Error,
}

/// A notification payload intended for the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// The type/severity of the notification, determining its visual style.
    pub notification_type: NotificationType,
    /// The text content to display to the user.
    pub message: String,
}

impl NotificationMessage {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}
