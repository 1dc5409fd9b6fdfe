//! Seams to the interactive front end. Implementations are only ever called
//! from callbacks drained off the [`UiQueue`](crate::task::UiQueue).

/// Notifications and yes/no questions.
pub trait DialogService: Send + Sync {
    /// Short, non-blocking message for the user.
    fn notify(&self, message: &str);

    /// Asks the user whether to take `action_label`. Returns `true` when
    /// they accept.
    fn confirm(&self, title: &str, message: &str, action_label: &str) -> bool;
}

/// The transient input surface the identifier was typed into.
pub trait Popover: Send + Sync {
    fn hide(&self);
}
