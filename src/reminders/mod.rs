//! Turning forecasts into reminders, and sending them when due.

pub mod dispatcher;
pub mod notifier;
pub mod scheduler;

pub use dispatcher::{sweep_due, SweepReport};
pub use notifier::{LogNotifier, Notifier};
pub use scheduler::{plan_reminders, reminder_time, replace_pending};
