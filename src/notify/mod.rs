// Outbound trade notifications
pub mod telegram;

pub use telegram::{run_notifier, TelegramNotifier};
