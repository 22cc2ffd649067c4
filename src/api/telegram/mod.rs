pub mod bot;

pub use bot::TelegramNotifier;
