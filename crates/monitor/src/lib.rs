pub mod journal;
pub mod notify;

pub use journal::CsvJournal;
pub use notify::{NullNotifier, TelegramNotifier};
