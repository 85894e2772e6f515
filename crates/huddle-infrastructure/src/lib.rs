pub mod ai_http;
pub mod config;
pub mod live;
pub mod memory_store;
pub mod telegram;

pub use crate::ai_http::HttpAiResponder;
pub use crate::config::HuddleConfig;
pub use crate::live::BroadcastLiveTransport;
pub use crate::memory_store::InMemoryStore;
pub use crate::telegram::TelegramBotSink;
