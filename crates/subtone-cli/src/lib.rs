pub mod app;
pub mod cli;
pub mod message;

pub use app::Session;
pub use message::Message;
