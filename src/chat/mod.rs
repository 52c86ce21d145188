pub mod history;
pub mod message;
pub mod panel;
pub mod stream;

pub use panel::ChatPanel;
