pub mod chat;
pub mod dashboard;
pub mod expenses;
pub mod settings;
pub mod tools;
