pub mod config;
pub mod tasks;
pub mod test_setup;
pub mod websocket;
