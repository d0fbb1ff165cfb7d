pub mod app;
pub mod config;
pub mod input;
pub mod keybinds;
pub mod register;

pub use app::App;
pub use config::Config;
