pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod library;
pub mod slider;
pub mod stage;
pub mod tasks {
    pub mod animator;
    pub mod console;
    pub mod loader;
    pub mod slider;
}
