pub mod app;
pub mod console;
pub mod controls;
pub mod keyboard;
