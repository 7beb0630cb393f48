pub mod commands;
pub mod input;
pub mod progress;
pub mod util;
