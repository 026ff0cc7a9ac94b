pub mod commands;
pub mod events;
pub mod imaging;
pub mod profiles;
pub mod session;
pub mod views;
