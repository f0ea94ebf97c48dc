pub mod canvas;
pub mod thumbnail;
pub mod views;
