//! Controllers MVC

pub mod booking_controller;
pub mod lock_controller;
