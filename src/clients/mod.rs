//! Clientes HTTP hacia servicios externos

pub mod notifier;
