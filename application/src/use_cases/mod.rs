//! Use cases

pub mod check_health;
