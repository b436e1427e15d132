//! Gavel - Multi-user roleplay server core
//!
//! Operator console and the server subsystems it drives: account storage,
//! role resolution, and the live area/client rosters.

/// Named areas and their message log buffers
pub mod area;
/// Connected clients and the player roster
pub mod client;
/// Server configuration
pub mod config;
/// Operator command console
pub mod console;
/// Roles and permission bits
pub mod permissions;
/// Persistent user accounts
pub mod users;
