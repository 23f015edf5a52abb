//! Use-case facade for UI glue.
//!
//! # Responsibility
//! - Combine the scene store and the restart coordinator behind the surface
//!   toolbar buttons, menus and keybindings are wired to.
//! - Apply the report-and-skip failure policy: nothing in here may propagate
//!   a hard fault into the host session.

pub mod scene_service;
