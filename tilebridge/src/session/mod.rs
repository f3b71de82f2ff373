//! Map session lifecycle.
//!
//! [`SessionController`] runs the ordered startup sequence against the
//! external collaborators, owns the protocol registration and the renderer
//! for the life of a session, and tears both down on [`stop`].
//! The renderer reports back through [`RendererEvents`].
//!
//! [`stop`]: SessionController::stop

mod controller;
mod error;
mod events;

pub use controller::{SessionCollaborators, SessionController};
pub use error::InitializationError;
pub use events::RendererEvents;
