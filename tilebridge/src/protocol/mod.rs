//! Custom resource protocol served to the renderer.
//!
//! The renderer fetches two kinds of resources under a custom URL scheme:
//!
//! - **Descriptor** requests return a [`TileSourceDescriptor`] whose tile
//!   template points back at the same scheme and whose zoom range and bounds
//!   come from the session's [`AggregateDescriptor`](crate::region::AggregateDescriptor).
//! - **Tile** requests carry `<scheme>://<source>/<z>/<x>/<y>` and return the
//!   provider's bytes, or an empty body if the tile is absent.
//!
//! # Architecture
//!
//! ```text
//! Renderer ──► SchemeRegistry::dispatch ──► ResourceProtocolHandler ──► TileProvider
//!                 (by URL scheme)            1. cancelled?
//!                                            2. session initialized?
//!                                            3. parse z/x/y
//! ```

mod address;
mod descriptor;
mod error;
mod handler;
mod registry;

pub use address::TileAddressParser;
pub use descriptor::TileSourceDescriptor;
pub use error::ProtocolError;
pub use handler::{RequestKind, ResourceProtocolHandler, ResourceRequest, ResourceResponse};
pub use registry::{ProtocolRegistration, ProtocolRegistry, RegistryError, SchemeRegistry};
