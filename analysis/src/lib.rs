//! Projects the events of a CS demo into the flat records of
//! [`common::demo_events::GameEvents`].

pub mod demo;
pub mod events;
pub mod projector;
pub mod rounds;

pub use demo::{parse, ParseError};
pub use projector::{project, Projector};
