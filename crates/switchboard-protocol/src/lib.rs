//! Wire types for the chat platform: inbound webhook payloads and the
//! outbound Web API bodies.

pub mod api;
pub mod command;
pub mod envelope;
pub mod error;
pub mod events;
pub mod form;
pub mod interaction;

pub use command::SlashCommand;
pub use envelope::{decode_envelope, DecodedEnvelope, EventCallback, EventEnvelope};
pub use error::{ProtocolError, Result};
pub use events::{EventBody, MessageEvent};
pub use form::{decode_form, InboundForm};
pub use interaction::{InteractionKind, InteractionPayload};
