//! Outbound delivery: the platform API seam and the adapter that maps
//! activities onto it.

pub mod api;
pub mod delivery;
pub mod error;
pub mod recording;
pub mod retry;
pub mod slack;

pub use api::ChatApi;
pub use delivery::DeliveryAdapter;
pub use error::{ChannelError, Result};
pub use recording::RecordingChatApi;
pub use retry::RetryPolicy;
pub use slack::SlackWebClient;
