//! Cross-context messaging
//!
//! JSON request/reply channels between the scan context, the privileged
//! relay and the control surface.

mod bus;
mod relay_client;
mod tabs;

pub use bus::{Endpoint, Incoming, Mailbox, channel, serve};
pub use relay_client::BusRelayClient;
pub use tabs::TabRegistry;
