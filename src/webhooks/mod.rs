pub mod inbound;
pub mod outbound;

pub use inbound::InboundWebhookProcessor;
pub use outbound::OutboundWebhookDispatcher;
