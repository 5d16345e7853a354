mod handler;
mod message;
mod protocol;

pub use handler::ws_handler;
pub use message::{Control, Header, SocketMessage, PROTOCOL_VERSION, SUBSCRIBE, UNSUBSCRIBE};
pub use protocol::{FrameOutcome, HandlerState, InboundHandler};
