//! Outbound delivery: broadcast, unicast and topic multicast.

mod dispatcher;

pub use dispatcher::{DeliveryResult, DispatcherStats, DispatcherStatsSnapshot, MessageDispatcher};
