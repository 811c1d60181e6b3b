pub mod direct_flow;
pub mod grouped_flow;
pub mod observer;
pub mod phase;

pub use direct_flow::DirectFlow;
pub use grouped_flow::{group_allocation, GroupedFlow};
pub use observer::{ChannelObserver, RunEvent, RunObserver};
pub use phase::{ChannelProcessor, PhaseCtx, PhaseResult};
