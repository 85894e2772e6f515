pub mod coordinator;
pub mod fanout;

pub use coordinator::{ChannelCoordinator, ChannelTasks, CoordinatorConfig, NewChannel};
pub use fanout::NotificationFanout;
