pub mod bus;
pub mod bus_builder;
pub mod event;
pub mod topic_message;

pub use bus::*;
pub use bus_builder::*;
pub use event::*;
pub use topic_message::*;
