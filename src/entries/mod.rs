pub mod handlers;
pub mod service;
pub mod store;

pub use service::{DEMO_ENTRY_COUNT, EntriesService};
pub use store::EntryStore;
