pub mod browser_session_store;
pub mod camera_session_store;

pub use browser_session_store::InMemoryBrowserSessionStore;
pub use camera_session_store::InMemoryCameraSessionStore;
