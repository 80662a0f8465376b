pub mod link_store;
pub mod models;
pub mod user_store;

pub use link_store::LinkStore;
pub use models::{Link, LinkBuilder, LinkState, MAX_CLICK_QUOTA, User};
pub use user_store::UserDirectory;
