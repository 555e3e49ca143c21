pub mod conversation;
pub mod landing;

pub use conversation::ConversationView;
pub use landing::LandingView;
