pub mod session;

pub use session::{CurrentUser, FlashLevel, FlashMessage};
