mod preview;
mod slug;

pub use preview::preview;
pub use slug::slugify;
