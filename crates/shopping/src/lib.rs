mod error;
mod list;

pub use error::ShoppingError;
pub use list::{ShoppingListBuilder, ShoppingListItem};
