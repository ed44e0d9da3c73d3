pub mod categories;
pub mod costs;

pub use categories::{handle_categories_command, CategoriesArgs};
pub use costs::{handle_costs_command, CostsArgs};
