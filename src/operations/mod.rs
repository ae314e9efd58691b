pub mod add;
pub mod find;
pub mod util;

pub use add::add_controller;
pub use add::add_route;
pub use add::set_index_route;
pub use find::find_route;
