mod role;
mod years;

pub use role::{cmd_role_add, cmd_role_list};
pub use years::cmd_years;
