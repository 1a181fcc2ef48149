//! Command handlers, one module per area.

mod check;
mod init;
mod list;
mod misc;
mod notes;
mod shell;
mod status;
mod transfer;

pub use check::handle_check;
pub use init::handle_init;
pub use list::{handle_list, handle_search};
pub use misc::handle_completions;
pub use notes::{handle_add, handle_edit, handle_rm, handle_show};
pub use shell::handle_shell;
pub use status::handle_status;
pub use transfer::{handle_export, handle_import};
