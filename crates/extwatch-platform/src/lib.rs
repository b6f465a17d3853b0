mod commands;
mod dialog;
mod paths;

pub use commands::HideWindow;
pub use dialog::{DialogError, DialogRequest, show_dialog};
pub use paths::{AppPaths, AppPathsError};
