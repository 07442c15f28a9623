pub mod config;
pub mod document;
pub mod files;
pub mod icons;
pub mod status;

pub use config::handle_config_command;
pub use document::{handle_pull_command, handle_push_command, handle_show_command};
pub use files::{handle_cat_command, handle_upload_command};
pub use icons::handle_icons_command;
pub use status::handle_verify_command;
