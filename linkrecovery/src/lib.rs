pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{crawl_records, expand_path, parse_format, server_config_from_args};
