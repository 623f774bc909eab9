pub mod data;
pub mod model;
pub mod priority;
pub mod report;

pub use model::{ErrorRecord, ErrorStatus, Priority};

const BANNER: &str = r#"
  _     _       _      ____
 | |   (_)_ __ | | __ |  _ \ ___  ___ _____   _____ _ __ _   _
 | |   | | '_ \| |/ / | |_) / _ \/ __/ _ \ \ / / _ \ '__| | | |
 | |___| | | | |   <  |  _ <  __/ (_| (_) \ V /  __/ |  | |_| |
 |_____|_|_| |_|_|\_\ |_| \_\___|\___\___/ \_/ \___|_|   \__, |
                                                         |___/
"#;

pub fn print_banner() {
    println!("{}", BANNER);
    println!("  404 monitoring and backlink recovery  v{}\n", env!("CARGO_PKG_VERSION"));
}
