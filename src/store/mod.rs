pub mod bootstrap;
pub mod history_table;

pub use bootstrap::{load_bootstrap, parse_timestamp, read_bootstrap, BootstrapLoad};
pub use history_table::{
    load_history_table, read_history_table, save_history_table, write_history_table,
};
