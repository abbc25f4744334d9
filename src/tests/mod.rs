mod common;

mod config_location;
