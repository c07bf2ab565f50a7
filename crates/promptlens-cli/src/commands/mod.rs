pub mod balance;
pub mod generate;
pub mod history;
pub mod saved;
pub mod utils;
