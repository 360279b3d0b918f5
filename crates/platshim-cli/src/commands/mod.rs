pub mod alias_table;
pub mod check;
pub mod init;
pub mod resolve;
pub mod stub;
