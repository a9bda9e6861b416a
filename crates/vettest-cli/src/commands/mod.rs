pub mod history;
pub mod init;
pub mod sample;
pub mod score;
pub mod validate;
