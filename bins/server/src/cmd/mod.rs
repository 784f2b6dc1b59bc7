pub mod send;
pub mod serve;
