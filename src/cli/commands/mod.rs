pub mod policy;
pub mod train;
