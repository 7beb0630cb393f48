pub mod predict;
pub mod prep;
pub mod train;
