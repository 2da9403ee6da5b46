pub mod batch;
pub mod work;
