pub mod hash;
pub mod spool;
