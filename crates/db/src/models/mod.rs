pub mod children;
pub mod merge_log;
pub mod plant;
