pub mod children_repo;
pub mod merge_log_repo;
pub mod plant_repo;

pub use children_repo::ChildrenRepo;
pub use merge_log_repo::MergeLogRepo;
pub use plant_repo::PlantRepo;
