pub mod models;
pub mod repositories;

pub use models::Category;
pub use repositories::CategoryRepository;
