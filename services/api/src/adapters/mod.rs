pub mod db;
pub mod vision;

pub use db::DbAdapter;
pub use vision::VisionAdapter;
