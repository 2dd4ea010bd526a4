pub mod capture;
pub mod domain;
pub mod export;
pub mod inventory;
pub mod memory;
pub mod ports;
pub mod view;

pub use domain::{
    AuditRecord, Category, ClassificationResult, InventoryItem, ItemDraft, ItemFields, Label,
    Session, User, UserCredentials,
};
pub use inventory::{InventoryError, InventoryResult, InventorySync, Mutation, Snapshot};
pub use memory::InMemoryDatabase;
pub use ports::{DatabaseService, LabelDetectionService, PortError, PortResult};
pub use view::{Page, ViewQuery, PAGE_SIZE};
