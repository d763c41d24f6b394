pub mod catalog;
pub mod cluster;
pub mod datatypes;
pub mod debug;
pub mod editor;
pub mod import;
pub mod io;
pub mod ops;
pub mod record;
pub mod utils;

// 重新导出主要结构
pub use catalog::{Catalog, Marker, ParseWarning, Section};
pub use cluster::{deduplicate, ClusterRule, ClusterSet, DedupSummary};
pub use datatypes::{EntryKind, LineEnding};
pub use debug::CatalogDebugger;
pub use editor::{CatalogEditor, EditDelta};
pub use import::{import_pending, DefaultCategorizer, ImportOptions, ImportSummary, PendingItem};
pub use ops::{ConsolidationSpec, EditOp, EditReport};
pub use record::{Entry, EntryDraft};
pub use utils::CatalogError;

// 常量定义
pub const CATALOG_EXTENSIONS: &[&str] = &["yaml", "yml"];
