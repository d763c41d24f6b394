/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口，支持变更追踪和部分成功汇总。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行，需要显式调用保存。
///
/// # 架构设计
///
/// - **catalog_editor**: 目录编辑器，管理 Catalog 的修改状态与行偏移一致性
/// - **delta**: 变更日志，记录已应用与被跳过的操作
///
/// # 使用示例
///
/// ```rust,ignore
/// use catalog_editor::{Catalog, CatalogEditor};
/// use catalog_editor::io::AtomicCatalogWriter;
///
/// // 加载 + 编辑 + 保存工作流
/// let catalog = Catalog::load("index.yaml".into())?;
/// let mut editor = CatalogEditor::new(catalog);
///
/// editor.redirect_field("databases", "source", "IDETOOLS/skills/database-master")?;
/// println!("修改了 {} 处", editor.modified_count());
///
/// let writer = AtomicCatalogWriter;
/// editor.save(&writer, Path::new("index.yaml"))?;
/// ```
pub mod catalog_editor;
pub mod delta;

// === 导出公共接口 ===
pub use catalog_editor::CatalogEditor;
pub use delta::{ChangeRecord, EditDelta};
