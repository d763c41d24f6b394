/// IO 抽象层模块
///
/// 该模块提供了文件读写的抽象接口，遵循依赖倒置原则。
/// 支持依赖注入、测试 mock 和替换 IO 实现。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **catalog_io**: 目录文件的默认实现（直接写入与原子写入）
///
/// # 使用示例
///
/// ```rust,ignore
/// use catalog_editor::io::{CatalogReader, DefaultCatalogReader};
///
/// let reader = DefaultCatalogReader;
/// let data = reader.read(Path::new("index.yaml"))?;
/// ```
pub mod catalog_io;
pub mod traits;

// === 导出 trait 定义 ===
pub use traits::{CatalogReader, CatalogWriter, RawCatalogData};

// === 导出默认实现 ===
pub use catalog_io::{AtomicCatalogWriter, DefaultCatalogReader, DefaultCatalogWriter};
