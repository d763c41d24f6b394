/// IO 抽象层 - trait 定义
///
/// 该模块定义了目录文件读写的抽象接口，支持依赖注入和测试 mock。
/// Reader/Writer 只负责字节搬运，不负责解析和序列化。
use crate::utils::CatalogError;
use std::path::Path;

/// 目录文件原始数据
#[derive(Debug, Clone)]
pub struct RawCatalogData {
    /// 文件的原始字节数据（含 BOM，如果有）
    pub bytes: Vec<u8>,
}

/// 目录文件读取 trait
///
/// # 职责
/// - 从文件系统读取目录文件的原始字节数据
/// - 不负责解析，仅负责 IO
pub trait CatalogReader {
    /// 读取目录文件的原始数据
    ///
    /// # 参数
    /// * `path` - 文件路径
    fn read(&self, path: &Path) -> Result<RawCatalogData, CatalogError>;
}

/// 目录文件写入 trait
///
/// # 职责
/// - 将序列化后的数据写入文件系统
/// - 不负责序列化，仅负责 IO
pub trait CatalogWriter {
    /// 写入目录文件数据
    ///
    /// # 参数
    /// * `data` - 要写入的原始数据
    /// * `path` - 目标文件路径
    fn write(&self, data: &RawCatalogData, path: &Path) -> Result<(), CatalogError>;
}
