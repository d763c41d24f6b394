/// 目录文件 IO 实现
///
/// 提供基于文件系统的默认读写实现。写入有两种：
/// 直接写入（DefaultCatalogWriter）和原子写入（AtomicCatalogWriter）。
/// 流水线默认使用原子写入，进程中途被杀不会留下半写的目录。
use super::traits::{CatalogReader, CatalogWriter, RawCatalogData};
use crate::utils::CatalogError;
use std::io::Write;
use std::path::Path;

/// 默认的目录文件读取器（基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultCatalogReader;

impl CatalogReader for DefaultCatalogReader {
    fn read(&self, path: &Path) -> Result<RawCatalogData, CatalogError> {
        let bytes = std::fs::read(path)?;
        Ok(RawCatalogData { bytes })
    }
}

/// 默认的目录文件写入器（直接覆盖，基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultCatalogWriter;

impl CatalogWriter for DefaultCatalogWriter {
    fn write(&self, data: &RawCatalogData, path: &Path) -> Result<(), CatalogError> {
        // 确保父目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, &data.bytes)?;
        Ok(())
    }
}

/// 原子目录文件写入器
///
/// 先写入同目录下的临时文件，再重命名到目标路径。
/// 临时文件必须与目标同目录，跨文件系统的 rename 不保证原子性。
#[derive(Debug, Clone, Default)]
pub struct AtomicCatalogWriter;

impl CatalogWriter for AtomicCatalogWriter {
    fn write(&self, data: &RawCatalogData, path: &Path) -> Result<(), CatalogError> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = dir {
            std::fs::create_dir_all(parent)?;
        }

        let mut temp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        temp.write_all(&data.bytes)?;
        temp.flush()?;
        temp.persist(path).map_err(|e| CatalogError::IoError(e.error))?;
        Ok(())
    }
}
