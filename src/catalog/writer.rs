use super::Catalog;
use crate::datatypes::{split_key_value, EntryKind, UTF8_BOM};
use crate::io::{CatalogWriter, RawCatalogData};
use crate::utils::CatalogError;
use std::path::Path;

impl Catalog {
    /// 重算头部计数器
    ///
    /// 每类条目的计数器重写为当前存活条目数。计数器行按
    /// "头部区域内、零缩进、键名后紧跟冒号"识别，键名拼写保持原样；
    /// 某类计数器行不存在时该类不做改动（与手工目录的宽松约定一致）。
    pub fn update_counters(&mut self) {
        for kind in EntryKind::all() {
            let count = self.count_kind(*kind);
            let key = kind.counter_key();
            for i in 0..self.header_end.min(self.lines.len()) {
                let line = &self.lines[i];
                if line.starts_with(key) && line[key.len()..].trim_start().starts_with(':') {
                    self.lines[i] = format!("{key}: {count}");
                    break;
                }
            }
        }
    }

    /// 读取头部记录的计数器值（未重算前的原值）
    pub fn recorded_counter(&self, kind: EntryKind) -> Option<usize> {
        let key = kind.counter_key();
        self.lines[..self.header_end.min(self.lines.len())]
            .iter()
            .find(|l| l.starts_with(key) && l[key.len()..].trim_start().starts_with(':'))
            .and_then(|l| split_key_value(l.trim()))
            .and_then(|(_, v)| v.trim().parse().ok())
    }

    /// 序列化为文本
    ///
    /// 使用源文件的行终止符连接；行数组保留了末尾空元素，
    /// 因此零修改时输出与输入逐字节一致。
    pub fn to_text(&self) -> String {
        self.lines.join(self.line_ending.as_str())
    }

    /// 序列化为字节（含 BOM 还原）
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_text();
        let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
        if self.bom {
            bytes.extend_from_slice(UTF8_BOM);
        }
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    /// 通过 writer 写入（计数器已由调用方重算）
    pub fn write_with(&self, writer: &dyn CatalogWriter, path: &Path) -> Result<(), CatalogError> {
        let data = RawCatalogData {
            bytes: self.to_bytes(),
        };
        writer.write(&data, path)
    }

    /// 直接写入文件（非原子，测试与工具用；流水线默认走原子 writer）
    pub fn write_to_file(&self, path: &Path) -> Result<(), CatalogError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
total_skills: 99
total_agents: 99

skills:
  - name: a
    type: skill
  - name: b
    type: skill

agents:
  - name: c
    type: agent
";

    #[test]
    fn test_update_counters() {
        let mut catalog = Catalog::from_text(SAMPLE);
        assert_eq!(catalog.recorded_counter(EntryKind::Skill), Some(99));

        catalog.update_counters();
        assert_eq!(catalog.recorded_counter(EntryKind::Skill), Some(2));
        assert_eq!(catalog.recorded_counter(EntryKind::Agent), Some(1));
    }

    #[test]
    fn test_missing_counter_line_untouched() {
        let text = "version: 3\n\nskills:\n  - name: a\n    type: skill\n";
        let mut catalog = Catalog::from_text(text);
        catalog.update_counters();
        // 没有计数器行则头部原样保留
        assert_eq!(catalog.to_text(), text);
    }

    #[test]
    fn test_roundtrip_identity() {
        // 零修改重写必须逐字节一致
        let catalog = Catalog::from_text(SAMPLE);
        assert_eq!(catalog.to_text(), SAMPLE);
    }

    #[test]
    fn test_roundtrip_crlf() {
        let text = "total_skills: 1\r\nskills:\r\n  - name: a\r\n    type: skill\r\n";
        let catalog = Catalog::from_text(text);
        assert_eq!(catalog.to_text(), text);
    }

    #[test]
    fn test_bom_restored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"total_skills: 0\nskills:\n");
        let catalog = Catalog::from_bytes(&bytes, None);
        assert_eq!(catalog.to_bytes(), bytes);
    }

    #[test]
    fn test_counter_not_confused_by_indented_line() {
        // 缩进的同名键不是头部计数器
        let text = "meta:\n  total_skills: 5\ntotal_skills: 5\n\nskills:\n  - name: a\n    type: skill\n";
        let mut catalog = Catalog::from_text(text);
        catalog.update_counters();
        assert!(catalog.to_text().contains("\ntotal_skills: 1\n"));
        assert!(catalog.to_text().contains("  total_skills: 5\n"));
    }
}
