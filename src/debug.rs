use crate::catalog::Catalog;
use crate::utils::CatalogError;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// 目录结构调试器
pub struct CatalogDebugger;

impl CatalogDebugger {
    /// 生成详细的目录结构dump
    pub fn dump_structure(catalog: &Catalog, output_path: PathBuf) -> Result<(), CatalogError> {
        let mut output = File::create(output_path)?;

        Self::write_header_info(&mut output, catalog)?;
        Self::write_sections_info(&mut output, catalog)?;
        Self::write_entries_info(&mut output, catalog)?;
        Self::write_warnings_info(&mut output, catalog)?;

        Ok(())
    }

    /// 写入头部信息
    fn write_header_info(output: &mut File, catalog: &Catalog) -> Result<(), CatalogError> {
        writeln!(output, "=== 目录结构dump ===")?;
        writeln!(output, "总行数: {}", catalog.lines.len())?;
        writeln!(output, "头部区域: 0..{}", catalog.header_end)?;
        writeln!(output, "BOM: {}", if catalog.bom { "是" } else { "否" })?;
        writeln!(output)?;
        Ok(())
    }

    /// 写入分区与标记信息
    fn write_sections_info(output: &mut File, catalog: &Catalog) -> Result<(), CatalogError> {
        writeln!(output, "=== 分区 ({}) ===", catalog.sections.len())?;
        for section in &catalog.sections {
            writeln!(output, "  行 {}: [{}] {}", section.line, section.kind, section.title)?;
        }
        writeln!(output)?;

        writeln!(output, "=== 标记注释 ({}) ===", catalog.markers.len())?;
        for marker in &catalog.markers {
            writeln!(output, "  行 {}: {}", marker.line, marker.text)?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// 写入条目信息
    fn write_entries_info(output: &mut File, catalog: &Catalog) -> Result<(), CatalogError> {
        writeln!(output, "=== 条目 ({}) ===", catalog.entries.len())?;
        for entry in &catalog.entries {
            writeln!(
                output,
                "  行 {}-{}: {} [{}] 缩进={}",
                entry.start_line,
                entry.end_line,
                entry.name,
                entry
                    .kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                entry.base_indent,
            )?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// 写入告警信息
    fn write_warnings_info(output: &mut File, catalog: &Catalog) -> Result<(), CatalogError> {
        writeln!(output, "=== 解析告警 ({}) ===", catalog.warnings.len())?;
        for warning in &catalog.warnings {
            writeln!(output, "  {}", warning)?;
        }
        Ok(())
    }

    /// 对比两个目录的结构差异
    ///
    /// 返回人类可读的差异列表（条目增删、计数器不一致、行数变化）。
    /// 两个目录结构一致时返回空列表。
    pub fn compare_structures(left: &Catalog, right: &Catalog) -> Vec<String> {
        let mut diffs = Vec::new();

        if left.lines.len() != right.lines.len() {
            diffs.push(format!(
                "行数不一致: {} vs {}",
                left.lines.len(),
                right.lines.len()
            ));
        }

        let left_names = left.entry_names();
        let right_names = right.entry_names();
        for name in left_names.difference(&right_names) {
            diffs.push(format!("条目仅在左侧: {}", name));
        }
        for name in right_names.difference(&left_names) {
            diffs.push(format!("条目仅在右侧: {}", name));
        }

        for kind in crate::datatypes::EntryKind::all() {
            let (l, r) = (left.count_kind(*kind), right.count_kind(*kind));
            if l != r {
                diffs.push(format!("{} 条目数不一致: {} vs {}", kind, l, r));
            }
        }

        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "total_skills: 1\n\nskills:\n  - name: a\n    type: skill\n";

    #[test]
    fn test_compare_identical() {
        let left = Catalog::from_text(SAMPLE);
        let right = Catalog::from_text(SAMPLE);
        assert!(CatalogDebugger::compare_structures(&left, &right).is_empty());
    }

    #[test]
    fn test_compare_missing_entry() {
        let left = Catalog::from_text(SAMPLE);
        let right = Catalog::from_text("total_skills: 0\n\nskills:\n");
        let diffs = CatalogDebugger::compare_structures(&left, &right);
        assert!(diffs.iter().any(|d| d.contains("仅在左侧: a")));
    }

    #[test]
    fn test_dump_structure() {
        let dir = tempfile::tempdir().unwrap();
        let dump_path = dir.path().join("structure.dump");

        let catalog = Catalog::from_text(SAMPLE);
        CatalogDebugger::dump_structure(&catalog, dump_path.clone()).unwrap();

        let content = std::fs::read_to_string(&dump_path).unwrap();
        assert!(content.contains("=== 条目 (1) ==="));
        assert!(content.contains("a [skill]"));
    }
}
