use anyhow::{bail, Context};
use catalog_editor::cluster::{deduplicate, load_default_rules, ClusterSet};
use catalog_editor::import::{import_pending, scan_pending_dir, DefaultCategorizer, ImportOptions};
use catalog_editor::io::AtomicCatalogWriter;
use catalog_editor::ops::ConsolidationSpec;
use catalog_editor::{Catalog, CatalogDebugger, CatalogEditor, CATALOG_EXTENSIONS};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "catalog_editor")]
#[command(about = "维护技能/代理目录索引文件：整合、去重、批量导入")]
#[command(version = "0.3.0")]
struct Cli {
    /// 目录索引文件路径
    #[arg(short, long)]
    index: PathBuf,

    /// 输出文件路径（默认原地重写）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 整合模式：应用 JSON 规格列表（更新或插入主条目并重定向被取代条目）
    #[arg(long)]
    consolidate: Option<PathBuf>,

    /// 去重模式：按聚类规则集删除重复条目
    #[arg(long)]
    dedup: bool,

    /// 去重规则 JSON 文件（缺省使用内置规则集）
    #[arg(long)]
    rules: Option<PathBuf>,

    /// 导入模式：批量导入待导入目录中的条目文件
    #[arg(long)]
    import: Option<PathBuf>,

    /// 显示目录统计信息
    #[arg(long)]
    stats: bool,

    /// 测试模式：解析后零修改重写，用于验证解析和重写逻辑
    #[arg(long)]
    test_rebuild: bool,

    /// 对比两个目录文件的结构差异
    #[arg(long)]
    compare: Option<PathBuf>,

    /// 写入前创建带时间戳的备份
    #[arg(long)]
    backup: bool,

    /// 把运行报告写入 JSON 文件
    #[arg(long)]
    report: Option<PathBuf>,

    /// 权威来源路径前缀（整合与去重决胜用）
    #[arg(long, default_value = "IDETOOLS/")]
    source_prefix: String,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    validate_input(&cli.index)?;
    validate_mode(&cli)?;

    if cli.test_rebuild {
        return handle_test_rebuild(&cli);
    }
    if let Some(other) = &cli.compare {
        return handle_comparison(&cli, other);
    }
    if let Some(spec_path) = &cli.consolidate {
        return handle_consolidation(&cli, spec_path);
    }
    if cli.dedup {
        return handle_dedup(&cli);
    }
    if let Some(pending_dir) = &cli.import {
        return handle_import(&cli, pending_dir);
    }

    // 默认模式：统计信息
    handle_stats(&cli)
}

/// 验证输入文件
fn validate_input(index: &Path) -> anyhow::Result<()> {
    if !index.exists() {
        bail!("目录文件不存在: {:?}", index);
    }

    let extension = index
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !CATALOG_EXTENSIONS
        .iter()
        .any(|&ext| Some(ext) == extension.as_deref())
    {
        bail!("目录文件必须是 YAML 文件 (.yaml/.yml)");
    }

    Ok(())
}

/// 验证运行模式（确保只选择一种）
fn validate_mode(cli: &Cli) -> anyhow::Result<()> {
    let mode_count = [
        cli.consolidate.is_some(),
        cli.dedup,
        cli.import.is_some(),
        cli.stats,
        cli.test_rebuild,
        cli.compare.is_some(),
    ]
    .iter()
    .filter(|&&x| x)
    .count();

    if mode_count > 1 {
        bail!("只能选择一种运行模式：--consolidate、--dedup、--import、--stats、--test-rebuild 或 --compare");
    }

    Ok(())
}

/// 加载目录并打印解析告警
fn load_catalog(cli: &Cli) -> anyhow::Result<Catalog> {
    let catalog = Catalog::load(cli.index.clone())
        .with_context(|| format!("解析目录失败: {:?}", cli.index))?;

    if !cli.quiet {
        for warning in &catalog.warnings {
            eprintln!("告警: {}", warning);
        }
    }
    Ok(catalog)
}

/// 保存编辑结果（可选备份，原子写入）
fn save_editor(cli: &Cli, editor: &mut CatalogEditor) -> anyhow::Result<()> {
    if cli.backup {
        let backup_path = catalog_editor::utils::create_backup(&cli.index)?;
        if !cli.quiet {
            println!("已创建备份文件: {:?}", backup_path);
        }
    }

    let output_path = cli.output.clone().unwrap_or_else(|| cli.index.clone());
    let writer = AtomicCatalogWriter;
    editor
        .save(&writer, &output_path)
        .with_context(|| format!("写入目录失败: {:?}", output_path))?;

    if !cli.quiet {
        println!("已写入: {:?}", output_path);
    }
    Ok(())
}

/// 把运行报告序列化为 JSON 文件
fn write_report<T: serde::Serialize>(cli: &Cli, report: &T) -> anyhow::Result<()> {
    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(report_path, json)
            .with_context(|| format!("写入报告失败: {:?}", report_path))?;
        if !cli.quiet {
            println!("报告已写入: {:?}", report_path);
        }
    }
    Ok(())
}

/// 处理统计模式
fn handle_stats(cli: &Cli) -> anyhow::Result<()> {
    let catalog = load_catalog(cli)?;
    println!("{}", catalog.get_stats());
    Ok(())
}

/// 处理整合模式
fn handle_consolidation(cli: &Cli, spec_path: &Path) -> anyhow::Result<()> {
    let specs = ConsolidationSpec::load_list(spec_path)
        .with_context(|| format!("读取整合规格失败: {:?}", spec_path))?;

    if !cli.quiet {
        println!("读取 {} 条整合规格", specs.len());
    }

    let catalog = load_catalog(cli)?;
    let mut editor = CatalogEditor::new(catalog);
    let report = editor.apply_consolidation(&specs, &cli.source_prefix);

    if !cli.quiet {
        println!("{}", report);
    }
    write_report(cli, &report)?;
    save_editor(cli, &mut editor)
}

/// 处理去重模式
fn handle_dedup(cli: &Cli) -> anyhow::Result<()> {
    let rules = match &cli.rules {
        Some(rules_path) => ClusterSet::load(rules_path)
            .with_context(|| format!("读取去重规则失败: {:?}", rules_path))?,
        None => load_default_rules().context("内置去重规则集损坏")?,
    };

    let catalog = load_catalog(cli)?;
    let mut editor = CatalogEditor::new(catalog);
    let summary = deduplicate(&mut editor, &rules);

    if !cli.quiet {
        println!("{}", summary);
    }
    write_report(cli, &summary)?;

    if summary.total_removed() == 0 {
        if !cli.quiet {
            println!("没有可删除的重复条目");
        }
        return Ok(());
    }
    save_editor(cli, &mut editor)
}

/// 处理导入模式
fn handle_import(cli: &Cli, pending_dir: &Path) -> anyhow::Result<()> {
    if !pending_dir.is_dir() {
        bail!("待导入目录不存在: {:?}", pending_dir);
    }

    let (items, failed_files) =
        scan_pending_dir(pending_dir).with_context(|| format!("扫描失败: {:?}", pending_dir))?;
    if !cli.quiet {
        println!("在待导入目录发现 {} 个条目文件", items.len() + failed_files.len());
        for file in &failed_files {
            eprintln!("告警: 无法解析 {}", file);
        }
    }

    let catalog = load_catalog(cli)?;
    let mut editor = CatalogEditor::new(catalog);

    let categorizer = DefaultCategorizer::from_embedded_data().context("内置归类关键字表损坏")?;
    let today = chrono::Local::now().date_naive();
    let mut summary = import_pending(
        &mut editor,
        &items,
        &categorizer,
        &ImportOptions::default(),
        today,
    );
    summary.failed_files = failed_files;

    if !cli.quiet {
        println!("{}", summary);
    }
    write_report(cli, &summary)?;

    if summary.imported_skills == 0 && summary.imported_agents == 0 {
        if !cli.quiet {
            println!("没有可导入的新条目");
        }
        return Ok(());
    }
    save_editor(cli, &mut editor)
}

/// 处理测试重建模式
fn handle_test_rebuild(cli: &Cli) -> anyhow::Result<()> {
    if !cli.quiet {
        println!("测试模式：解析并重写文件 {:?}", cli.index);
    }

    let catalog = load_catalog(cli)?;
    let output_path = get_rebuild_output_path(cli);
    catalog
        .write_to_file(&output_path)
        .with_context(|| format!("写入重建文件失败: {:?}", output_path))?;

    // 重新解析重建文件并对比结构
    let rebuilt = Catalog::load(output_path.clone())?;
    let diffs = CatalogDebugger::compare_structures(&catalog, &rebuilt);

    let original_bytes = std::fs::read(&cli.index)?;
    let rebuilt_bytes = std::fs::read(&output_path)?;

    if !cli.quiet {
        println!("重建文件输出到: {:?}", output_path);
        if original_bytes == rebuilt_bytes {
            println!("✓ 重建文件与原文件逐字节一致");
        } else {
            println!(
                "⚠ 文件大小: 原 {} 字节, 重建 {} 字节",
                original_bytes.len(),
                rebuilt_bytes.len()
            );
        }
        for diff in &diffs {
            println!("  {}", diff);
        }
    }

    if !diffs.is_empty() {
        bail!("重建结构与原文件不一致（{} 处差异）", diffs.len());
    }
    Ok(())
}

/// 处理文件对比模式
fn handle_comparison(cli: &Cli, other: &Path) -> anyhow::Result<()> {
    if !other.exists() {
        bail!("对比文件不存在: {:?}", other);
    }

    let left = load_catalog(cli)?;
    let right = Catalog::load(other.to_path_buf())
        .with_context(|| format!("解析目录失败: {:?}", other))?;

    let diffs = CatalogDebugger::compare_structures(&left, &right);
    if diffs.is_empty() {
        println!("✓ 两个目录结构一致");
    } else {
        println!("发现 {} 处结构差异:", diffs.len());
        for diff in &diffs {
            println!("  - {}", diff);
        }
    }
    Ok(())
}

/// 获取重建输出路径
fn get_rebuild_output_path(cli: &Cli) -> PathBuf {
    cli.output.clone().unwrap_or_else(|| {
        let mut output = cli.index.clone();
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");
        let extension = output
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("yaml");
        output.set_file_name(format!("{stem}_rebuilt.{extension}"));
        output
    })
}
