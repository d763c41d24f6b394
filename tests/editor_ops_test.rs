//! 结构化编辑集成测试
//!
//! 覆盖四种编辑操作经过完整"编辑 → 保存 → 重解析"流水线后的性质：
//! 计数器准确性、删除无残留、插入可再解析、重定向幂等。

use catalog_editor::io::AtomicCatalogWriter;
use catalog_editor::{Catalog, CatalogEditor, EntryKind};
use std::path::PathBuf;

const FIXTURE: &str = "\
total_skills: 2
total_agents: 0

skills:
  - name: a
    type: skill
    category: testing
    description: \"First skill\"
    source: IDETOOLS/skills/a

  - name: b
    type: skill
    category: database
    description: \"Second skill\"
    source: PENDING/b
";

fn entry_lines(name: &str) -> Vec<String> {
    vec![
        format!("  - name: {name}"),
        "    type: skill".to_string(),
        "    category: general".to_string(),
        format!("    description: \"Entry {name}\""),
        format!("    source: PENDING/{name}"),
    ]
}

/// 保存到临时文件并重新解析
fn save_and_reload(editor: &mut CatalogEditor) -> Catalog {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.yaml");
    editor.save(&AtomicCatalogWriter, &path).unwrap();
    Catalog::load(PathBuf::from(&path)).unwrap()
}

#[test]
fn test_scenario_insert_then_delete_keeps_counter() {
    // 场景：两个技能 a、b，插入 c 到 a 之后，再删除 b
    // 期望：输出按序包含 a、c，total_skills 仍为 2
    let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
    editor.insert_after("a", &entry_lines("c")).unwrap();
    editor.delete_block("b").unwrap();

    let reloaded = save_and_reload(&mut editor);

    let names: Vec<&str> = reloaded.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"], "输出应按序包含 a、c");
    assert_eq!(reloaded.recorded_counter(EntryKind::Skill), Some(2));
    assert_eq!(reloaded.count_kind(EntryKind::Skill), 2);
}

#[test]
fn test_delete_removes_whole_span_and_decrements_counter() {
    let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
    editor.delete_block("b").unwrap();

    let reloaded = save_and_reload(&mut editor);
    let text = reloaded.to_text();

    // b 原范围内的所有行都不在输出里
    assert!(!text.contains("- name: b"));
    assert!(!text.contains("Second skill"));
    assert!(!text.contains("PENDING/b"));
    // 计数器恰好减 1
    assert_eq!(reloaded.recorded_counter(EntryKind::Skill), Some(1));
}

#[test]
fn test_insert_findable_on_reparse_and_increments_counter() {
    let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
    editor.insert_after("b", &entry_lines("c")).unwrap();

    let reloaded = save_and_reload(&mut editor);

    let c = reloaded.find_entry("c").expect("第二次解析必须能找到 c");
    assert_eq!(c.kind, Some(EntryKind::Skill));
    assert_eq!(c.source.as_deref(), Some("PENDING/c"));
    // 计数器恰好加 1
    assert_eq!(reloaded.recorded_counter(EntryKind::Skill), Some(3));
}

#[test]
fn test_redirect_twice_same_output_as_once() {
    let run = |times: usize| -> String {
        let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
        for _ in 0..times {
            editor
                .redirect_field("b", "source", "IDETOOLS/skills/database-master")
                .unwrap();
        }
        let mut reloaded = save_and_reload(&mut editor);
        reloaded.update_counters();
        reloaded.to_text()
    };

    assert_eq!(run(1), run(2), "重复应用同一重定向必须产生相同输出");
}

#[test]
fn test_update_shrink_through_pipeline() {
    let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
    // 5 行条目换成 2 行
    let short = vec![
        "  - name: a".to_string(),
        "    type: skill".to_string(),
    ];
    editor.update_in_place("a", &short).unwrap();

    let reloaded = save_and_reload(&mut editor);

    // 旧内容的尾行不残留
    let text = reloaded.to_text();
    assert!(!text.contains("First skill"));
    assert!(!text.contains("IDETOOLS/skills/a"));
    // b 完整且可定位
    let b = reloaded.find_entry("b").unwrap();
    assert_eq!(b.description.as_deref(), Some("Second skill"));
    assert_eq!(reloaded.count_kind(EntryKind::Skill), 2);
}

#[test]
fn test_counter_accuracy_after_mixed_ops() {
    let mut editor = CatalogEditor::new(Catalog::from_text(FIXTURE));
    editor.insert_after("a", &entry_lines("c")).unwrap();
    editor.insert_after("c", &entry_lines("d")).unwrap();
    editor.delete_block("a").unwrap();
    editor
        .redirect_field("d", "source", "IDETOOLS/skills/d")
        .unwrap();

    let reloaded = save_and_reload(&mut editor);

    // 任意操作序列之后：头部计数器 == 重解析得到的条目数
    assert_eq!(
        reloaded.recorded_counter(EntryKind::Skill),
        Some(reloaded.count_kind(EntryKind::Skill))
    );
    assert_eq!(reloaded.count_kind(EntryKind::Skill), 3);
}
