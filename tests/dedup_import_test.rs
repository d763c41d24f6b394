//! 去重与批量导入的端到端集成测试
//!
//! 在真实文件系统上跑完整流水线：读文件 → 解析 → 编辑 → 原子重写，
//! 再重新解析验证计数器与条目集合。

use catalog_editor::cluster::{deduplicate, load_default_rules, ClusterSet};
use catalog_editor::import::{import_pending, scan_pending_dir, DefaultCategorizer, ImportOptions};
use catalog_editor::io::AtomicCatalogWriter;
use catalog_editor::{Catalog, CatalogEditor, EntryKind};
use chrono::NaiveDate;

const FIXTURE: &str = "\
total_skills: 4
total_agents: 2

# SKILLS
skills:
  - name: testing-patterns
    type: skill
    category: testing
    description: \"Canonical testing guide with patterns\"
    source: IDETOOLS/skills/testing-patterns

  - name: tdd-basics
    type: skill
    category: testing
    description: \"Red green refactor\"
    source: PENDING/tdd-basics

  - name: playwright-e2e
    type: skill
    category: testing
    description: \"Browser automation\"
    source: PENDING/playwright-e2e

  - name: databases
    type: skill
    category: database
    description: \"Database guide\"
    source: IDETOOLS/skills/databases

  # --- godmodedev-new

# AGENTS
agents:
  - name: agent-mesh-coordinator
    type: agent
    category: orchestration
    model: sonnet
    description: \"Mesh topology coordination\"
    source: PENDING/agent-mesh-coordinator

  - name: agent-hierarchical-coordinator
    type: agent
    category: orchestration
    model: sonnet
    description: \"Hierarchical coordination\"
    source: IDETOOLS/agents/agent-hierarchical-coordinator
";

#[test]
fn test_dedup_with_default_rules_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.yaml");
    std::fs::write(&path, FIXTURE).unwrap();

    let catalog = Catalog::load(path.clone()).unwrap();
    let mut editor = CatalogEditor::new(catalog);

    let rules = load_default_rules().unwrap();
    let summary = deduplicate(&mut editor, &rules);

    // testing-master 簇：保留 testing-patterns，删除 tdd-basics 和 playwright-e2e
    let testing = summary
        .clusters
        .iter()
        .find(|c| c.cluster == "testing-master")
        .unwrap();
    assert_eq!(testing.kept.as_deref(), Some("testing-patterns"));
    assert_eq!(testing.removed.len(), 2);

    // agent-coordinator 簇：保留 agent-hierarchical-coordinator
    let coordinator = summary
        .clusters
        .iter()
        .find(|c| c.cluster == "agent-coordinator")
        .unwrap();
    assert_eq!(
        coordinator.kept.as_deref(),
        Some("agent-hierarchical-coordinator")
    );
    assert_eq!(coordinator.removed, vec!["agent-mesh-coordinator".to_string()]);

    editor.save(&AtomicCatalogWriter, &path).unwrap();

    let reloaded = Catalog::load(path).unwrap();
    assert_eq!(reloaded.count_kind(EntryKind::Skill), 2);
    assert_eq!(reloaded.count_kind(EntryKind::Agent), 1);
    assert_eq!(reloaded.recorded_counter(EntryKind::Skill), Some(2));
    assert_eq!(reloaded.recorded_counter(EntryKind::Agent), Some(1));
    assert!(reloaded.find_entry("tdd-basics").is_none());
}

#[test]
fn test_dedup_tiebreak_longest_description_end_to_end() {
    // 保留者名不在候选中：权威来源里描述最长的（40 字符）胜出
    let text = "\
total_skills: 3

skills:
  - name: x-short
    type: skill
    description: \"0123456789\"
    source: IDETOOLS/skills/x-short

  - name: x-long
    type: skill
    description: \"0123456789012345678901234567890123456789\"
    source: IDETOOLS/skills/x-long

  - name: x-mid
    type: skill
    description: \"0123456789012345678901234\"
    source: IDETOOLS/skills/x-mid
";
    let rules = ClusterSet::from_json(
        r#"{
            "authoritative_prefix": "IDETOOLS/",
            "clusters": [
                {"name": "x-cluster", "keep": "x-master", "patterns": ["x-"], "type": "skill"}
            ]
        }"#,
    )
    .unwrap();

    let mut editor = CatalogEditor::new(Catalog::from_text(text));
    let summary = deduplicate(&mut editor, &rules);

    assert_eq!(summary.clusters[0].kept.as_deref(), Some("x-long"));
    assert_eq!(summary.clusters[0].removed.len(), 2);
    assert!(editor.catalog().find_entry("x-long").is_some());
}

#[test]
fn test_import_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = dir.path().join("index.yaml");
    std::fs::write(&index_path, FIXTURE).unwrap();

    let pending_dir = dir.path().join("PENDING");
    std::fs::create_dir(&pending_dir).unwrap();
    std::fs::write(
        pending_dir.join("rag-chroma.yaml"),
        "name: rag-chroma\ntype: skill\ndescription: \"RAG with Chroma vector store\"\n",
    )
    .unwrap();
    std::fs::write(
        pending_dir.join("review-agent.yaml"),
        "name: review-agent\ntype: agent\ndescription: \"Automated code review agent\"\n",
    )
    .unwrap();
    std::fs::write(
        pending_dir.join("dup.yaml"),
        "name: databases\ntype: skill\ndescription: \"Duplicate of existing\"\n",
    )
    .unwrap();
    std::fs::write(pending_dir.join(".last-scan.yaml"), "name: x\ntype: skill\n").unwrap();

    let (items, failed) = scan_pending_dir(&pending_dir).unwrap();
    assert_eq!(items.len(), 3);
    assert!(failed.is_empty());

    let catalog = Catalog::load(index_path.clone()).unwrap();
    let mut editor = CatalogEditor::new(catalog);
    let categorizer = DefaultCategorizer::from_embedded_data().unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

    let summary = import_pending(
        &mut editor,
        &items,
        &categorizer,
        &ImportOptions::default(),
        today,
    );

    assert_eq!(summary.imported_skills, 1);
    assert_eq!(summary.imported_agents, 1);
    assert_eq!(summary.skipped_existing, vec!["databases".to_string()]);

    editor.save(&AtomicCatalogWriter, &index_path).unwrap();

    let reloaded = Catalog::load(index_path).unwrap();
    // 计数器各加 1
    assert_eq!(reloaded.recorded_counter(EntryKind::Skill), Some(5));
    assert_eq!(reloaded.recorded_counter(EntryKind::Agent), Some(3));

    // 新技能插在标记前的技能区，新代理在文件末尾
    let rag = reloaded.find_entry("rag-chroma").unwrap();
    assert_eq!(rag.kind, Some(EntryKind::Skill));
    assert_eq!(rag.category.as_deref(), Some("ai-llm"));
    let marker = reloaded.find_marker("# --- godmodedev-new").unwrap();
    assert!(rag.end_line < marker.line);

    let agent = reloaded.find_entry("review-agent").unwrap();
    assert_eq!(agent.kind, Some(EntryKind::Agent));
    assert_eq!(
        agent.extra,
        vec![("model".to_string(), "sonnet".to_string())]
    );

    // 导入标记带日期
    assert!(reloaded
        .to_text()
        .contains("# --- pending-imports (1) --- Imported 2026-02-01"));
}

#[test]
fn test_consolidation_then_dedup_counters_stay_accurate() {
    use catalog_editor::ops::ConsolidationSpec;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.yaml");
    std::fs::write(&path, FIXTURE).unwrap();

    // 先整合
    let catalog = Catalog::load(path.clone()).unwrap();
    let mut editor = CatalogEditor::new(catalog);
    let specs = vec![ConsolidationSpec {
        name: "testing-master".to_string(),
        replaces: "testing-patterns".to_string(),
        category: "testing".to_string(),
        description: "Comprehensive testing guide".to_string(),
    }];
    let report = editor.apply_consolidation(&specs, "IDETOOLS/");
    assert_eq!(report.added, 1);
    assert_eq!(report.redirected, 1);
    editor.save(&AtomicCatalogWriter, &path).unwrap();

    // 再去重（testing-master 现在是 keep 名之外的条目；规则 keep 的是 testing-patterns）
    let catalog = Catalog::load(path.clone()).unwrap();
    let mut editor = CatalogEditor::new(catalog);
    let rules = load_default_rules().unwrap();
    deduplicate(&mut editor, &rules);
    editor.save(&AtomicCatalogWriter, &path).unwrap();

    let reloaded = Catalog::load(path).unwrap();
    assert_eq!(
        reloaded.recorded_counter(EntryKind::Skill),
        Some(reloaded.count_kind(EntryKind::Skill)),
        "任意操作序列之后计数器必须与实际条目数一致"
    );
}
