use super::rules::ClusterSet;
use crate::utils::CatalogError;

/// 加载内置聚类规则集
///
/// 从内置的 cluster_rules.json 加载默认规则，CLI 未指定 `--rules` 时使用。
///
/// # 返回
/// - `Ok(ClusterSet)`: 校验通过的规则集
/// - `Err`: JSON 解析或正则校验失败
pub fn load_default_rules() -> Result<ClusterSet, CatalogError> {
    let json_data = include_str!("../../data/cluster_rules.json");
    ClusterSet::from_json(json_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::EntryKind;

    #[test]
    fn test_load_default_rules() {
        let rules = load_default_rules();
        assert!(rules.is_ok());

        let rules = rules.unwrap();
        assert_eq!(rules.authoritative_prefix, "IDETOOLS/");

        // 验证一些已知聚类
        let names: Vec<&str> = rules.clusters.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"testing-master"));
        assert!(names.contains(&"database-master"));
        assert!(names.contains(&"agent-coordinator"));
    }

    #[test]
    fn test_default_rules_kinds() {
        let rules = load_default_rules().unwrap();

        let testing = rules
            .clusters
            .iter()
            .find(|c| c.name == "testing-master")
            .unwrap();
        assert_eq!(testing.kind, EntryKind::Skill);
        assert_eq!(testing.keep, "testing-patterns");

        let coordinator = rules
            .clusters
            .iter()
            .find(|c| c.name == "agent-coordinator")
            .unwrap();
        assert_eq!(coordinator.kind, EntryKind::Agent);
    }

    #[test]
    fn test_default_rules_anchored_patterns_compile() {
        // pdf-master 的 ^pdf$ 模式必须按正则精确匹配
        let rules = load_default_rules().unwrap();
        let pdf = rules.clusters.iter().find(|c| c.name == "pdf-master").unwrap();
        assert!(pdf.matches("pdf"));
        assert!(pdf.matches("pdf-anthropic"));
        assert!(!pdf.matches("data-export-pdf-x"));
    }
}
