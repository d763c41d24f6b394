use super::Catalog;
use crate::datatypes::EntryKind;

/// 目录统计信息
pub struct CatalogStats {
    pub name: String,
    pub skill_count: usize,
    pub agent_count: usize,
    pub section_count: usize,
    pub marker_count: usize,
    pub warning_count: usize,
    /// 头部记录的计数器原值（可能与实际条目数不一致）
    pub recorded_skills: Option<usize>,
    pub recorded_agents: Option<usize>,
}

impl CatalogStats {
    /// 头部计数器与实际条目数是否一致
    pub fn counters_consistent(&self) -> bool {
        self.recorded_skills.map_or(true, |n| n == self.skill_count)
            && self.recorded_agents.map_or(true, |n| n == self.agent_count)
    }
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 目录统计信息 ===")?;
        writeln!(f, "名称: {}", self.name)?;
        writeln!(f, "技能条目: {}", self.skill_count)?;
        writeln!(f, "代理条目: {}", self.agent_count)?;
        writeln!(f, "分区数: {}", self.section_count)?;
        writeln!(f, "标记注释数: {}", self.marker_count)?;
        writeln!(f, "解析告警数: {}", self.warning_count)?;
        match self.recorded_skills {
            Some(n) => writeln!(f, "头部计数 total_skills: {}", n)?,
            None => writeln!(f, "头部计数 total_skills: 缺失")?,
        }
        match self.recorded_agents {
            Some(n) => writeln!(f, "头部计数 total_agents: {}", n)?,
            None => writeln!(f, "头部计数 total_agents: 缺失")?,
        }
        if !self.counters_consistent() {
            writeln!(f, "⚠ 头部计数与实际条目数不一致")?;
        }
        Ok(())
    }
}

impl Catalog {
    /// 获取统计信息
    pub fn get_stats(&self) -> CatalogStats {
        CatalogStats {
            name: self
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<memory>".to_string()),
            skill_count: self.count_kind(EntryKind::Skill),
            agent_count: self.count_kind(EntryKind::Agent),
            section_count: self.sections.len(),
            marker_count: self.markers.len(),
            warning_count: self.warnings.len(),
            recorded_skills: self.recorded_counter(EntryKind::Skill),
            recorded_agents: self.recorded_counter(EntryKind::Agent),
        }
    }
}
