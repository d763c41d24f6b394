use std::path::Path;
use thiserror::Error;

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Field '{field}' not present in record '{name}'")]
    FieldNotFound { name: String, field: String },

    #[error("Invalid rules: {0}")]
    InvalidRules(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 泛化名修复配置
struct NameRepairConfig {
    /// 这些名字没有信息量，需要从路径或描述推导替代名
    generic_names: &'static [&'static str],
    /// 路径推导时跳过的容器目录名
    skip_dirs: &'static [&'static str],
}

impl NameRepairConfig {
    const fn new() -> Self {
        Self {
            generic_names: &["skill", "agent", "readme", "index", "main"],
            skip_dirs: &["skills", "agents", "plugins", ".agents", "components", "cli-tool"],
        }
    }
}

/// 名字是否属于无信息量的泛化名
pub fn is_generic_name(name: &str) -> bool {
    let config = NameRepairConfig::new();
    config
        .generic_names
        .contains(&name.trim().to_lowercase().as_str())
}

/// 修复泛化名
///
/// 优先从来源路径倒序找一个有意义的目录名（跳过 skills/plugins 等容器目录，
/// 取该目录与其父目录拼接），失败则取描述的前几个词。
/// 无法推导时返回 None，调用方保留原名。
pub fn repair_generic_name(
    name: &str,
    source_path: Option<&str>,
    description: Option<&str>,
) -> Option<String> {
    if !is_generic_name(name) {
        return None;
    }

    if let Some(path) = source_path {
        if let Some(derived) = derive_from_path(path) {
            return Some(derived);
        }
    }
    derive_from_description(description.unwrap_or(""))
}

/// 从来源路径推导名字
fn derive_from_path(source_path: &str) -> Option<String> {
    let config = NameRepairConfig::new();
    let normalized = source_path.replace('\\', "/");
    let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }

    // 倒数第二个部件开始向前找（最后一个部件通常是文件名）
    for i in (0..parts.len() - 1).rev() {
        let part = parts[i].to_lowercase();
        if config.skip_dirs.contains(&part.as_str()) {
            continue;
        }

        // 拼上父目录提供上下文
        let mut name_parts = Vec::new();
        for j in i.saturating_sub(1)..=i {
            let p = parts[j].to_lowercase();
            if !config.skip_dirs.contains(&p.as_str()) {
                name_parts.push(p);
            }
        }
        let derived: String = name_parts
            .join("-")
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
            .collect();
        if derived.len() > 2 {
            return Some(derived);
        }
    }
    None
}

/// 从描述前几个词推导名字
fn derive_from_description(description: &str) -> Option<String> {
    let words: Vec<String> = description
        .to_lowercase()
        .split_whitespace()
        .take(3)
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .collect::<String>()
        })
        .filter(|w| w.len() > 2)
        .collect();
    if words.len() >= 2 {
        Some(words.join("-"))
    } else {
        None
    }
}

/// 截断过长的描述
///
/// 超过上限时保留前缀并追加省略号，按字符而非字节截断。
pub fn truncate_description(desc: &str, max_len: usize) -> String {
    if desc.chars().count() <= max_len {
        return desc.to_string();
    }
    let prefix: String = desc.chars().take(max_len.saturating_sub(3)).collect();
    format!("{prefix}...")
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<std::path::PathBuf, CatalogError> {
    if !file_path.exists() {
        return Err(CatalogError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在",
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path).map_err(CatalogError::IoError)?;

    Ok(backup_path)
}
