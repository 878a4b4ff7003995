use crate::models::style_profile::{builtin_profiles, StyleProfile};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// TOML 风格画像文件的顶层结构
///
/// ```toml
/// [[profiles]]
/// name = "tech_columnist"
/// [profiles.traits]
/// formality = 0.7
/// humor = 0.3
/// technical_depth = 0.9
/// narrative = 0.2
/// brevity = 0.6
/// ```
#[derive(Debug, serde::Deserialize)]
struct StyleCorpus {
    #[serde(default)]
    profiles: Vec<StyleProfile>,
}

/// 从 TOML 文件加载风格画像
pub async fn load_style_profiles(path: &Path) -> Result<Vec<StyleProfile>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取风格画像文件: {}", path.display()))?;

    let corpus: StyleCorpus = toml::from_str(&content)
        .with_context(|| format!("无法解析风格画像文件: {}", path.display()))?;

    Ok(corpus.profiles)
}

/// 加载完整画像库：内置画像 + 自定义文件（同名覆盖内置）
///
/// 文件不存在不算错误，此时只返回内置画像
pub async fn load_profile_corpus(path: &str) -> Result<Vec<StyleProfile>> {
    let mut profiles = builtin_profiles();

    let path = Path::new(path);
    if path.exists() {
        let custom = load_style_profiles(path).await?;
        tracing::info!("✓ 加载了 {} 个自定义风格画像", custom.len());
        for profile in custom {
            if let Some(existing) = profiles.iter_mut().find(|p| p.name == profile.name) {
                *existing = profile;
            } else {
                profiles.push(profile);
            }
        }
    }

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_corpus() {
        let raw = r#"
[[profiles]]
name = "minimalist"

[profiles.traits]
formality = 0.5
humor = 0.2
technical_depth = 0.4
narrative = 0.1
brevity = 0.95
"#;
        let corpus: StyleCorpus = toml::from_str(raw).unwrap();
        assert_eq!(corpus.profiles.len(), 1);
        assert_eq!(corpus.profiles[0].name, "minimalist");
        assert!((corpus.profiles[0].traits.brevity - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_builtin() {
        let profiles = load_profile_corpus("does_not_exist.toml").await.unwrap();
        assert!(profiles.iter().any(|p| p.name == "tech_columnist"));
    }

    #[tokio::test]
    async fn test_custom_profile_overrides_builtin() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[[profiles]]
name = "tech_columnist"

[profiles.traits]
formality = 0.1
humor = 0.1
technical_depth = 0.1
narrative = 0.1
brevity = 0.1
"#
        )
        .unwrap();

        let profiles = load_profile_corpus(file.path().to_str().unwrap())
            .await
            .unwrap();
        let tech = profiles.iter().find(|p| p.name == "tech_columnist").unwrap();
        assert!((tech.traits.formality - 0.1).abs() < 1e-9);
    }
}
