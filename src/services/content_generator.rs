//! 成稿服务 - 业务能力层
//!
//! 只负责"按资料和风格写出一稿"能力，不关心流程
//!
//! 一稿由两次独立的 LLM 调用组成：大纲、正文。
//! 风格画像在构造时按权重混合成一个特征向量，逐稿复用；
//! 上一稿的评分作为纠错反馈注入下一稿的生成上下文

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{
    blend_traits, Draft, QualityScore, ResearchBundle, StyleProfile, StyleTraits, Topic,
};
use crate::services::LlmService;
use regex::Regex;
use tracing::debug;

const OUTLINE_SYSTEM: &str = "你是一位博客主编，负责为选题拟定文章标题和大纲。\
                              第一行输出文章标题，随后每行一个章节标题，不要编号，不要解释。";

/// 成稿服务
pub struct ContentGenerator {
    llm: LlmService,
    traits: StyleTraits,
}

impl ContentGenerator {
    /// 创建成稿服务
    ///
    /// 按配置把若干风格画像加权混合；引用了不存在的画像名直接报配置错误
    pub fn new(
        config: &Config,
        llm: LlmService,
        profiles: &[StyleProfile],
    ) -> AppResult<Self> {
        let mut weighted = Vec::new();
        for (name, weight) in &config.style_blend {
            let profile = profiles
                .iter()
                .find(|p| &p.name == name)
                .ok_or_else(|| {
                    AppError::Config(ConfigError::ProfileNotFound { name: name.clone() })
                })?;
            weighted.push((profile.traits, *weight));
        }

        // 配置没给混合权重时用第一个内置画像兜底
        let traits = blend_traits(&weighted)
            .or_else(|| profiles.first().map(|p| p.traits))
            .ok_or_else(|| AppError::Other("风格画像库为空".to_string()))?;

        Ok(Self { llm, traits })
    }

    /// 生成一稿
    ///
    /// # 参数
    /// - `attempt`: 第几稿（从 1 开始）
    /// - `feedback`: 上一稿的评分（重写时注入，首稿为 None）
    pub async fn generate(
        &self,
        topic: &Topic,
        bundle: &ResearchBundle,
        job_id: &str,
        attempt: u32,
        feedback: Option<&QualityScore>,
    ) -> AppResult<Draft> {
        // ========== ① 大纲 ==========
        let outline_prompt = self.build_outline_prompt(topic, bundle);
        let outline_raw = self
            .llm
            .send_to_llm(&outline_prompt, Some(OUTLINE_SYSTEM), 0.7, 512)
            .await?;
        let (title, outline) = parse_outline(&outline_raw, &topic.text);
        debug!("大纲完成: {} ({} 个章节)", title, outline.len());

        // ========== ② 正文 ==========
        let style_system = format!(
            "你是一位博客作者。写作风格要求：{}。输出 Markdown，章节用二级标题（##）。",
            self.traits.describe()
        );
        let body_prompt = self.build_body_prompt(topic, bundle, &title, &outline, feedback);
        let body = self
            .llm
            .send_to_llm(&body_prompt, Some(&style_system), 0.8, 4096)
            .await?;

        let word_count = body.split_whitespace().count();
        debug!("正文完成: 约 {} 词", word_count);

        Ok(Draft {
            job_id: job_id.to_string(),
            attempt,
            title,
            outline,
            body,
            word_count,
        })
    }

    fn build_outline_prompt(&self, topic: &Topic, bundle: &ResearchBundle) -> String {
        format!(
            "选题：{}\n类目：{}\n可用关键词：{}\n请拟定文章标题和 4-6 个章节的大纲。",
            topic.text,
            topic.category,
            bundle.keywords.join("、")
        )
    }

    fn build_body_prompt(
        &self,
        topic: &Topic,
        bundle: &ResearchBundle,
        title: &str,
        outline: &[String],
        feedback: Option<&QualityScore>,
    ) -> String {
        let mut prompt = format!("请按以下标题和大纲写一篇完整博客正文。\n标题：{}\n大纲：\n", title);
        for section in outline {
            prompt.push_str(&format!("- {}\n", section));
        }

        if bundle.facts.is_empty() {
            prompt.push_str("\n没有核实过的参考资料，不要编造具体数字和出处。\n");
        } else {
            prompt.push_str("\n参考资料（写作时依据这些事实，标注来源）：\n");
            for fact in &bundle.facts {
                let source = fact.source.as_deref().unwrap_or("无来源");
                prompt.push_str(&format!(
                    "- {} (来源: {}, 置信度: {:.1})\n",
                    fact.claim, source, fact.confidence
                ));
            }
        }

        // 未核实资料：强制收敛措辞
        if !bundle.verified {
            prompt.push_str(
                "\n注意：以上资料未经独立核实，涉及事实的表述要使用\
                 \"据报道\"\"可能\"等审慎措辞，不要给出未经证实的具体数据。\n",
            );
        }

        // 上一稿的评分反馈
        if let Some(score) = feedback {
            prompt.push_str(&format!(
                "\n上一稿总分 {:.0}，未达标。各项得分：\n",
                score.total_score
            ));
            for (criterion, value) in &score.subscores {
                prompt.push_str(&format!("- {}: {:.0}\n", criterion, value));
            }
            prompt.push_str("请重写全文，重点改进低分项。\n");
        }

        prompt.push_str(&format!("\n选题类目：{}，目标读者：博客订阅者。", topic.category));
        prompt
    }
}

/// 解析大纲响应：第一行是标题，其余行是章节
///
/// 行首的列表标记和编号一律剥掉；响应完全不可用时回退到选题标题
pub fn parse_outline(raw: &str, fallback_title: &str) -> (String, Vec<String>) {
    let marker = Regex::new(r"^[\s\-\*#\d\.、]+").ok();
    let mut lines = raw
        .lines()
        .map(|line| {
            marker
                .as_ref()
                .map(|re| re.replace(line, "").to_string())
                .unwrap_or_else(|| line.to_string())
        })
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty());

    let title = lines
        .next()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string());
    let outline: Vec<String> = lines.take(8).collect();
    (title, outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outline_splits_title_and_sections() {
        let raw = "Rust 异步运行时入门\n- 为什么需要异步\n- Tokio 的核心概念\n- 实战示例\n";
        let (title, outline) = parse_outline(raw, "fallback");
        assert_eq!(title, "Rust 异步运行时入门");
        assert_eq!(outline.len(), 3);
        assert_eq!(outline[1], "Tokio 的核心概念");
    }

    #[test]
    fn test_parse_outline_strips_numbering() {
        let raw = "## 标题行\n1. 第一节\n2. 第二节";
        let (title, outline) = parse_outline(raw, "fallback");
        assert_eq!(title, "标题行");
        assert_eq!(outline, vec!["第一节", "第二节"]);
    }

    #[test]
    fn test_parse_outline_empty_falls_back() {
        let (title, outline) = parse_outline("", "选题标题");
        assert_eq!(title, "选题标题");
        assert!(outline.is_empty());
    }
}
