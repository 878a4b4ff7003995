//! 选题服务 - 业务能力层
//!
//! 只负责"提出候选选题"能力，不关心流程

use crate::error::{AppError, AppResult, GenerationError};
use crate::models::Topic;
use crate::services::LlmService;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

const TOPIC_SYSTEM: &str = "你是一位博客选题编辑，擅长为技术博客挑选读者感兴趣、\
                            角度具体的选题。只输出要求的 JSON，不要附加解释。";

#[derive(Debug, Deserialize)]
struct TopicReply {
    title: String,
    #[serde(default)]
    category: String,
}

/// 选题服务
///
/// 职责：
/// - 按类目提示生成候选选题
/// - 候选数量多于需求，给查重过滤留余量
/// - 不查历史，不做查重
pub struct TopicGenerator {
    llm: LlmService,
}

impl TopicGenerator {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    /// 提议候选选题
    ///
    /// 返回数量约为 `count` 的两倍，过滤后仍不够由调用方再拉一轮
    pub async fn propose(&self, count: usize, category_hints: &[String]) -> AppResult<Vec<Topic>> {
        let want = (count * 2).max(3);
        let categories = if category_hints.is_empty() {
            "不限".to_string()
        } else {
            category_hints.join("、")
        };

        let user_message = format!(
            "请提出 {want} 个博客选题，类目范围：{categories}。\n\
             要求：\n\
             1. 每个选题是一个具体、可写成 1500 字左右文章的标题\n\
             2. 返回 JSON 数组，每项形如 {{\"title\": \"...\", \"category\": \"...\"}}\n\
             3. 只返回 JSON 数组，不要任何其他内容"
        );

        let response = self
            .llm
            .send_to_llm(&user_message, Some(TOPIC_SYSTEM), 0.9, 1024)
            .await?;

        let fallback_category = category_hints.first().map(String::as_str).unwrap_or("通用");
        let topics = parse_topic_response(&response, fallback_category);

        if topics.is_empty() {
            return Err(AppError::Generation(GenerationError::ResponseParseFailed {
                response: response.chars().take(200).collect(),
            }));
        }

        debug!("选题服务产出 {} 个候选", topics.len());
        Ok(topics)
    }
}

/// 解析选题响应
///
/// 先按 JSON 数组解析；失败则退化为按行提取（LLM 偶尔不守格式）
fn parse_topic_response(response: &str, fallback_category: &str) -> Vec<Topic> {
    let cleaned = strip_code_fence(response);

    if let Ok(replies) = serde_json::from_str::<Vec<TopicReply>>(cleaned) {
        return replies
            .into_iter()
            .filter(|r| !r.title.trim().is_empty())
            .map(|r| {
                let category = if r.category.trim().is_empty() {
                    fallback_category.to_string()
                } else {
                    r.category
                };
                Topic::new(r.title.trim(), category)
            })
            .collect();
    }

    warn!("选题响应不是合法 JSON，按行退化解析");

    // 去掉行首的列表标记（- * 1. 等）
    let marker = Regex::new(r"^[\s\-\*\d\.、]+").ok();
    cleaned
        .lines()
        .map(|line| {
            marker
                .as_ref()
                .map(|re| re.replace(line, "").to_string())
                .unwrap_or_else(|| line.to_string())
        })
        .map(|line| line.trim().trim_matches('"').to_string())
        .filter(|line| line.len() >= 6 && !line.starts_with('[') && !line.starts_with(']'))
        .map(|line| Topic::new(line, fallback_category))
        .collect()
}

/// 去掉 Markdown 代码围栏
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let response = r#"[
            {"title": "Rust 异步运行时入门", "category": "技术"},
            {"title": "写好 CLI 的十个细节", "category": ""}
        ]"#;
        let topics = parse_topic_response(response, "通用");
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].category, "技术");
        // 空类目回退到默认
        assert_eq!(topics[1].category, "通用");
    }

    #[test]
    fn test_parse_with_code_fence() {
        let response = "```json\n[{\"title\": \"Rust 异步运行时入门\"}]\n```";
        let topics = parse_topic_response(response, "技术");
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].text, "Rust 异步运行时入门");
    }

    #[test]
    fn test_parse_falls_back_to_lines() {
        let response = "1. Rust 异步运行时入门\n2. 写好 CLI 的十个细节\n";
        let topics = parse_topic_response(response, "技术");
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].text, "写好 CLI 的十个细节");
    }

    #[test]
    fn test_parse_garbage_gives_empty() {
        assert!(parse_topic_response("[]", "技术").is_empty());
    }
}
