//! 评分服务 - 业务能力层
//!
//! 只负责"给一稿打分"能力，不关心流程
//!
//! 五个评分项由一次 LLM 评审调用给出，总分是配置权重的加权和。
//! 裁决只有 Accept / Rewrite 两种：达标线来自配置（默认 75），
//! 重写次数耗尽后把任务判为 Rejected 是流程层的事

use crate::config::ScoreWeights;
use crate::error::AppResult;
use crate::models::{Criterion, Draft, QualityScore, ResearchBundle, Verdict};
use crate::services::LlmService;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const SCORER_SYSTEM: &str = "你是一位严格的博客主编，负责按评分细则给稿件打分。\
                             只输出要求的 JSON 对象，不要附加评语。";

/// 无佐证事实时事实依据分的上限
const UNGROUNDED_FACTUAL_CAP: f64 = 40.0;

/// 评分服务
pub struct QualityScorer {
    llm: LlmService,
    weights: ScoreWeights,
    threshold: f64,
}

impl QualityScorer {
    pub fn new(llm: LlmService, weights: ScoreWeights, threshold: f64) -> Self {
        Self {
            llm,
            weights,
            threshold,
        }
    }

    /// 给一稿打分
    pub async fn score(&self, draft: &Draft, bundle: &ResearchBundle) -> AppResult<QualityScore> {
        let prompt = self.build_score_prompt(draft, bundle);
        let response = self
            .llm
            .send_to_llm(&prompt, Some(SCORER_SYSTEM), 0.2, 512)
            .await?;

        let mut subscores = parse_score_response(&response);

        // 资料没有任何独立佐证时，事实依据分封顶：
        // 这不是惩罚，而是让"无据可依"的稿子可预期地过不了质量门
        if bundle.corroborated_count() == 0 {
            if let Some(value) = subscores.get_mut(&Criterion::FactualGrounding) {
                *value = value.min(UNGROUNDED_FACTUAL_CAP);
            }
        }

        let total_score = combine(&subscores, &self.weights);
        let verdict = verdict_for(total_score, self.threshold);
        debug!(
            "第 {} 稿评分: {:.1} → {:?}",
            draft.attempt, total_score, verdict
        );

        Ok(QualityScore {
            draft_attempt: draft.attempt,
            total_score,
            subscores,
            verdict,
        })
    }

    fn build_score_prompt(&self, draft: &Draft, bundle: &ResearchBundle) -> String {
        let mut prompt = format!(
            "请按以下细则给稿件逐项打分（每项 0-100 的整数）：\n\
             - factual_grounding: 事实依据，论断是否有参考资料支撑\n\
             - structure: 结构完整度，是否覆盖了大纲的全部章节\n\
             - style_adherence: 风格贴合度，语气是否统一\n\
             - seo: 标题与关键词使用是否利于搜索\n\
             - readability: 可读性，段落与句子是否流畅\n\n\
             返回 JSON 对象，形如 {{\"factual_grounding\": 80, \"structure\": 75, \
             \"style_adherence\": 70, \"seo\": 65, \"readability\": 85}}\n\n\
             稿件标题：{}\n大纲：{}\n",
            draft.title,
            draft.outline.join(" / ")
        );
        if !bundle.keywords.is_empty() {
            prompt.push_str(&format!("目标关键词：{}\n", bundle.keywords.join("、")));
        }
        prompt.push_str(&format!("\n正文：\n{}\n", draft.body));
        prompt
    }
}

/// 加权合成总分（按权重和归一化，结果限制在 0-100）
pub fn combine(subscores: &BTreeMap<Criterion, f64>, weights: &ScoreWeights) -> f64 {
    let weight_of = |criterion: Criterion| match criterion {
        Criterion::FactualGrounding => weights.factual_grounding,
        Criterion::Structure => weights.structure,
        Criterion::StyleAdherence => weights.style_adherence,
        Criterion::Seo => weights.seo,
        Criterion::Readability => weights.readability,
    };

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (criterion, value) in subscores {
        let weight = weight_of(*criterion);
        total += value.clamp(0.0, 100.0) * weight;
        weight_sum += weight;
    }
    if weight_sum <= 0.0 {
        return 0.0;
    }
    (total / weight_sum).clamp(0.0, 100.0)
}

/// 裁决规则：达标线以上接受，否则重写
pub fn verdict_for(total_score: f64, threshold: f64) -> Verdict {
    if total_score >= threshold {
        Verdict::Accept
    } else {
        Verdict::Rewrite
    }
}

/// 解析评分响应
///
/// 先按 JSON 对象解析；失败则逐项正则提取；仍然拿不到的项
/// 用保守的 50 分兜底（宁可多重写一稿，不让坏响应把稿子放行）
pub fn parse_score_response(response: &str) -> BTreeMap<Criterion, f64> {
    let cleaned = strip_code_fence(response);

    if let Ok(parsed) = serde_json::from_str::<BTreeMap<String, f64>>(cleaned) {
        let mut subscores = BTreeMap::new();
        for criterion in Criterion::ALL {
            if let Some(value) = parsed.get(criterion.as_str()) {
                subscores.insert(criterion, value.clamp(0.0, 100.0));
            }
        }
        if !subscores.is_empty() {
            for criterion in Criterion::ALL {
                subscores.entry(criterion).or_insert(50.0);
            }
            return subscores;
        }
    }

    warn!("评分响应不是合法 JSON，逐项退化提取");

    let mut subscores = BTreeMap::new();
    for criterion in Criterion::ALL {
        let pattern = format!(
            r#""?{}"?\s*[:：]\s*([0-9]+(?:\.[0-9]+)?)"#,
            criterion.as_str()
        );
        let value = Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(cleaned).map(|c| c[1].to_string()))
            .and_then(|m| m.parse::<f64>().ok());
        match value {
            Some(v) => {
                subscores.insert(criterion, v.clamp(0.0, 100.0));
            }
            None => {
                warn!("评分项 {} 缺失，使用保守默认 50 分", criterion);
                subscores.insert(criterion, 50.0);
            }
        }
    }
    subscores
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

    fn uniform(value: f64) -> BTreeMap<Criterion, f64> {
        Criterion::ALL.iter().map(|c| (*c, value)).collect()
    }

    #[test]
    fn test_combine_uniform_scores() {
        let weights = ScoreWeights::default();
        assert!((combine(&uniform(80.0), &weights) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_combine_weights_matter() {
        let weights = ScoreWeights {
            factual_grounding: 1.0,
            structure: 0.0,
            style_adherence: 0.0,
            seo: 0.0,
            readability: 0.0,
        };
        let mut subscores = uniform(90.0);
        subscores.insert(Criterion::FactualGrounding, 30.0);
        assert!((combine(&subscores, &weights) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_verdict_threshold_boundary() {
        assert_eq!(verdict_for(75.0, 75.0), Verdict::Accept);
        assert_eq!(verdict_for(74.9, 75.0), Verdict::Rewrite);
        assert_eq!(verdict_for(100.0, 75.0), Verdict::Accept);
    }

    #[test]
    fn test_parse_strict_json() {
        let response = r#"{"factual_grounding": 80, "structure": 75, "style_adherence": 70, "seo": 65, "readability": 85}"#;
        let subscores = parse_score_response(response);
        assert_eq!(subscores[&Criterion::FactualGrounding], 80.0);
        assert_eq!(subscores[&Criterion::Seo], 65.0);
    }

    #[test]
    fn test_parse_json_with_fence_and_missing_item() {
        let response = "```json\n{\"factual_grounding\": 80, \"structure\": 75}\n```";
        let subscores = parse_score_response(response);
        assert_eq!(subscores.len(), 5);
        assert_eq!(subscores[&Criterion::Structure], 75.0);
        // 缺失项兜底 50
        assert_eq!(subscores[&Criterion::Readability], 50.0);
    }

    #[test]
    fn test_parse_prose_response() {
        let response = "我的评分：factual_grounding: 88, structure: 72。其余无法判断。";
        let subscores = parse_score_response(response);
        assert_eq!(subscores[&Criterion::FactualGrounding], 88.0);
        assert_eq!(subscores[&Criterion::Structure], 72.0);
        assert_eq!(subscores[&Criterion::StyleAdherence], 50.0);
    }

    #[test]
    fn test_parse_garbage_defaults_conservative() {
        let subscores = parse_score_response("完全不是评分");
        assert!(subscores.values().all(|v| (*v - 50.0).abs() < 1e-9));
        // 默认分在 75 分线之下，坏响应不会放行稿件
        assert_eq!(
            verdict_for(combine(&subscores, &ScoreWeights::default()), 75.0),
            Verdict::Rewrite
        );
    }

    #[test]
    fn test_scores_clamped_to_range() {
        let response = r#"{"factual_grounding": 150, "structure": -20}"#;
        let subscores = parse_score_response(response);
        assert_eq!(subscores[&Criterion::FactualGrounding], 100.0);
        assert_eq!(subscores[&Criterion::Structure], 0.0);
    }
}
