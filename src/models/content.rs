//! 资料、草稿、评分与配图的数据结构
//!
//! ResearchBundle 在检索完成后不再修改；QualityScore 一经计算不可变；
//! 一个任务可能产生多份 Draft，循环结束后只保留最后一份

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单条核查事实
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFact {
    /// 论断内容
    pub claim: String,
    /// 来源链接（缺失时整个资料包降级为未核实）
    pub source: Option<String>,
    /// 置信度（0-1）
    pub confidence: f64,
    /// 是否有独立第二来源佐证
    pub corroborated: bool,
}

/// 一次任务的资料包
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub topic_id: String,
    pub facts: Vec<ResearchFact>,
    /// 关键词（去重后保持首次出现顺序）
    pub keywords: Vec<String>,
    /// 每条论断都有来源时为 true；否则下游必须收敛措辞
    pub verified: bool,
}

impl ResearchBundle {
    /// 构造空的未核实资料包（检索降级路径）
    pub fn unverified(topic_id: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            facts: Vec::new(),
            keywords,
            verified: false,
        }
    }

    /// 有独立佐证的事实数量
    pub fn corroborated_count(&self) -> usize {
        self.facts.iter().filter(|f| f.corroborated).count()
    }
}

/// 一次起草产出的草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub job_id: String,
    /// 第几稿（从 1 开始）
    pub attempt: u32,
    /// 文章标题
    pub title: String,
    /// 大纲（章节标题列表）
    pub outline: Vec<String>,
    /// 正文（Markdown）
    pub body: String,
    pub word_count: usize,
}

/// 评分项
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criterion {
    /// 事实依据
    FactualGrounding,
    /// 结构完整度（对照大纲）
    Structure,
    /// 风格贴合度
    StyleAdherence,
    /// SEO 合规
    Seo,
    /// 可读性
    Readability,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::FactualGrounding,
        Criterion::Structure,
        Criterion::StyleAdherence,
        Criterion::Seo,
        Criterion::Readability,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::FactualGrounding => "factual_grounding",
            Criterion::Structure => "structure",
            Criterion::StyleAdherence => "style_adherence",
            Criterion::Seo => "seo",
            Criterion::Readability => "readability",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 质量裁决
///
/// 评分服务只产出 Accept / Rewrite；重写次数耗尽后由流程层
/// 把任务整体判为 Rejected（对应 Reject 语义）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accept,
    Rewrite,
    Reject,
}

/// 一次评分结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// 对应第几稿
    pub draft_attempt: u32,
    /// 加权总分（0-100）
    pub total_score: f64,
    /// 各项得分
    pub subscores: BTreeMap<Criterion, f64>,
    pub verdict: Verdict,
}

/// 已选定的配图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub alt_text: String,
    /// 来源署名
    pub source_attribution: String,
    /// 插入位置（第几个章节之后，0 表示文首，选图时避免全部挤在文首）
    pub placement_index: usize,
}
