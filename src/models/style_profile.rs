//! 写作风格画像
//!
//! 画像是纯数据记录：若干 0-1 的数值特征。
//! 多个画像按权重做加权平均得到混合特征，与画像存在哪里无关

use serde::{Deserialize, Serialize};

/// 风格特征向量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleTraits {
    /// 正式程度（0 口语 - 1 书面）
    pub formality: f64,
    /// 幽默程度
    pub humor: f64,
    /// 技术深度
    pub technical_depth: f64,
    /// 叙事性（故事化表达）
    pub narrative: f64,
    /// 简洁度（句子长度倾向）
    pub brevity: f64,
}

/// 写作风格画像
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleProfile {
    pub name: String,
    pub traits: StyleTraits,
}

/// 内置画像库
///
/// 自定义画像通过 TOML 文件加载后与内置画像合并（同名覆盖）
pub fn builtin_profiles() -> Vec<StyleProfile> {
    vec![
        StyleProfile {
            name: "tech_columnist".to_string(),
            traits: StyleTraits {
                formality: 0.7,
                humor: 0.3,
                technical_depth: 0.9,
                narrative: 0.2,
                brevity: 0.6,
            },
        },
        StyleProfile {
            name: "storyteller".to_string(),
            traits: StyleTraits {
                formality: 0.4,
                humor: 0.6,
                technical_depth: 0.3,
                narrative: 0.9,
                brevity: 0.3,
            },
        },
        StyleProfile {
            name: "news_editor".to_string(),
            traits: StyleTraits {
                formality: 0.9,
                humor: 0.1,
                technical_depth: 0.5,
                narrative: 0.3,
                brevity: 0.8,
            },
        },
    ]
}

/// 按权重混合多个画像的特征向量
///
/// 纯函数：权重按总和归一化，空输入返回 None
pub fn blend_traits(weighted: &[(StyleTraits, f64)]) -> Option<StyleTraits> {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if weighted.is_empty() || total <= 0.0 {
        return None;
    }
    let mut acc = StyleTraits {
        formality: 0.0,
        humor: 0.0,
        technical_depth: 0.0,
        narrative: 0.0,
        brevity: 0.0,
    };
    for (traits, weight) in weighted {
        let w = weight / total;
        acc.formality += traits.formality * w;
        acc.humor += traits.humor * w;
        acc.technical_depth += traits.technical_depth * w;
        acc.narrative += traits.narrative * w;
        acc.brevity += traits.brevity * w;
    }
    Some(acc)
}

impl StyleTraits {
    /// 把数值特征翻译成给 LLM 的写作指令
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        parts.push(if self.formality >= 0.6 {
            "用书面、专业的语气"
        } else {
            "用轻松、口语化的语气"
        });
        if self.humor >= 0.5 {
            parts.push("适当加入幽默");
        }
        parts.push(if self.technical_depth >= 0.6 {
            "深入技术细节，给出具体例子"
        } else {
            "少讲术语，面向普通读者"
        });
        if self.narrative >= 0.6 {
            parts.push("多用故事和场景引入");
        }
        parts.push(if self.brevity >= 0.6 {
            "句子简短有力"
        } else {
            "允许从容展开的长句"
        });
        parts.join("；")
    }
}
