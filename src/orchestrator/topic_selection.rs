//! 选题筛选 - 编排层
//!
//! 反复向选题服务拉候选、丢掉重复项，直到凑够数量或轮数封顶。
//! 轮数封顶后带着不足额的选题继续开跑，绝不无限等待

use crate::config::Config;
use crate::error::AppResult;
use crate::models::Topic;
use crate::services::{TopicDeduplicator, TopicGenerator};
use tracing::{info, warn};

/// 为本轮运行筛选选题
///
/// 返回最多 `requested` 个互不重复、且与窗口内历史不重复的选题
pub async fn select_topics(
    config: &Config,
    generator: &TopicGenerator,
    dedup: &TopicDeduplicator,
    requested: usize,
) -> AppResult<Vec<Topic>> {
    let mut accepted: Vec<Topic> = Vec::new();

    for round in 0..config.proposal_rounds.max(1) {
        if accepted.len() >= requested {
            break;
        }

        let proposals = match generator
            .propose(requested - accepted.len(), &config.topic_categories)
            .await
        {
            Ok(proposals) => proposals,
            Err(e) => {
                // 一个选题都还没有时失败是致命的；已有选题则降级继续
                if accepted.is_empty() {
                    return Err(e);
                }
                warn!(
                    "⚠️ 第 {} 轮选题提议失败，带着已有 {} 个选题继续: {}",
                    round + 1,
                    accepted.len(),
                    e
                );
                break;
            }
        };

        for topic in proposals {
            if accepted.len() >= requested {
                break;
            }
            if dedup.is_duplicate(&topic) {
                info!("⤵️ 跳过重复选题: {}", topic.text);
                continue;
            }
            if dedup.collides_with(&topic, &accepted) {
                info!("⤵️ 跳过批内重复选题: {}", topic.text);
                continue;
            }
            accepted.push(topic);
        }
    }

    if accepted.len() < requested {
        warn!(
            "⚠️ 可用选题不足: {}/{} (提议轮数已达上限，按实际数量开跑)",
            accepted.len(),
            requested
        );
    }

    Ok(accepted)
}
