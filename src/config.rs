/// 程序配置
///
/// 质量阈值（75 分）和重写上限（3 次）是质量/成本权衡的设计常量，
/// 必须通过配置注入，任何组件不得自行硬编码
#[derive(Clone, Debug)]
pub struct Config {
    // --- 调度配置 ---
    /// 定时触发周期（小时）
    pub cadence_hours: u64,
    /// 同时处理的任务数量
    pub max_parallel_jobs: usize,
    /// 默认每轮发布的文章数
    pub default_post_count: usize,
    /// 单轮运行的总时间预算（秒）
    pub run_timeout_secs: u64,
    /// 触发端点的共享密钥
    pub trigger_token: String,
    /// HTTP 监听地址
    pub listen_addr: String,
    // --- 质量门配置 ---
    /// 质量达标分数线（0-100）
    pub quality_threshold: f64,
    /// 单篇最多起草次数（首稿 + 重写）
    pub max_draft_attempts: u32,
    /// 各评分项权重
    pub score_weights: ScoreWeights,
    // --- 选题查重配置 ---
    /// 查重回溯窗口（天）
    pub dedup_window_days: i64,
    /// 关键词重合度阈值（0-1）
    pub similarity_threshold: f64,
    /// 选题提议轮数上限
    pub proposal_rounds: usize,
    /// 选题类目提示
    pub topic_categories: Vec<String>,
    // --- 资料检索配置 ---
    pub research_max_retries: u32,
    pub research_backoff_ms: u64,
    pub research_timeout_secs: u64,
    pub research_result_limit: usize,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_retries: u32,
    pub llm_backoff_ms: u64,
    // --- 检索 API 配置 ---
    pub search_api_base_url: String,
    pub search_api_key: String,
    // --- 图库 API 配置 ---
    pub image_api_base_url: String,
    pub image_api_key: String,
    /// 每篇文章插入的图片数
    pub images_per_post: usize,
    // --- 发布平台配置 ---
    pub blog_api_base_url: String,
    pub blog_api_token: String,
    // --- 存储配置 ---
    /// 发布历史文件
    pub history_file: String,
    /// 用量台账文件（JSON Lines）
    pub usage_file: String,
    /// 自定义风格画像文件（可选，不存在时只用内置画像）
    pub style_profiles_file: String,
    /// 风格画像混合权重，如 "tech_columnist:0.6,storyteller:0.4"
    pub style_blend: Vec<(String, f64)>,
    // --- 单轮配额 ---
    pub quota_llm_calls: u64,
    pub quota_search_calls: u64,
    pub quota_image_calls: u64,
    pub quota_publish_calls: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

/// 评分项权重
///
/// 组合时按权重和归一化，所以各项不要求加总为 1
#[derive(Clone, Copy, Debug)]
pub struct ScoreWeights {
    pub factual_grounding: f64,
    pub structure: f64,
    pub style_adherence: f64,
    pub seo: f64,
    pub readability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            factual_grounding: 0.25,
            structure: 0.20,
            style_adherence: 0.20,
            seo: 0.15,
            readability: 0.20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cadence_hours: 4,
            max_parallel_jobs: 3,
            default_post_count: 2,
            run_timeout_secs: 1800,
            trigger_token: "local-dev-token".to_string(),
            listen_addr: "0.0.0.0:8700".to_string(),
            quality_threshold: 75.0,
            max_draft_attempts: 3,
            score_weights: ScoreWeights::default(),
            dedup_window_days: 30,
            similarity_threshold: 0.6,
            proposal_rounds: 3,
            topic_categories: vec![
                "技术".to_string(),
                "效率工具".to_string(),
                "人工智能".to_string(),
            ],
            research_max_retries: 3,
            research_backoff_ms: 500,
            research_timeout_secs: 20,
            research_result_limit: 8,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_retries: 3,
            llm_backoff_ms: 800,
            search_api_base_url: "https://api.websearch.example.com/v1".to_string(),
            search_api_key: String::new(),
            image_api_base_url: "https://api.pexels.com/v1".to_string(),
            image_api_key: String::new(),
            images_per_post: 3,
            blog_api_base_url: "https://blog.example.com/api".to_string(),
            blog_api_token: String::new(),
            history_file: "data/history.json".to_string(),
            usage_file: "data/usage_records.jsonl".to_string(),
            style_profiles_file: "styles.toml".to_string(),
            style_blend: vec![
                ("tech_columnist".to_string(), 0.6),
                ("storyteller".to_string(), 0.4),
            ],
            quota_llm_calls: 60,
            quota_search_calls: 30,
            quota_image_calls: 12,
            quota_publish_calls: 6,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            cadence_hours: std::env::var("CADENCE_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cadence_hours),
            max_parallel_jobs: std::env::var("MAX_PARALLEL_JOBS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_parallel_jobs),
            default_post_count: std::env::var("DEFAULT_POST_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_post_count),
            run_timeout_secs: std::env::var("RUN_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.run_timeout_secs),
            trigger_token: std::env::var("TRIGGER_TOKEN").unwrap_or(default.trigger_token),
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(default.listen_addr),
            quality_threshold: std::env::var("QUALITY_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quality_threshold),
            max_draft_attempts: std::env::var("MAX_DRAFT_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_draft_attempts),
            score_weights: default.score_weights,
            dedup_window_days: std::env::var("DEDUP_WINDOW_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dedup_window_days),
            similarity_threshold: std::env::var("SIMILARITY_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.similarity_threshold),
            proposal_rounds: std::env::var("PROPOSAL_ROUNDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.proposal_rounds),
            topic_categories: std::env::var("TOPIC_CATEGORIES").map(|v| parse_comma_list(&v)).unwrap_or(default.topic_categories),
            research_max_retries: std::env::var("RESEARCH_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.research_max_retries),
            research_backoff_ms: std::env::var("RESEARCH_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.research_backoff_ms),
            research_timeout_secs: std::env::var("RESEARCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.research_timeout_secs),
            research_result_limit: std::env::var("RESEARCH_RESULT_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.research_result_limit),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_retries),
            llm_backoff_ms: std::env::var("LLM_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_backoff_ms),
            search_api_base_url: std::env::var("SEARCH_API_BASE_URL").unwrap_or(default.search_api_base_url),
            search_api_key: std::env::var("SEARCH_API_KEY").unwrap_or(default.search_api_key),
            image_api_base_url: std::env::var("IMAGE_API_BASE_URL").unwrap_or(default.image_api_base_url),
            image_api_key: std::env::var("IMAGE_API_KEY").unwrap_or(default.image_api_key),
            images_per_post: std::env::var("IMAGES_PER_POST").ok().and_then(|v| v.parse().ok()).unwrap_or(default.images_per_post),
            blog_api_base_url: std::env::var("BLOG_API_BASE_URL").unwrap_or(default.blog_api_base_url),
            blog_api_token: std::env::var("BLOG_API_TOKEN").unwrap_or(default.blog_api_token),
            history_file: std::env::var("HISTORY_FILE").unwrap_or(default.history_file),
            usage_file: std::env::var("USAGE_FILE").unwrap_or(default.usage_file),
            style_profiles_file: std::env::var("STYLE_PROFILES_FILE").unwrap_or(default.style_profiles_file),
            style_blend: std::env::var("STYLE_BLEND").map(|v| parse_style_blend(&v)).unwrap_or(default.style_blend),
            quota_llm_calls: std::env::var("QUOTA_LLM_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quota_llm_calls),
            quota_search_calls: std::env::var("QUOTA_SEARCH_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quota_search_calls),
            quota_image_calls: std::env::var("QUOTA_IMAGE_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quota_image_calls),
            quota_publish_calls: std::env::var("QUOTA_PUBLISH_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quota_publish_calls),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

/// 解析逗号分隔列表
fn parse_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 解析风格混合权重，格式 "name:weight,name:weight"
///
/// 非法片段直接丢弃；全部非法时返回空列表，由调用方决定兜底
fn parse_style_blend(raw: &str) -> Vec<(String, f64)> {
    raw.split(',')
        .filter_map(|part| {
            let (name, weight) = part.split_once(':')?;
            let weight: f64 = weight.trim().parse().ok()?;
            let name = name.trim();
            if name.is_empty() || weight <= 0.0 {
                return None;
            }
            Some((name.to_string(), weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_blend() {
        let blend = parse_style_blend("tech_columnist:0.6, storyteller:0.4");
        assert_eq!(blend.len(), 2);
        assert_eq!(blend[0].0, "tech_columnist");
        assert!((blend[0].1 - 0.6).abs() < f64::EPSILON);
        assert_eq!(blend[1].0, "storyteller");
    }

    #[test]
    fn test_parse_style_blend_ignores_invalid() {
        let blend = parse_style_blend("a:0.5,bad,empty:,c:-1,d:0.2");
        assert_eq!(blend.len(), 2);
        assert_eq!(blend[0].0, "a");
        assert_eq!(blend[1].0, "d");
    }

    #[test]
    fn test_parse_comma_list() {
        assert_eq!(parse_comma_list("技术, 效率工具 ,"), vec!["技术", "效率工具"]);
    }

    #[test]
    fn test_default_quality_gate() {
        let config = Config::default();
        assert!((config.quality_threshold - 75.0).abs() < f64::EPSILON);
        assert_eq!(config.max_draft_attempts, 3);
    }
}
