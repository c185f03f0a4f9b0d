//! Language detection and prompt text

use crate::scraper::html::truncate_chars;

/// Characters inspected for language detection
pub const DETECTION_WINDOW: usize = 1_000;

/// Narration language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Chinese prompt, Chinese answer
    Chinese,
    /// English prompt, English answer
    English,
}

impl Language {
    /// Chinese if any CJK ideograph appears in the first [`DETECTION_WINDOW`] chars
    pub fn detect(text: &str) -> Self {
        if text.chars().take(DETECTION_WINDOW).any(is_cjk) {
            Language::Chinese
        } else {
            Language::English
        }
    }

    /// System message for the chat request
    pub fn system_message(&self) -> &'static str {
        match self {
            Language::Chinese => "你是一个专门负责网页内容摘要的助手。",
            Language::English => "You are a helpful assistant that summarizes web content.",
        }
    }
}

/// CJK Unified Ideographs block
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Whether `text` contains any CJK ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Build the user prompt
pub fn build_prompt(
    language: Language,
    text: &str,
    chapters: &[String],
    word_count: u32,
    max_chars: usize,
) -> String {
    let content = truncate_chars(text, max_chars);
    let focus = chapter_context(language, chapters);

    match language {
        Language::Chinese => format!(
            "你是一位专业的文案编辑。\n\
             分析以下网页内容，并创作一篇约 {word_count} 字的文章，适用于视频旁白。\n\
             {focus}\
             要求：\n\
             1) 按章节/部分组织内容，并带有清晰的标题。\n\
             2) 对于每个章节：总结核心观点，并加入合理的扩充/背景知识以提高可读性。\n\
             3) 输出适合口播的文案，语气自然、流畅。\n\
             4) 必须使用中文回答。\n\n\
             内容：\n{content}\n"
        ),
        Language::English => format!(
            "You are a professional content editor.\n\
             Analyze the following web content and produce an approximately {word_count}-word article suitable for video narration.\n\
             {focus}\
             Requirements:\n\
             1) Organize content by chapters/sections with clear headings.\n\
             2) For each chapter: summarize the core points and add reasonable expansions/background to improve readability.\n\
             3) Output narration-friendly text, natural and smooth.\n\
             4) Respond in English.\n\n\
             Content:\n{content}\n"
        ),
    }
}

fn chapter_context(language: Language, chapters: &[String]) -> String {
    if chapters.is_empty() {
        return String::new();
    }
    let header = match language {
        Language::Chinese => "用户选择了以下章节/主题进行重点分析：",
        Language::English => "The user has selected the following chapters/topics to focus on:",
    };
    let list: Vec<String> = chapters.iter().map(|c| format!("- {c}")).collect();
    format!("{header}\n{}\n\n", list.join("\n"))
}

/// Narration used when no API key is configured
pub fn placeholder_narration(language: Language, word_count: u32) -> String {
    match language {
        Language::Chinese => format!(
            "这是一个模拟摘要：当前未配置 API Key，因此未调用 AI。配置后会根据网页内容按章节生成约 {word_count} 字文章，并做适度扩展。"
        ),
        Language::English => format!(
            "This is a mock summary: API Key not configured. AI will generate a ~{word_count} word article based on web content after configuration."
        ),
    }
}

/// Narration used when the backend call fails
pub fn failure_narration(text: &str) -> String {
    format!(
        "AI Analysis failed. Original text preview: {}...",
        truncate_chars(text, 500)
    )
}

/// Token budget for a requested word count
pub fn max_tokens(word_count: u32) -> u32 {
    word_count.saturating_mul(2).max(2000)
}
