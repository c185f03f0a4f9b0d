//! Static voice catalog and default voice selection

use crate::config::SpeechConfig;
use crate::summarizer::contains_cjk;
use crate::types::VoiceInfo;

const CATALOG: &[(&str, &str, &str)] = &[
    ("zh-CN-XiaoxiaoNeural", "晓晓 (女声)", "zh-CN"),
    ("zh-CN-YunxiNeural", "云希 (男声)", "zh-CN"),
    ("zh-CN-YunjianNeural", "云健 (男声)", "zh-CN"),
    ("zh-CN-XiaoyiNeural", "晓伊 (女声)", "zh-CN"),
    ("zh-CN-liaoning-XiaobeiNeural", "晓北 (东北话 - 辽宁)", "zh-CN"),
    ("zh-TW-HsiaoChenNeural", "晓臻 (女声 - 台湾)", "zh-TW"),
    ("zh-HK-HiuMaanNeural", "晓曼 (女声 - 香港)", "zh-HK"),
    ("en-US-AriaNeural", "Aria (Female)", "en-US"),
    ("en-US-GuyNeural", "Guy (Male)", "en-US"),
    ("en-US-JennyNeural", "Jenny (Female)", "en-US"),
    ("en-GB-SoniaNeural", "Sonia (Female - UK)", "en-GB"),
    ("en-AU-NatashaNeural", "Natasha (Female - AU)", "en-AU"),
];

/// The voices offered to clients
pub fn catalog() -> Vec<VoiceInfo> {
    CATALOG
        .iter()
        .map(|(id, name, lang)| VoiceInfo {
            id: id.to_string(),
            name: name.to_string(),
            lang: lang.to_string(),
        })
        .collect()
}

/// Voice to use when the request names none
pub fn default_voice<'a>(narration: &str, config: &'a SpeechConfig) -> &'a str {
    if contains_cjk(narration) {
        &config.default_zh_voice
    } else {
        &config.default_en_voice
    }
}
