//! 提示词模块
//!
//! 翻译模式使用按 `(style, level)` 索引的固定表；解释模式通过替换生成指令，两者刻意保持不同。

// 本地模块导入
use crate::types::{Level, Mode, Style};

/// 请求对应的指令
pub fn system_instruction(mode: Mode, style: Style, level: Level) -> String {
    match mode {
        Mode::Translate => translation_prompt(style, level).to_string(),
        Mode::Explain => explanation_prompt(style, level),
    }
}

/// 翻译模式指令表
pub fn translation_prompt(style: Style, level: Level) -> &'static str {
    match (style, level) {
        (Style::Hinglish, Level::Balanced) => "You are a translator that converts English text to Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural in Hinglish. Use a balanced mix of Hindi and English words. Only respond with the translated text, no explanations.",
        (Style::Hinglish, Level::MoreHindi) => "You are a translator that converts English text to Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural in Hinglish. Use more Hindi words than English. Only respond with the translated text, no explanations.",
        (Style::Hinglish, Level::MoreEnglish) => "You are a translator that converts English text to Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural in Hinglish. Use more English words than Hindi. Only respond with the translated text, no explanations.",

        (Style::Hindi, Level::Balanced) => "You are a translator that converts English text to Hindi (Devanagari script). Keep the meaning exactly the same but make it sound natural in Hindi. Use a balanced mix of formal and colloquial Hindi. Only respond with the translated text, no explanations.",
        (Style::Hindi, Level::MoreHindi) => "You are a translator that converts English text to Hindi (Devanagari script). Keep the meaning exactly the same but make it sound natural in Hindi. Use more formal Hindi words. Only respond with the translated text, no explanations.",
        (Style::Hindi, Level::MoreEnglish) => "You are a translator that converts English text to Hindi (Devanagari script). Keep the meaning exactly the same but make it sound natural in Hindi. Use more colloquial Hindi words. Only respond with the translated text, no explanations.",

        (Style::Roman, Level::Balanced) => "You are a translator that converts Hindi text to Romanized Hindi (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural. Use a balanced mix of formal and colloquial words. Only respond with the translated text, no explanations.",
        (Style::Roman, Level::MoreHindi) => "You are a translator that converts Hindi text to Romanized Hindi (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural. Use more formal words. Only respond with the translated text, no explanations.",
        (Style::Roman, Level::MoreEnglish) => "You are a translator that converts Hindi text to Romanized Hindi (Hindi written in English letters). Keep the meaning exactly the same but make it sound natural. Use more colloquial words. Only respond with the translated text, no explanations.",

        (Style::Formal, Level::Balanced) => "You are a translator that converts English text to formal Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound professional and formal. Use a balanced mix of Hindi and English words. Only respond with the translated text, no explanations.",
        (Style::Formal, Level::MoreHindi) => "You are a translator that converts English text to formal Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound professional and formal. Use more Hindi words than English. Only respond with the translated text, no explanations.",
        (Style::Formal, Level::MoreEnglish) => "You are a translator that converts English text to formal Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound professional and formal. Use more English words than Hindi. Only respond with the translated text, no explanations.",

        (Style::Casual, Level::Balanced) => "You are a translator that converts English text to casual Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound casual and conversational. Use a balanced mix of Hindi and English words. Only respond with the translated text, no explanations.",
        (Style::Casual, Level::MoreHindi) => "You are a translator that converts English text to casual Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound casual and conversational. Use more Hindi words than English. Only respond with the translated text, no explanations.",
        (Style::Casual, Level::MoreEnglish) => "You are a translator that converts English text to casual Hinglish (Hindi written in English letters). Keep the meaning exactly the same but make it sound casual and conversational. Use more English words than Hindi. Only respond with the translated text, no explanations.",
    }
}

/// 解释模式指令
pub fn explanation_prompt(style: Style, level: Level) -> String {
    let language = if style == Style::Hindi { "Hindi" } else { "Hinglish" };
    let mix = match level {
        Level::MoreHindi => "more Hindi words",
        Level::MoreEnglish => "more English words",
        Level::Balanced => "a balanced mix of Hindi and English words",
    };

    format!(
        "You are an AI assistant that explains concepts in {language}.\n\
         Provide a clear and detailed explanation of the given text.\n\
         Make it easy to understand and use {mix}.\n\
         Format your response in a clear, structured way with bullet points or short paragraphs.\n\
         Only respond with the explanation, no additional text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_translation_table_is_complete_and_distinct() {
        let mut seen = HashSet::new();
        for style in Style::ALL {
            for level in Level::ALL {
                let prompt = translation_prompt(style, level);
                assert!(!prompt.trim().is_empty());
                assert!(seen.insert(prompt), "duplicate prompt for {}/{}", style, level);
            }
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_explanation_prompt_substitution() {
        let hindi = explanation_prompt(Style::Hindi, Level::MoreHindi);
        assert!(hindi.contains("explains concepts in Hindi."));
        assert!(hindi.contains("use more Hindi words."));

        let formal = explanation_prompt(Style::Formal, Level::Balanced);
        assert!(formal.contains("explains concepts in Hinglish."));
        assert!(formal.contains("a balanced mix of Hindi and English words"));
    }

    #[test]
    fn test_system_instruction_routes_by_mode() {
        assert_eq!(
            system_instruction(Mode::Translate, Style::Roman, Level::MoreHindi),
            translation_prompt(Style::Roman, Level::MoreHindi)
        );
        assert_eq!(
            system_instruction(Mode::Explain, Style::Roman, Level::MoreEnglish),
            explanation_prompt(Style::Roman, Level::MoreEnglish)
        );
    }
}
