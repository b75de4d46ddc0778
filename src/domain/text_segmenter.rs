//! 词边界切分
//!
//! 朗读引擎按词报告进度，这里给出每个词起始处的字符偏移

/// 词边界
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBoundary {
    /// 词起始字符偏移（相对于传入文本）
    pub char_index: usize,
    /// 词长度（字符）
    pub char_len: usize,
}

/// 检查是否为词分隔符
#[inline]
fn is_word_separator(ch: char) -> bool {
    ch.is_whitespace()
}

/// 检查是否为 CJK 字符（逐字朗读，每个字即一个词）
#[inline]
fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}')
}

/// 切分文本为词边界序列
///
/// 规则：
/// 1. 空白分隔词
/// 2. CJK 字符各自成词
/// 3. 结果按 char_index 严格递增
pub fn word_boundaries(text: &str) -> Vec<WordBoundary> {
    let mut words = Vec::new();
    let mut current: Option<WordBoundary> = None;

    for (index, ch) in text.chars().enumerate() {
        if is_word_separator(ch) {
            if let Some(word) = current.take() {
                words.push(word);
            }
            continue;
        }

        if is_cjk(ch) {
            if let Some(word) = current.take() {
                words.push(word);
            }
            words.push(WordBoundary {
                char_index: index,
                char_len: 1,
            });
            continue;
        }

        match current.as_mut() {
            Some(word) => word.char_len += 1,
            None => {
                current = Some(WordBoundary {
                    char_index: index,
                    char_len: 1,
                })
            }
        }
    }

    if let Some(word) = current {
        words.push(word);
    }

    words
}
