//! Document Context - Aggregate Root

use serde::{Deserialize, Serialize};

/// 预览高亮窗口长度（字符）
pub const PREVIEW_WINDOW_CHARS: usize = 50;

/// Document 聚合根
///
/// 不变量:
/// - 文本创建后不可修改，新上传整体替换
/// - 所有偏移量均以字符（Unicode scalar）计，而非字节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    char_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 字符长度
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// 将位置限制在 `[0, len]`
    pub fn clamp(&self, position: usize) -> usize {
        position.min(self.char_len)
    }

    /// 从字符偏移处开始的文本切片
    pub fn slice_from(&self, offset: usize) -> &str {
        &self.text[self.byte_offset(offset)..]
    }

    /// 文本预览：已朗读 / 高亮窗口 / 剩余
    pub fn preview(&self, position: usize) -> (&str, &str, &str) {
        let start = self.byte_offset(position);
        let end = self.byte_offset(position.saturating_add(PREVIEW_WINDOW_CHARS));
        (&self.text[..start], &self.text[start..end], &self.text[end..])
    }

    /// 朗读进度百分比
    pub fn progress_percent(&self, position: usize) -> f32 {
        if self.char_len == 0 {
            return 0.0;
        }
        self.clamp(position) as f32 / self.char_len as f32 * 100.0
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        if char_offset >= self.char_len {
            return self.text.len();
        }
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}
