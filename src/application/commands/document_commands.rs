//! Document Commands - 文档相关命令

use crate::application::ports::PdfUpload;

/// 上传 PDF 命令
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDocument {
    pub file: PdfUpload,
}
