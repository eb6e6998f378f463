use std::fmt;

/// ボディストリームエラー
///
/// ステートマシンが記録し、`Action::Close(Some(..))` として 1 度だけ通知される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 上流 (トランスポート) からの読み込みエラー
    Read(String),
    /// 下流 (書き込み先) への書き込みエラー
    Write(String),
    /// クライアント切断などによるキャンセル
    Cancelled,
    /// バッファ済みバイト数超過
    BufferOverflow { size: usize, limit: usize },
    /// バッファ済みチャンク数超過
    TooManyBufferedChunks { count: usize, limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(msg) => write!(f, "read error: {}", msg),
            Error::Write(msg) => write!(f, "write error: {}", msg),
            Error::Cancelled => write!(f, "stream cancelled"),
            Error::BufferOverflow { size, limit } => {
                write!(f, "buffer overflow: {} > {}", size, limit)
            }
            Error::TooManyBufferedChunks { count, limit } => {
                write!(f, "too many buffered chunks: {} > {}", count, limit)
            }
        }
    }
}

impl std::error::Error for Error {}
