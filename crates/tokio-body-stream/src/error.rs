//! tokio_body_stream エラー型

use std::fmt;

/// tokio_body_stream エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー (書き込み先のフラッシュ/シャットダウン)
    Io(std::io::Error),
    /// ボディストリームがエラーでクローズされた
    Stream(shiguredo_body_stream::Error),
    /// 読み込みタイムアウト
    Timeout,
    /// 読み込み要求も書き込みもないまま停止した
    Stalled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Stream(e) => write!(f, "body stream error: {}", e),
            Error::Timeout => write!(f, "read timeout"),
            Error::Stalled => write!(f, "body stream stalled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Stream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<shiguredo_body_stream::Error> for Error {
    fn from(e: shiguredo_body_stream::Error) -> Self {
        Error::Stream(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
