//! ボディのポンプ
//!
//! 上流の `AsyncRead` から読み込んだチャンクを [`BodyStreamState`] に渡し、
//! 返ってきたアクションに従って下流の `AsyncWrite` へ書き込む。
//!
//! - 上流からの読み込みは `call_read` が返されたときだけ行う
//! - 書き込みは常に 1 つずつ完了を待つ
//! - 書き込みを開始するたびに下流の準備完了 (`ReadRequested`) を通知する
//!
//! ## 使い方
//!
//! ```ignore
//! use std::time::Duration;
//! use tokio_body_stream::{PumpConfig, pump};
//!
//! let config = PumpConfig::new()
//!     .read_buffer_size(16 * 1024)
//!     .read_timeout(Duration::from_secs(30));
//! let written = pump(&mut upstream, &mut downstream, &config).await?;
//! ```

use std::time::Duration;

use shiguredo_body_stream::{
    Action, BodyStreamLimits, BodyStreamState, Error as StreamError, Event, Step,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::error::Elapsed;

use crate::error::{Error, Result};

/// ポンプ設定
#[derive(Debug, Clone)]
pub struct PumpConfig {
    read_buffer_size: usize,
    read_timeout: Option<Duration>,
    limits: BodyStreamLimits,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 8192,
            read_timeout: None,
            limits: BodyStreamLimits::default(),
        }
    }
}

impl PumpConfig {
    /// デフォルト設定で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1 回の読み込みで確保するバッファサイズを設定
    ///
    /// 0 を指定した場合は 1 として扱う。
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// 上流の読み込みタイムアウトを設定
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// ステートマシンの制限を設定
    pub fn limits(mut self, limits: BodyStreamLimits) -> Self {
        self.limits = limits;
        self
    }

    /// バッファサイズを取得
    pub fn get_read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// 読み込みタイムアウトを取得
    pub fn get_read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// 制限を取得
    pub fn get_limits(&self) -> &BodyStreamLimits {
        &self.limits
    }
}

/// 上流から下流へボディを流す
///
/// 正常に終端まで流せた場合は書き込んだバイト数を返す。
/// 正常終了時は下流をフラッシュしてシャットダウンする。
/// ストリームがエラーでクローズされた場合、下流はシャットダウンしない。
pub async fn pump<R, W>(reader: &mut R, writer: &mut W, config: &PumpConfig) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut state: BodyStreamState<Vec<u8>> = BodyStreamState::with_limits(config.limits.clone());
    let mut written: u64 = 0;

    // 下流は最初から読み込みを待っている
    let mut step = state.handle(Event::ReadRequested);

    loop {
        let Step { action, call_read } = step;
        match action {
            Action::Write(chunk) => {
                // 下流は書き込み中も次のデータを受け付けられる
                // (ステートマシンが書き込み完了まで遅延させる)
                let deferred = state.handle(Event::ReadRequested);
                debug_assert!(!deferred.call_read);

                step = match writer.write_all(&chunk).await {
                    Ok(()) => {
                        written += chunk.len() as u64;
                        state.handle(Event::WriteCompleted)
                    }
                    Err(e) => {
                        state.handle(Event::Error(StreamError::Write(e.to_string())));
                        state.handle(Event::WriteCompleted)
                    }
                };
                continue;
            }
            Action::Close(None) => {
                writer.flush().await?;
                writer.shutdown().await?;
                return Ok(written);
            }
            Action::Close(Some(e)) => return Err(Error::Stream(e)),
            Action::Nothing => {}
        }

        if !call_read {
            return Err(Error::Stalled);
        }

        let event = read_event(reader, config).await?;
        step = state.handle(event);
    }
}

/// 上流から 1 回読み込んでイベントに変換
///
/// 読み込みタイムアウトはイベントにせず `Elapsed` として返す。
async fn read_event<R>(
    reader: &mut R,
    config: &PumpConfig,
) -> std::result::Result<Event<Vec<u8>>, Elapsed>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; config.read_buffer_size];
    let result = match config.read_timeout {
        Some(timeout) => tokio::time::timeout(timeout, reader.read(&mut buf)).await?,
        None => reader.read(&mut buf).await,
    };

    Ok(match result {
        Ok(0) => Event::End,
        Ok(n) => {
            buf.truncate(n);
            Event::BytesArrived(buf)
        }
        Err(e) => Event::Error(StreamError::Read(e.to_string())),
    })
}
