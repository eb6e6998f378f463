//! HTTP ボディストリームステートマシン (Sans I/O)
//!
//! ## 概要
//!
//! トランスポートから届くバイトチャンクを下流の書き込み先へ受け渡す際の
//! バックプレッシャー制御を行う純粋なステートマシンです。
//! I/O は一切行わず、イベントを受け取って「ドライバーが実行すべきアクション」と
//! 「上流に次の読み込みを要求すべきか」を返します。
//!
//! - 同時に書き込み中にできるチャンクは最大 1 つ
//! - 書き込み中に届いたチャンクは到着順にバッファし、書き込み完了ごとに 1 つずつ流す
//! - 終端 (End) はバッファが空になるまで遅延される
//! - エラーは書き込み中であれば書き込み完了まで遅延される
//! - `Close` はストリームの生存期間中に 1 度だけ返される
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_body_stream::{Action, BodyStreamState, Event};
//!
//! let mut state = BodyStreamState::new();
//!
//! // チャンク到着: 即座に書き込む
//! let step = state.handle(Event::BytesArrived(b"Hello, world!".to_vec()));
//! assert_eq!(step.action, Action::Write(b"Hello, world!".to_vec()));
//! assert!(!step.call_read);
//!
//! // 書き込み完了
//! let step = state.handle(Event::WriteCompleted);
//! assert_eq!(step.action, Action::Nothing);
//!
//! // 読み込み要求: 上流へそのまま伝える
//! let step = state.handle(Event::ReadRequested);
//! assert!(step.call_read);
//!
//! // 終端: 書き込み中でなければ即座にクローズ
//! let step = state.handle(Event::End);
//! assert_eq!(step.action, Action::Close(None));
//! ```

use core::fmt;
use std::collections::VecDeque;

use crate::error::Error;
use crate::limits::BodyStreamLimits;
use crate::log::{debug, trace, warning};

/// ステートマシンへの入力イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<B> {
    /// 上流からチャンクが届いた
    BytesArrived(B),
    /// 下流が次のデータを要求した
    ReadRequested,
    /// 直前の書き込みが完了した
    WriteCompleted,
    /// 上流が終端に達した
    End,
    /// 上流または書き込み経路でエラーが発生した
    Error(Error),
}

/// ドライバーが実行すべきアクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<B> {
    /// 何もしない
    Nothing,
    /// チャンクを下流へ書き込む
    Write(B),
    /// ストリームを閉じる (`None` は正常終了)
    Close(Option<Error>),
}

/// イベント処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<B> {
    /// 実行すべきアクション
    pub action: Action<B>,
    /// 上流に次の読み込みを要求すべきか
    pub call_read: bool,
}

impl<B> Step<B> {
    fn nothing() -> Self {
        Step {
            action: Action::Nothing,
            call_read: false,
        }
    }

    fn read() -> Self {
        Step {
            action: Action::Nothing,
            call_read: true,
        }
    }

    fn write(chunk: B) -> Self {
        Step {
            action: Action::Write(chunk),
            call_read: false,
        }
    }

    fn close(error: Option<Error>) -> Self {
        Step {
            action: Action::Close(error),
            call_read: false,
        }
    }

    /// クローズアクションかどうか
    pub fn is_close(&self) -> bool {
        matches!(self.action, Action::Close(_))
    }
}

/// 外部から観測できるストリームの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 書き込みなし
    Idle,
    /// 書き込み中 (バッファなし)
    Writing,
    /// 書き込み中 + バッファあり
    Buffering,
    /// 終端受信済み、バッファの排出待ち
    Ending,
    /// エラー記録済み、書き込み完了待ち
    Erroring,
    /// 終了
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Writing => write!(f, "writing"),
            Phase::Buffering => write!(f, "buffering"),
            Phase::Ending => write!(f, "ending"),
            Phase::Erroring => write!(f, "erroring"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// 書き込み中の状態
#[derive(Debug)]
struct WriteState<B> {
    /// 書き込み待ちのチャンク (到着順)
    buffered: VecDeque<B>,
    /// バッファ済みバイト数
    buffered_bytes: usize,
    /// 書き込み中に届いた読み込み要求
    read_pending: bool,
    /// 終端を受信済み
    ended: bool,
}

impl<B: AsRef<[u8]>> WriteState<B> {
    fn new() -> Self {
        WriteState {
            buffered: VecDeque::new(),
            buffered_bytes: 0,
            read_pending: false,
            ended: false,
        }
    }

    fn pop_front(&mut self) -> Option<B> {
        let chunk = self.buffered.pop_front()?;
        self.buffered_bytes -= chunk.as_ref().len();
        Some(chunk)
    }
}

#[derive(Debug)]
enum State<B> {
    Idle,
    Writing(WriteState<B>),
    Erroring(Error),
    Closed,
}

/// HTTP ボディストリームステートマシン
///
/// 1 つのリクエスト/レスポンスボディにつき 1 インスタンスを使う。
/// 内部で同期は行わないため、イベントの配送はドライバー側で直列化すること。
#[derive(Debug)]
pub struct BodyStreamState<B = Vec<u8>> {
    state: State<B>,
    limits: BodyStreamLimits,
}

impl<B: AsRef<[u8]>> Default for BodyStreamState<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AsRef<[u8]>> BodyStreamState<B> {
    /// デフォルトの制限で作成
    pub fn new() -> Self {
        Self::with_limits(BodyStreamLimits::default())
    }

    /// 制限を指定して作成
    pub fn with_limits(limits: BodyStreamLimits) -> Self {
        BodyStreamState {
            state: State::Idle,
            limits,
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &BodyStreamLimits {
        &self.limits
    }

    /// イベントを処理する
    pub fn handle(&mut self, event: Event<B>) -> Step<B> {
        match event {
            Event::BytesArrived(chunk) => self.did_read_bytes(chunk),
            Event::ReadRequested => self.did_receive_read_request(),
            Event::WriteCompleted => self.did_write(),
            Event::End => self.did_end(),
            Event::Error(error) => self.did_error(error),
        }
    }

    /// 上流からチャンクが届いた
    pub fn did_read_bytes(&mut self, chunk: B) -> Step<B> {
        match &mut self.state {
            State::Idle => {
                trace!("body stream: write {} bytes", chunk.as_ref().len());
                self.state = State::Writing(WriteState::new());
                Step::write(chunk)
            }
            State::Writing(writing) => {
                let size = chunk.as_ref().len();
                let count = writing.buffered.len() + 1;
                let bytes = writing.buffered_bytes.saturating_add(size);

                let overflow = if count > self.limits.max_buffered_chunks {
                    Some(Error::TooManyBufferedChunks {
                        count,
                        limit: self.limits.max_buffered_chunks,
                    })
                } else if bytes > self.limits.max_buffered_bytes {
                    Some(Error::BufferOverflow {
                        size: bytes,
                        limit: self.limits.max_buffered_bytes,
                    })
                } else {
                    None
                };

                if let Some(error) = overflow {
                    warning!("body stream: {}", error);
                    self.state = State::Erroring(error);
                    return Step::nothing();
                }

                trace!("body stream: buffer {} bytes (queued: {})", size, count);
                writing.buffered.push_back(chunk);
                writing.buffered_bytes = bytes;
                Step::nothing()
            }
            State::Erroring(_) => {
                debug!("body stream: drop {} bytes after error", chunk.as_ref().len());
                Step::nothing()
            }
            State::Closed => {
                debug!("body stream: bytes arrived after close");
                Step::nothing()
            }
        }
    }

    /// 下流が次のデータを要求した
    pub fn did_receive_read_request(&mut self) -> Step<B> {
        match &mut self.state {
            State::Idle => Step::read(),
            State::Writing(writing) => {
                // 書き込み完了まで上流には伝えない
                writing.read_pending = true;
                Step::nothing()
            }
            State::Erroring(_) | State::Closed => Step::nothing(),
        }
    }

    /// 直前の書き込みが完了した
    pub fn did_write(&mut self) -> Step<B> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Writing(mut writing) => {
                if let Some(chunk) = writing.pop_front() {
                    trace!("body stream: flush buffered {} bytes", chunk.as_ref().len());
                    self.state = State::Writing(writing);
                    Step::write(chunk)
                } else if writing.ended {
                    trace!("body stream: drained, close");
                    Step::close(None)
                } else {
                    self.state = State::Idle;
                    Step {
                        action: Action::Nothing,
                        call_read: writing.read_pending,
                    }
                }
            }
            State::Erroring(error) => {
                trace!("body stream: close with error: {}", error);
                Step::close(Some(error))
            }
            State::Idle => {
                debug!("body stream: write completed without pending write");
                self.state = State::Idle;
                Step::nothing()
            }
            State::Closed => {
                debug!("body stream: write completed after close");
                Step::nothing()
            }
        }
    }

    /// 上流が終端に達した
    pub fn did_end(&mut self) -> Step<B> {
        match &mut self.state {
            State::Idle => {
                trace!("body stream: end, close");
                self.state = State::Closed;
                Step::close(None)
            }
            State::Writing(writing) => {
                writing.ended = true;
                Step::nothing()
            }
            State::Erroring(_) | State::Closed => Step::nothing(),
        }
    }

    /// エラーが発生した
    ///
    /// 書き込み中であれば書き込み完了時にクローズする。
    /// 最初に記録されたエラーが優先される。
    pub fn did_error(&mut self, error: Error) -> Step<B> {
        match &self.state {
            State::Idle => {
                trace!("body stream: error while idle, close: {}", error);
                self.state = State::Closed;
                Step::close(Some(error))
            }
            State::Writing(_) => {
                trace!("body stream: error while writing: {}", error);
                self.state = State::Erroring(error);
                Step::nothing()
            }
            State::Erroring(_) => {
                debug!("body stream: ignore error after failure: {}", error);
                Step::nothing()
            }
            State::Closed => Step::nothing(),
        }
    }

    /// 現在の状態を取得
    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Idle => Phase::Idle,
            State::Writing(writing) if writing.ended => Phase::Ending,
            State::Writing(writing) if !writing.buffered.is_empty() => Phase::Buffering,
            State::Writing(_) => Phase::Writing,
            State::Erroring(_) => Phase::Erroring,
            State::Closed => Phase::Closed,
        }
    }

    /// 書き込み中かどうか
    pub fn is_write_pending(&self) -> bool {
        matches!(self.state, State::Writing(_) | State::Erroring(_))
    }

    /// 終了済みかどうか
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// バッファ済みチャンク数
    pub fn buffered_len(&self) -> usize {
        match &self.state {
            State::Writing(writing) => writing.buffered.len(),
            _ => 0,
        }
    }

    /// バッファ済みバイト数
    pub fn buffered_bytes(&self) -> usize {
        match &self.state {
            State::Writing(writing) => writing.buffered_bytes,
            _ => 0,
        }
    }
}
