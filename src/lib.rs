//! # shiguredo_body_stream
//!
//! HTTP ボディストリームのステートマシンとヘッダー値パーサー (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: I/O を完全に分離した設計、ドライバーはイベントを渡してアクションを受け取るだけ
//! - **バックプレッシャー**: 同時に書き込み中にできるチャンクは最大 1 つ
//! - **共通ディレクティブパーサー**: Content-Type, Forwarded, Content-Disposition,
//!   Cache-Control, Transfer-Encoding, Accept-Language, Link などを同じ規則で分解
//! - **パニックしない**: 不正なヘッダー値は可能な範囲で文字列として解釈
//!
//! ## 使い方
//!
//! ### ボディストリーム
//!
//! ```rust
//! use shiguredo_body_stream::{Action, BodyStreamState, Event};
//!
//! let mut state = BodyStreamState::new();
//!
//! let step = state.handle(Event::BytesArrived(b"Hello, world!".to_vec()));
//! assert_eq!(step.action, Action::Write(b"Hello, world!".to_vec()));
//!
//! // 書き込み中に届いたチャンクはバッファされる
//! let step = state.handle(Event::BytesArrived(b"more".to_vec()));
//! assert_eq!(step.action, Action::Nothing);
//!
//! let step = state.handle(Event::WriteCompleted);
//! assert_eq!(step.action, Action::Write(b"more".to_vec()));
//!
//! let step = state.handle(Event::End);
//! assert_eq!(step.action, Action::Nothing);
//!
//! // 終端はバッファが空になってからクローズ
//! let step = state.handle(Event::WriteCompleted);
//! assert_eq!(step.action, Action::Close(None));
//! ```
//!
//! ### ヘッダー値
//!
//! ```rust
//! use std::time::{Duration, UNIX_EPOCH};
//! use shiguredo_body_stream::cache::expiration;
//! use shiguredo_body_stream::directive::{Directive, DirectiveParser};
//!
//! let groups: Vec<_> = DirectiveParser::new("foo; bar=1; baz=2").collect();
//! assert_eq!(
//!     groups,
//!     vec![vec![
//!         Directive::new("foo"),
//!         Directive::with_parameter("bar", "1"),
//!         Directive::with_parameter("baz", "2"),
//!     ]]
//! );
//!
//! let headers = vec![("Cache-Control".to_string(), "no-store, max-age=12".to_string())];
//! assert_eq!(expiration(&headers, UNIX_EPOCH + Duration::from_secs(1)), None);
//! ```
//!
//! ## ログ
//!
//! `log` feature を有効にすると [`log`](https://docs.rs/log) クレート経由で
//! 状態遷移などを出力します。

mod log;

pub mod accept_language;
mod body_stream;
pub mod cache;
pub mod content_disposition;
pub mod content_type;
pub mod date;
pub mod directive;
mod error;
pub mod forwarded;
pub mod framing;
mod headers;
mod limits;
pub mod link;

pub use body_stream::{Action, BodyStreamState, Event, Phase, Step};
pub use error::Error;
pub use headers::HeaderFields;
pub use limits::BodyStreamLimits;
