//! tokio_body_stream - Tokio driver for shiguredo_body_stream
//!
//! Sans I/O の [`BodyStreamState`](shiguredo_body_stream::BodyStreamState) を
//! tokio の `AsyncRead` / `AsyncWrite` で駆動するドライバー。
//!
//! ## 特徴
//!
//! - **shiguredo_body_stream ベース**: 書き込み/読み込みの判断はすべてステートマシンが行う
//! - **バックプレッシャー**: 書き込みが完了するまで上流からは読み込まない
//! - **タイムアウト**: 上流の読み込みにタイムアウトを設定可能
//!
//! ## 使い方
//!
//! ```rust
//! use tokio_body_stream::{PumpConfig, pump};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tokio_body_stream::Result<()> {
//! let mut reader: &[u8] = b"Hello, world!";
//! let mut writer = Vec::new();
//!
//! let written = pump(&mut reader, &mut writer, &PumpConfig::default()).await?;
//! assert_eq!(written, 13);
//! assert_eq!(writer, b"Hello, world!");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod pump;

pub use error::{Error, Result};
pub use pump::{PumpConfig, pump};

// shiguredo_body_stream の型を re-export
pub use shiguredo_body_stream::BodyStreamLimits;
