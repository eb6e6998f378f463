//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// ヘッダー値の部品
// ========================================

/// ディレクティブの key / 値 (区切り文字と空白を含まない)
pub fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._-]{0,15}".prop_map(|s| s)
}

/// 引用符付き文字列の中身 (区切り文字・引用符・バックスラッシュを含みうる)
///
/// 前後の空白は引用符の外ではトリムされないが、
/// 比較を単純にするため先頭と末尾は空白以外にする。
pub fn quoted_content() -> impl Strategy<Value = String> {
    "[A-Za-z0-9;,=\"\\\\/:\\[\\]]([A-Za-z0-9 ;,=\"\\\\/:\\[\\]]{0,14}[A-Za-z0-9;,=\"\\\\/:\\[\\]])?"
        .prop_map(|s| s)
}

/// 任意の印字可能 ASCII (パーサーの no-panic 用)
pub fn printable_ascii() -> impl Strategy<Value = String> {
    "[ -~]{0,128}".prop_map(|s| s)
}

// ========================================
// ボディストリーム
// ========================================

/// 空でないチャンク列
pub fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..32), 0..16)
}

/// 秒数 (0 から 10 年)
pub fn seconds() -> impl Strategy<Value = u64> {
    0u64..=315_360_000
}
