/// ボディストリームの制限設定
///
/// 書き込み中に到着したチャンクをバッファする上限。
/// 通常のフローでは 0-1 チャンクしか溜まらないため、上限に達するのは
/// 上流がデマンドを無視してデータを送り続けた場合に限られる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyStreamLimits {
    /// 最大バッファチャンク数 (デフォルト: 1024)
    pub max_buffered_chunks: usize,
    /// 最大バッファバイト数 (デフォルト: 1MB)
    pub max_buffered_bytes: usize,
}

impl Default for BodyStreamLimits {
    fn default() -> Self {
        Self {
            max_buffered_chunks: 1024,
            max_buffered_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl BodyStreamLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_buffered_chunks: usize::MAX,
            max_buffered_bytes: usize::MAX,
        }
    }
}
