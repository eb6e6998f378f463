//! ヘッダーリスト操作

/// `(名前, 値)` のヘッダーリストを検索するためのトレイト
///
/// 名前の比較は大文字小文字を区別しない。
pub trait HeaderFields {
    /// ヘッダーリストを取得
    fn fields(&self) -> &[(String, String)];

    /// 最初に見つかったヘッダーの値を取得
    fn get_header(&self, name: &str) -> Option<&str> {
        self.fields()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 指定した名前のヘッダーをすべて取得
    fn get_headers(&self, name: &str) -> Vec<&str> {
        self.fields()
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// ヘッダーが存在するか確認
    fn has_header(&self, name: &str) -> bool {
        self.fields()
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl HeaderFields for [(String, String)] {
    fn fields(&self) -> &[(String, String)] {
        self
    }
}

impl HeaderFields for Vec<(String, String)> {
    fn fields(&self) -> &[(String, String)] {
        self
    }
}
