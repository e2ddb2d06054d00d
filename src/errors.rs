use std::path::Path;

/// Transcar出力読み込みエラー型
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReaderError {
    /// 予期しない例外
    #[error("{0}")]
    Unexpected(String),

    /// ファイル・オープン・エラー
    #[error("ファイルを開くときにエラーが発生しました。{0}")]
    Open(String),

    /// ヘッダの値が不正
    ///
    /// 日付や時刻が範囲外の場合は、別の形式のファイルを読み込んでいる可能性が高い。
    #[error("ヘッダが不正です。{0}")]
    MalformedHeader(String),

    /// ヘッダから計算したレコード構造が想定と一致しない
    #[error("レコード構造が想定と一致しません。{0}")]
    LayoutMismatch(String),

    /// ファイルの途中で終端に達した
    #[error("ファイルが途中で切れています。{0}")]
    TruncatedFile(String),

    /// 励起率ファイルの先頭行が不正
    #[error("励起率ファイルのヘッダが不正です。{0}")]
    MalformedExcitationHeader(String),

    /// 数値に変換できないトークン
    #[error("数値に変換できません。{0}")]
    InvalidNumber(String),

    /// シミュレーション制御ファイル（DATCAR）が不正
    #[error("シミュレーション制御ファイルが不正です。{0}")]
    MalformedControlFile(String),
}

impl ReaderError {
    /// エラー・メッセージの先頭にファイル・パスと位置を付加する。
    pub(crate) fn with_context(self, path: &Path, context: &str) -> Self {
        let prefix = format!("{} {context}: ", path.display());
        match self {
            Self::Unexpected(m) => Self::Unexpected(prefix + &m),
            Self::Open(m) => Self::Open(prefix + &m),
            Self::MalformedHeader(m) => Self::MalformedHeader(prefix + &m),
            Self::LayoutMismatch(m) => Self::LayoutMismatch(prefix + &m),
            Self::TruncatedFile(m) => Self::TruncatedFile(prefix + &m),
            Self::MalformedExcitationHeader(m) => Self::MalformedExcitationHeader(prefix + &m),
            Self::InvalidNumber(m) => Self::InvalidNumber(prefix + &m),
            Self::MalformedControlFile(m) => Self::MalformedControlFile(prefix + &m),
        }
    }
}

/// Transcar出力読み込み結果型
pub type ReaderResult<T> = Result<T, ReaderError>;
