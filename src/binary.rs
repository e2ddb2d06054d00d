use std::io::{Read, Write};

use crate::errors::{ReaderError, ReaderResult};

/// 1要素のバイト数
///
/// Transcarのバイナリ・ファイルは、すべての値をリトル・エンディアンの32ビット浮動小数点数で記録している。
pub const ELEMENT_BYTES: usize = 4;

/// 32ビット浮動小数点数を指定された数だけ読み込む。
///
/// # 引数
///
/// * `reader` - 値を読み込むリーダー
/// * `count` - 読み込む値の数
///
/// # 戻り値
///
/// 読み込んだ値を記録順に格納した`Vec`
pub(crate) fn read_f32_words<R>(reader: &mut R, count: usize) -> ReaderResult<Vec<f32>>
where
    R: Read,
{
    let mut buf = vec![0u8; count * ELEMENT_BYTES];
    reader.read_exact(&mut buf).map_err(|e| {
        ReaderError::TruncatedFile(format!(
            "ファイルから{}バイト({count}要素)の読み込みに失敗しました。{e}",
            count * ELEMENT_BYTES
        ))
    })?;

    Ok(buf
        .chunks_exact(ELEMENT_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// 32ビット浮動小数点数をリトル・エンディアンで書き込む。
pub(crate) fn write_f32_words<W>(writer: &mut W, words: &[f32]) -> ReaderResult<()>
where
    W: Write,
{
    for word in words {
        writer.write_all(&word.to_le_bytes()).map_err(|e| {
            ReaderError::Unexpected(format!("ファイルへの書き込みに失敗しました。{e}"))
        })?;
    }

    Ok(())
}
