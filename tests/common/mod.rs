#![allow(dead_code)]

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// ヘッダの要素数
pub const HEADER_WORDS: usize = 126;

/// transconvec_13の列の数
pub const NCOL: usize = 63;

/// 検証を通過するヘッダ領域の値を生成する。
///
/// 日時は2013-03-31 09:00:`second` UTCとする。
pub fn header_words(nx: usize, ncol: usize, approx: f32, second: f32) -> Vec<f32> {
    let mut words = vec![0f32; (2 * ncol).max(HEADER_WORDS)];
    words[0] = nx as f32;
    words[1] = ncol as f32;
    words[2..=7].copy_from_slice(&[2013.0, 3.0, 31.0, 9.0, 0.0, second]);
    words[23] = 95.0;
    words[36] = approx;
    words.truncate(2 * ncol);

    words
}

/// 行列の値
///
/// 先頭の列は高度(km)で、それ以外は行と列から決まる値とする。
pub fn cell(row: usize, col: usize) -> f32 {
    if col == 0 {
        100.0 + 10.0 * row as f32
    } else {
        (1000 * (row + 1) + col) as f32
    }
}

/// ヘッダ領域と`nx`行`ncol`列の行列を並べたレコードを生成する。
pub fn record_words(nx: usize, ncol: usize, approx: f32, second: f32) -> Vec<f32> {
    let mut words = header_words(nx, ncol, approx, second);
    for row in 0..nx {
        for col in 0..ncol {
            words.push(cell(row, col));
        }
    }

    words
}

/// 値をリトル・エンディアンの32ビット浮動小数点数でファイルに書き込む。
pub fn write_words<P>(path: P, words: &[f32])
where
    P: AsRef<Path>,
{
    write_bytes(path, &to_bytes(words));
}

pub fn to_bytes(words: &[f32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn write_bytes<P>(path: P, bytes: &[u8])
where
    P: AsRef<Path>,
{
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .unwrap();
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).unwrap();
    writer.flush().unwrap();
}

/// 励起率ファイルの1レコードを生成する。
///
/// 時刻は2013年90日目の`seconds`秒、伏角の補角は77.5度とする。
pub fn emission_record(seconds: f64, nalt: usize, nen: usize, scale: f64) -> String {
    let mut lines = vec![format!("2013090 {seconds:.1} 77.5 {nalt} {nen}")];
    for a in 0..nalt {
        let mut values = vec![format!("{:.1}", 100.0 + 50.0 * a as f64)];
        for r in 0..10 {
            values.push(format!("{:.1}", scale * (10 * a + r + 1) as f64));
        }
        lines.push(values.join(" "));
    }
    for e in 0..nen {
        lines.push(format!("{:.1} {:.1}", 1.0e6 * (e + 1) as f64, 500.0 * (e + 1) as f64));
    }

    lines.join("\n") + "\n"
}
