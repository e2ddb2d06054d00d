//! 励起率ファイル(emissions.dat)の読み込み
//!
//! 励起率ファイルはASCII形式で、各時刻のレコードは次の順番で値を記録している。
//! 改行の位置には意味がなく、空白で区切られた値の並びとして読み込む。
//!
//! 1. ヘッダ（5値）: 年と通日(YYYYDDD)、0時からの経過秒、90度から伏角を引いた値、高度の数、エネルギー・ビンの数
//! 2. 高度ごとに、高度(km)と10種類の反応の励起率（11値 * 高度の数）
//! 3. エネルギー・ビンごとに、下向きのフラックスとエネルギー（2値 * エネルギー・ビンの数）

use std::fs;
use std::path::Path;

use time::OffsetDateTime;
use tracing::debug;

use crate::dates::utc_from_year_day_seconds;
use crate::errors::{ReaderError, ReaderResult};
use crate::nearest::{nearest_time_index, TimeSelection};

/// レコードのヘッダの値の数
pub const HEADER_TOKENS: usize = 5;

/// 高度ごとの値の数（高度と10種類の反応）
pub const DATA_COLUMNS: usize = 11;

/// エネルギー・ビンごとの値の数（フラックスとエネルギー）
pub const PRECIP_COLUMNS: usize = 2;

/// 反応の数
pub const REACTION_COUNT: usize = DATA_COLUMNS - 1;

/// 励起率を記録している反応
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// O(1D)
    No1d,
    /// O(1S)
    No1s,
    /// O+(2P)
    Noii2p,
    /// N2(A3Σ)
    Nn2a3,
    /// O 844.6nm
    Po3p3p,
    /// O 777.4nm
    Po3p5p,
    /// N2+ 第1負帯
    P1ng,
    /// N2+ Meinel帯
    Pmein,
    /// N2 第2正帯
    P2pg,
    /// N2 第1正帯
    P1pg,
}

impl Reaction {
    /// ファイルに記録されている順番で並べた反応
    pub const ALL: [Reaction; REACTION_COUNT] = [
        Self::No1d,
        Self::No1s,
        Self::Noii2p,
        Self::Nn2a3,
        Self::Po3p3p,
        Self::Po3p5p,
        Self::P1ng,
        Self::Pmein,
        Self::P2pg,
        Self::P1pg,
    ];

    /// 反応名を返す。
    pub fn name(&self) -> &'static str {
        match self {
            Self::No1d => "no1d",
            Self::No1s => "no1s",
            Self::Noii2p => "noii2p",
            Self::Nn2a3 => "nn2a3",
            Self::Po3p3p => "po3p3p",
            Self::Po3p5p => "po3p5p",
            Self::P1ng => "p1ng",
            Self::Pmein => "pmein",
            Self::P2pg => "p2pg",
            Self::P1pg => "p1pg",
        }
    }

    /// `Reaction::ALL`内の位置を返す。
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// 励起率ファイルの先頭行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationHeader {
    /// 最初のレコードの時刻（UTC）
    pub time: OffsetDateTime,

    /// 磁場の伏角（度）
    pub dip_angle: f64,

    /// 高度の数
    pub nalt: usize,

    /// エネルギー・ビンの数
    pub nen: usize,
}

impl ExcitationHeader {
    /// 高度ごとの値の数を返す。
    pub fn ndat(&self) -> ReaderResult<usize> {
        DATA_COLUMNS
            .checked_mul(self.nalt)
            .ok_or_else(|| oversized("高度の数", self.nalt))
    }

    /// 降下粒子の値の数を返す。
    pub fn nprecip(&self) -> ReaderResult<usize> {
        PRECIP_COLUMNS
            .checked_mul(self.nen)
            .ok_or_else(|| oversized("エネルギー・ビンの数", self.nen))
    }

    /// 1レコードの値の数を返す。
    pub fn record_width(&self) -> ReaderResult<usize> {
        HEADER_TOKENS
            .checked_add(self.ndat()?)
            .and_then(|w| w.checked_add(self.nprecip().ok()?))
            .ok_or_else(|| {
                ReaderError::MalformedExcitationHeader(format!(
                    "高度の数{}とエネルギー・ビンの数{}から計算したレコードの大きさが扱える範囲を超えています。",
                    self.nalt, self.nen
                ))
            })
    }
}

fn oversized(name: &str, value: usize) -> ReaderError {
    ReaderError::MalformedExcitationHeader(format!(
        "{name}{value}から計算した値の数が扱える範囲を超えています。"
    ))
}

/// エネルギー・ビンごとの降下粒子
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipitationBin {
    /// 下向きのフラックス
    pub flux: f64,

    /// エネルギー
    pub energy: f64,
}

/// 励起率ファイルの内容
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationRates {
    /// レコードの時刻（UTC）
    pub times: Vec<OffsetDateTime>,

    /// 高度(km)
    ///
    /// 高度の格子は時刻によらず一定であるため、最後のレコードの高度を格納する。
    pub altitudes: Vec<f64>,

    /// 磁場の伏角（度）
    ///
    /// ファイルの先頭行から1回だけ読み込む。
    pub dip_angle: f64,

    /// 時刻、高度、反応ごとの励起率
    pub rates: Vec<Vec<[f64; REACTION_COUNT]>>,

    /// 時刻、エネルギー・ビンごとの降下粒子
    pub precipitation: Vec<Vec<PrecipitationBin>>,
}

impl ExcitationRates {
    /// レコード数を返す。
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// レコードがないか確認する。
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 指定した時刻、高度位置、反応の励起率を返す。
    pub fn rate(&self, time_index: usize, altitude_index: usize, reaction: Reaction) -> Option<f64> {
        self.rates
            .get(time_index)?
            .get(altitude_index)
            .map(|row| row[reaction.index()])
    }

    /// 指定した時刻位置の、反応の励起率を高度順に返す。
    pub fn profile(&self, time_index: usize, reaction: Reaction) -> Option<Vec<f64>> {
        self.rates
            .get(time_index)
            .map(|rows| rows.iter().map(|row| row[reaction.index()]).collect())
    }

    /// 要求された日時に最も近いレコードを選択する。
    ///
    /// 日時が要求されていない場合は、最後のレコードを選択する。
    pub fn select(&self, requested: Option<OffsetDateTime>) -> Option<TimeSelection> {
        nearest_time_index(&self.times, requested)
    }
}

/// 励起率ファイルの先頭行を解析する。
///
/// # 引数
///
/// * `line` - 先頭行
///
/// # 戻り値
///
/// `ExcitationHeader`
pub fn parse_header_line(line: &str) -> ReaderResult<ExcitationHeader> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != HEADER_TOKENS {
        return Err(ReaderError::MalformedExcitationHeader(format!(
            "先頭行の値の数が{}です。{HEADER_TOKENS}個である必要があります。`{line}`",
            tokens.len()
        )));
    }
    let values = tokens
        .iter()
        .map(|t| {
            t.parse::<f64>().map_err(|e| {
                ReaderError::MalformedExcitationHeader(format!(
                    "先頭行の値`{t}`を数値に変換できません。{e}"
                ))
            })
        })
        .collect::<ReaderResult<Vec<f64>>>()?;

    let time = utc_from_year_day_seconds(values[0], values[1])
        .map_err(ReaderError::MalformedExcitationHeader)?;
    let dip_angle = 90.0 - values[2];
    let nalt = count(values[3], "高度の数")?;
    let nen = count(values[4], "エネルギー・ビンの数")?;
    if nalt == 0 {
        return Err(ReaderError::MalformedExcitationHeader(
            "高度の数が0です。".to_string(),
        ));
    }

    let header = ExcitationHeader {
        time,
        dip_angle,
        nalt,
        nen,
    };
    header.record_width()?;

    Ok(header)
}

fn count(value: f64, name: &str) -> ReaderResult<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(ReaderError::MalformedExcitationHeader(format!(
            "{name}`{value}`が0以上の整数ではありません。"
        )));
    }

    Ok(value as usize)
}

/// 励起率ファイルの内容を解析する。
///
/// 先頭行からレコードの大きさを決定した後、先頭行を含むすべての値を1つの並びとして、
/// レコードの大きさごとに切り出す。
/// 値の数がレコードの大きさで割り切れない場合は、ファイルが途中で切れているとみなして、
/// `TruncatedFile`を返す。
///
/// # 引数
///
/// * `text` - 励起率ファイルの内容
///
/// # 戻り値
///
/// `ExcitationRates`
pub fn parse_excitation_rates(text: &str) -> ReaderResult<ExcitationRates> {
    let first_line = text.lines().next().unwrap_or_default();
    let header = parse_header_line(first_line)?;
    let record_width = header.record_width()?;
    let ndat = header.ndat()?;

    let stream = text
        .split_whitespace()
        .enumerate()
        .map(|(i, token)| {
            token.parse::<f64>().map_err(|e| {
                ReaderError::InvalidNumber(format!("{i}番目の値`{token}`を変換できません。{e}"))
            })
        })
        .collect::<ReaderResult<Vec<f64>>>()?;
    if stream.len() % record_width != 0 {
        return Err(ReaderError::TruncatedFile(format!(
            "値の数{}が、1レコードの値の数{record_width}で割り切れません。最後のレコードが{}値不足しています。",
            stream.len(),
            record_width - stream.len() % record_width
        )));
    }

    let number_of_records = stream.len() / record_width;
    let mut times = Vec::with_capacity(number_of_records);
    let mut rates = Vec::with_capacity(number_of_records);
    let mut precipitation = Vec::with_capacity(number_of_records);
    let mut altitudes = Vec::new();
    for (i, record) in stream.chunks_exact(record_width).enumerate() {
        let time = utc_from_year_day_seconds(record[0], record[1]).map_err(|e| {
            ReaderError::MalformedExcitationHeader(format!("{i}番目のレコードの時刻が不正です。{e}"))
        })?;
        let data = &record[HEADER_TOKENS..HEADER_TOKENS + ndat];
        let precip = &record[HEADER_TOKENS + ndat..];

        altitudes = data.chunks_exact(DATA_COLUMNS).map(|row| row[0]).collect();
        rates.push(
            data.chunks_exact(DATA_COLUMNS)
                .map(|row| std::array::from_fn(|r| row[r + 1]))
                .collect(),
        );
        precipitation.push(
            precip
                .chunks_exact(PRECIP_COLUMNS)
                .map(|bin| PrecipitationBin {
                    flux: bin[0],
                    energy: bin[1],
                })
                .collect(),
        );
        times.push(time);
    }
    debug!(
        nalt = header.nalt,
        nen = header.nen,
        dip_angle = header.dip_angle,
        records = number_of_records,
        "parsed excitation rates"
    );

    Ok(ExcitationRates {
        times,
        altitudes,
        dip_angle: header.dip_angle,
        rates,
        precipitation,
    })
}

/// 励起率ファイルを読み込む。
///
/// # 引数
///
/// * `dir` - 励起率ファイルを格納しているディレクトリ
/// * `file_name` - 励起率ファイルの名前
///
/// # 戻り値
///
/// `ExcitationRates`
pub fn decode_excitation_rates<P>(dir: P, file_name: &str) -> ReaderResult<ExcitationRates>
where
    P: AsRef<Path>,
{
    let path = dir.as_ref().join(file_name);
    let text = fs::read_to_string(&path)
        .map_err(|e| ReaderError::Open(format!("{}: {e}", path.display())))?;

    parse_excitation_rates(&text).map_err(|e| e.with_context(&path, "励起率"))
}
