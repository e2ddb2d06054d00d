use std::io::Read;

use time::{Date, Month, OffsetDateTime, Time};

use crate::binary::read_f32_words;
use crate::errors::{ReaderError, ReaderResult};
use crate::layout::FormatVersion;

/// ヘッダの要素数
///
/// transconvec_13が出力するヘッダの要素数で、`2 * ncol`と一致しなければならない。
pub const HEADER_WORDS: usize = 126;

/// ヘッダ内の各値の位置
const NX: usize = 0;
const NCOL: usize = 1;
const YEAR: usize = 2;
const MONTH: usize = 3;
const DAY: usize = 4;
const HOUR: usize = 5;
const MINUTE: usize = 6;
const SECOND: usize = 7;
const INTPAS: usize = 8;
const LONGEO: usize = 9;
const LATGEO: usize = 10;
const LONMAG: usize = 11;
const LATMAG: usize = 12;
const TMAG: usize = 13;
const F107_INDEX: usize = 14;
const F107_AVERAGE: usize = 15;
const AP: usize = 16;
const KP: usize = 17;
const DT_INF: usize = 18;
const DU_INF: usize = 19;
const COF_O: usize = 20;
const COF_H: usize = 21;
const COF_N: usize = 22;
const CHI: usize = 23;
const APPROX: usize = 36;

/// シミュレーション状態ファイルのヘッダ
///
/// 初期状態ファイルとシミュレーション出力ファイルの各レコードの先頭に記録されている。
#[derive(Debug, Clone, PartialEq)]
pub struct IonoHeader {
    /// 高度の数
    pub nx: usize,

    /// 列の数
    ///
    /// 先頭の列は高度(km)である。
    pub ncol: usize,

    /// 日時（UTC）
    pub time: OffsetDateTime,

    /// 積分ステップ
    pub intpas: f32,

    /// 地理経度と地理緯度（度）
    pub longitude_geo: f32,
    pub latitude_geo: f32,

    /// 地磁気経度と地磁気緯度（度）
    pub longitude_mag: f32,
    pub latitude_mag: f32,

    /// 地磁気地方時
    pub magnetic_time: f32,

    /// F10.7太陽電波指数（当日値と平均値）
    pub f107_index: f32,
    pub f107_average: f32,

    /// Ap指数
    pub ap: f32,

    /// Kp指数
    pub kp: f32,

    /// 外圏温度と外圏風速の補正値
    pub dt_inf: f32,
    pub du_inf: f32,

    /// 酸素、水素、窒素の衝突係数
    pub cof_o: f32,
    pub cof_h: f32,
    pub cof_n: f32,

    /// 太陽天頂角
    pub chi: f32,

    /// 近似バージョン
    ///
    /// レコードの列の並びを決定する。
    pub approx: i32,
}

impl IonoHeader {
    /// 近似バージョンから、レコードの形式を返す。
    pub fn version(&self) -> FormatVersion {
        FormatVersion::from_approx(self.approx)
    }
}

/// ファイルの先頭からヘッダを読み込む。
///
/// # 引数
///
/// * `reader` - ヘッダを読み込むリーダー
///
/// # 戻り値
///
/// デコードしたヘッダと、ヘッダの生の値
pub(crate) fn read_header<R>(reader: &mut R) -> ReaderResult<(IonoHeader, Vec<f32>)>
where
    R: Read,
{
    let words = read_f32_words(reader, HEADER_WORDS)?;
    let header = decode_header(&words)?;

    Ok((header, words))
}

/// ヘッダの値をデコードする。
///
/// 日付と時刻の値を検証して、範囲外の場合は`MalformedHeader`を返す。
///
/// # 引数
///
/// * `words` - ファイルの先頭から読み込んだ`HEADER_WORDS`個の値
///
/// # 戻り値
///
/// デコードしたヘッダ
pub fn decode_header(words: &[f32]) -> ReaderResult<IonoHeader> {
    if words.len() < HEADER_WORDS {
        return Err(ReaderError::MalformedHeader(format!(
            "ヘッダの要素数が{}個しかありません。{HEADER_WORDS}個必要です。",
            words.len()
        )));
    }
    let nx = positive_count(words[NX], "高度の数")?;
    let ncol = positive_count(words[NCOL], "列の数")?;
    let time = decode_time(&words[YEAR..=SECOND])?;
    let approx = words[APPROX];
    if !approx.is_finite() {
        return Err(ReaderError::MalformedHeader(format!(
            "近似バージョン`{approx}`が有限な値ではありません。"
        )));
    }

    Ok(IonoHeader {
        nx,
        ncol,
        time,
        intpas: words[INTPAS],
        longitude_geo: words[LONGEO],
        latitude_geo: words[LATGEO],
        longitude_mag: words[LONMAG],
        latitude_mag: words[LATMAG],
        magnetic_time: words[TMAG],
        f107_index: words[F107_INDEX],
        f107_average: words[F107_AVERAGE],
        ap: words[AP],
        kp: words[KP],
        dt_inf: words[DT_INF],
        du_inf: words[DU_INF],
        cof_o: words[COF_O],
        cof_h: words[COF_H],
        cof_n: words[COF_N],
        chi: words[CHI],
        approx: approx.trunc() as i32,
    })
}

/// ヘッダの生の値から、高度の数と列の数を取り出す。
///
/// ヘッダ全体を検証する前に、ファイルに収まるレコードの大きさを見積もるために使用する。
pub(crate) fn declared_counts(words: &[f32]) -> Option<(usize, usize)> {
    let nx = positive_count(*words.get(NX)?, "高度の数").ok()?;
    let ncol = positive_count(*words.get(NCOL)?, "列の数").ok()?;

    Some((nx, ncol))
}

fn positive_count(value: f32, name: &str) -> ReaderResult<usize> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(ReaderError::MalformedHeader(format!(
            "{name}`{value}`が正の整数ではありません。"
        )));
    }

    Ok(value as usize)
}

/// 年、月、日、時、分、秒の6つの値からUTC日時を構築する。
fn decode_time(fields: &[f32]) -> ReaderResult<OffsetDateTime> {
    let [year, month, day, hour, minute, second] = [
        fields[0], fields[1], fields[2], fields[3], fields[4], fields[5],
    ];
    check_field(year, "年", 1.0, 9999.0)?;
    check_field(month, "月", 1.0, 12.0)?;
    check_field(day, "日", 1.0, 31.0)?;
    check_field(hour, "時", 0.0, 23.0)?;
    check_field(minute, "分", 0.0, 59.0)?;
    // 秒は端数を許容する
    if !second.is_finite() || !(0.0..60.0).contains(&second) {
        return Err(ReaderError::MalformedHeader(format!(
            "秒`{second}`が範囲外です。"
        )));
    }

    let month_enum = Month::try_from(month as u8).map_err(|e| {
        ReaderError::MalformedHeader(format!("ヘッダに記録されている月({month})が不正です。{e}"))
    })?;
    let date = Date::from_calendar_date(year as i32, month_enum, day as u8).map_err(|e| {
        ReaderError::MalformedHeader(format!(
            "ヘッダに記録されている年月日から、日付を構築できませんでした。{e}"
        ))
    })?;
    let nanos = ((second.fract() as f64) * 1.0e9).round().min(999_999_999.0) as u32;
    let time = Time::from_hms_nano(hour as u8, minute as u8, second.trunc() as u8, nanos)
        .map_err(|e| {
            ReaderError::MalformedHeader(format!(
                "ヘッダに記録されている時分秒から、時刻を構築できませんでした。{e}"
            ))
        })?;

    Ok(date.with_time(time).assume_utc())
}

fn check_field(value: f32, name: &str, min: f32, max: f32) -> ReaderResult<()> {
    if !value.is_finite() || value < min || max < value || value.fract() != 0.0 {
        return Err(ReaderError::MalformedHeader(format!(
            "{name}`{value}`が範囲外です。"
        )));
    }

    Ok(())
}
