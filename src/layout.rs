//! レコードの構造と、生の列から物理量への対応表
//!
//! 列の並びはヘッダの近似バージョン(`approx`)によって異なる。
//! 対応表は近似バージョンごとに固定されており、変更できない。

use crate::binary::ELEMENT_BYTES;
use crate::errors::{ReaderError, ReaderResult};
use crate::header::{IonoHeader, HEADER_WORDS};

/// レコードの形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// 近似バージョン13未満
    ///
    /// 平行温度と垂直温度を分離していない種があり、同じ列を両方に割り当てる。
    Legacy,

    /// 近似バージョン13（transconvec_13）
    Transconvec13,

    /// 近似バージョン14以上
    Extended,
}

impl FormatVersion {
    /// ヘッダの近似バージョンから形式を決定する。
    pub fn from_approx(approx: i32) -> Self {
        match approx {
            a if a < 13 => Self::Legacy,
            13 => Self::Transconvec13,
            _ => Self::Extended,
        }
    }

    /// 平行温度と垂直温度を独立した列に記録しているか確認する。
    pub fn has_split_temperatures(&self) -> bool {
        !matches!(self, Self::Legacy)
    }
}

/// シミュレーション出力の物理量の数
pub const STATE_PARAM_COUNT: usize = 22;

/// シミュレーション出力の物理量
///
/// 1から3はO+、H+、N+の主要イオン、4から6は分子イオンをまとめて扱う副次種、
/// 7は別列に記録されている種である。
/// `p`は磁力線に平行な温度、`t`は磁力線に垂直な温度を示す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateParam {
    N1,
    N2,
    N3,
    N4,
    N5,
    N6,
    N7,
    V1,
    V2,
    V3,
    Vm,
    Ve,
    T1p,
    T1t,
    T2p,
    T2t,
    T3p,
    T3t,
    Tmp,
    Tmt,
    Tep,
    Tet,
}

impl StateParam {
    /// レコードに格納する順番に並べた物理量
    pub const ALL: [StateParam; STATE_PARAM_COUNT] = [
        Self::N1,
        Self::N2,
        Self::N3,
        Self::N4,
        Self::N5,
        Self::N6,
        Self::N7,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::Vm,
        Self::Ve,
        Self::T1p,
        Self::T1t,
        Self::T2p,
        Self::T2t,
        Self::T3p,
        Self::T3t,
        Self::Tmp,
        Self::Tmt,
        Self::Tep,
        Self::Tet,
    ];

    /// 物理量名を返す。
    pub fn name(&self) -> &'static str {
        match self {
            Self::N1 => "n1",
            Self::N2 => "n2",
            Self::N3 => "n3",
            Self::N4 => "n4",
            Self::N5 => "n5",
            Self::N6 => "n6",
            Self::N7 => "n7",
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
            Self::Vm => "vm",
            Self::Ve => "ve",
            Self::T1p => "t1p",
            Self::T1t => "t1t",
            Self::T2p => "t2p",
            Self::T2t => "t2t",
            Self::T3p => "t3p",
            Self::T3t => "t3t",
            Self::Tmp => "tmp",
            Self::Tmt => "tmt",
            Self::Tep => "tep",
            Self::Tet => "tet",
        }
    }

    /// `StateParam::ALL`内の位置を返す。
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// 初期状態ファイルにのみ記録されている物理量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitParam {
    /// シミュレーション出力と共通の物理量
    State(StateParam),
    Q1,
    Q2,
    Q3,
    Qe,
    Nno,
    Uno,
    Po,
    Ph,
    Pn,
    Pn2,
    Po2,
    Heat,
    Po1d,
    No1d,
    Uo1d,
}

impl InitParam {
    /// 物理量名を返す。
    pub fn name(&self) -> &'static str {
        match self {
            Self::State(p) => p.name(),
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Qe => "qe",
            Self::Nno => "nno",
            Self::Uno => "uno",
            Self::Po => "po",
            Self::Ph => "ph",
            Self::Pn => "pn",
            Self::Pn2 => "pn2",
            Self::Po2 => "po2",
            Self::Heat => "heat",
            Self::Po1d => "po1d",
            Self::No1d => "no1d",
            Self::Uo1d => "uo1d",
        }
    }
}

/// 副次種をまとめた密度を記録している列
pub const COMBINED_SPECIES_COLUMN: usize = 49;

/// 近似バージョン13以上のシミュレーション出力の列
const STATE_COLUMNS_SPLIT: [usize; STATE_PARAM_COUNT] = [
    1, 2, 3, 4, 5, 6, COMBINED_SPECIES_COLUMN, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20,
    21,
];

/// 近似バージョン13未満のシミュレーション出力の列
///
/// 平行温度と垂直温度に同じ列を割り当てる。
const STATE_COLUMNS_LEGACY: [usize; STATE_PARAM_COUNT] = [
    1, 2, 3, 4, 5, 6, COMBINED_SPECIES_COLUMN, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 16,
    16,
];

/// 初期状態ファイルで、診断用の列を除いて共通に記録されている物理量の数
const INIT_BASE_COUNT: usize = 33;

/// 初期状態ファイルの共通部分の物理量
const INIT_BASE_PARAMS: [InitParam; INIT_BASE_COUNT] = [
    InitParam::State(StateParam::N1),
    InitParam::State(StateParam::N2),
    InitParam::State(StateParam::N3),
    InitParam::State(StateParam::N4),
    InitParam::State(StateParam::N5),
    InitParam::State(StateParam::N6),
    InitParam::State(StateParam::V1),
    InitParam::State(StateParam::V2),
    InitParam::State(StateParam::V3),
    InitParam::State(StateParam::Vm),
    InitParam::State(StateParam::Ve),
    InitParam::State(StateParam::T1p),
    InitParam::State(StateParam::T1t),
    InitParam::State(StateParam::T2p),
    InitParam::State(StateParam::T2t),
    InitParam::State(StateParam::T3p),
    InitParam::State(StateParam::T3t),
    InitParam::State(StateParam::Tmp),
    InitParam::State(StateParam::Tmt),
    InitParam::State(StateParam::Tep),
    InitParam::State(StateParam::Tet),
    InitParam::Q1,
    InitParam::Q2,
    InitParam::Q3,
    InitParam::Qe,
    InitParam::Nno,
    InitParam::Uno,
    InitParam::Po,
    InitParam::Ph,
    InitParam::Pn,
    InitParam::Pn2,
    InitParam::Po2,
    InitParam::Heat,
];

/// 近似バージョン13の初期状態ファイルの列
const INIT_COLUMNS_V13: [usize; INIT_BASE_COUNT] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26,
    27, 28, 29, 30, 31, 32, 33,
];

/// 近似バージョン13以外の初期状態ファイルの列
const INIT_COLUMNS_LEGACY: [usize; INIT_BASE_COUNT] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 16, 16, 17, 18, 19, 20, 21,
    22, 23, 24, 25, 26, 27, 28,
];

/// 列の数がこの値を超える初期状態ファイルは、診断用の列を記録している。
const DIAGNOSTIC_MIN_NCOL: usize = 60;

/// 診断用の列
const INIT_DIAGNOSTIC_COLUMNS: [(InitParam, usize); 3] = [
    (InitParam::Po1d, 60),
    (InitParam::No1d, 61),
    (InitParam::Uo1d, 62),
];

/// シミュレーション出力で、物理量を記録している列を返す。
///
/// 返却する列は`StateParam::ALL`の順番に並んでいる。
pub fn state_columns(version: FormatVersion) -> &'static [usize; STATE_PARAM_COUNT] {
    match version {
        FormatVersion::Legacy => &STATE_COLUMNS_LEGACY,
        FormatVersion::Transconvec13 | FormatVersion::Extended => &STATE_COLUMNS_SPLIT,
    }
}

/// 初期状態ファイルで、物理量を記録している列を返す。
///
/// 近似バージョン13のみ連続した列を使用し、それ以外は近似バージョン13未満の並びを使用する。
/// 列の数が60を超える場合は診断用の3列を追加し、最後に副次種の列を追加する。
///
/// # 引数
///
/// * `version` - 初期状態ファイルの形式
/// * `ncol` - 初期状態ファイルの列の数
///
/// # 戻り値
///
/// 物理量と列の組み合わせ
pub fn initial_condition_columns(version: FormatVersion, ncol: usize) -> Vec<(InitParam, usize)> {
    let base = match version {
        FormatVersion::Transconvec13 => &INIT_COLUMNS_V13,
        FormatVersion::Legacy | FormatVersion::Extended => &INIT_COLUMNS_LEGACY,
    };
    let mut columns: Vec<(InitParam, usize)> = INIT_BASE_PARAMS
        .iter()
        .copied()
        .zip(base.iter().copied())
        .collect();
    if DIAGNOSTIC_MIN_NCOL < ncol {
        columns.extend_from_slice(&INIT_DIAGNOSTIC_COLUMNS);
    }
    columns.push((InitParam::State(StateParam::N7), COMBINED_SPECIES_COLUMN));

    columns
}

/// 列が行の範囲内にあるか確認する。
pub(crate) fn check_columns<I>(columns: I, ncol: usize) -> ReaderResult<()>
where
    I: IntoIterator<Item = usize>,
{
    match columns.into_iter().max() {
        Some(max) if ncol <= max => Err(ReaderError::LayoutMismatch(format!(
            "{max}列目を参照しますが、列の数は{ncol}です。"
        ))),
        _ => Ok(()),
    }
}

/// 列の数と高度の数から、ヘッダ領域(`2 * ncol`要素)とデータ部を合わせたバイト数を計算する。
///
/// 計算がオーバーフローする場合は`None`を返す。
pub(crate) fn checked_record_bytes(ncol: usize, nx: usize) -> Option<usize> {
    let header_width = ncol.checked_mul(2)?;
    let data_width = nx.checked_mul(ncol)?;

    header_width
        .checked_add(data_width)?
        .checked_mul(ELEMENT_BYTES)
}

/// シミュレーション出力ファイルのレコードの構造
///
/// ヘッダに記録されている列の数と高度の数から計算する。
/// 要素数の単位はすべて32ビット浮動小数点数の個数である。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// 列の数
    pub ncol: usize,

    /// 高度の数
    pub nx: usize,

    /// レコードの形式
    pub version: FormatVersion,

    /// ヘッダの要素数
    pub header_width: usize,

    /// データ部の要素数
    pub data_width: usize,

    /// レコード全体の要素数
    pub record_width: usize,
}

impl RecordLayout {
    /// レコードの構造を計算する。
    ///
    /// ヘッダの要素数(`2 * ncol`)が`HEADER_WORDS`と一致しない場合は、想定と異なる形式のファイルであるため、
    /// `LayoutMismatch`を返す。
    ///
    /// # 引数
    ///
    /// * `ncol` - 列の数
    /// * `nx` - 高度の数
    /// * `version` - レコードの形式
    ///
    /// # 戻り値
    ///
    /// `RecordLayout`
    pub fn new(ncol: usize, nx: usize, version: FormatVersion) -> ReaderResult<Self> {
        if ncol.checked_mul(2) != Some(HEADER_WORDS) {
            return Err(ReaderError::LayoutMismatch(format!(
                "ヘッダの要素数は列の数{ncol}の2倍ですが、{HEADER_WORDS}である必要があります。"
            )));
        }
        let header_width = HEADER_WORDS;
        check_columns(state_columns(version).iter().copied(), ncol)?;
        if checked_record_bytes(ncol, nx).is_none() {
            return Err(ReaderError::LayoutMismatch(format!(
                "高度の数{nx}と列の数{ncol}から計算したレコードの大きさが扱える範囲を超えています。"
            )));
        }
        let data_width = nx * ncol;

        Ok(Self {
            ncol,
            nx,
            version,
            header_width,
            data_width,
            record_width: header_width + data_width,
        })
    }

    /// ヘッダからレコードの構造を計算する。
    pub fn from_header(header: &IonoHeader) -> ReaderResult<Self> {
        Self::new(header.ncol, header.nx, header.version())
    }

    /// レコード全体のバイト数を返す。
    pub fn record_bytes(&self) -> usize {
        self.record_width * ELEMENT_BYTES
    }

    /// 物理量を記録している列を返す。
    pub fn column_index_map(&self) -> &'static [usize; STATE_PARAM_COUNT] {
        state_columns(self.version)
    }
}
