//! 初期状態ファイルの読み込みと書き込み
//!
//! 初期状態ファイルは、シミュレーション出力ファイルと同じ形式のヘッダに続いて、
//! `nx`行`ncol`列の値を1つだけ記録している。
//! 高度方向の格子を変更した後でファイルに書き戻すため、生の行列も保持する。

use std::fs::OpenOptions;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::binary::{read_f32_words, write_f32_words, ELEMENT_BYTES};
use crate::errors::{ReaderError, ReaderResult};
use crate::header::{read_header, IonoHeader};
use crate::layout::{
    check_columns, checked_record_bytes, initial_condition_columns, InitParam, StateParam,
    STATE_PARAM_COUNT,
};
use crate::plasma::{derive_isr, IsrProfile};
use crate::state::StateProfile;
use crate::table::RawMatrix;

/// Transcarが扱える高度の数の目安
///
/// これを超える高度の格子を与えると、Transcarが異常終了することがある。
pub const MAX_ALTITUDE_CELLS: usize = 300;

/// 初期状態の物理量を高度ごとに並べた表
#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditionTable {
    /// 高度(km)
    pub altitudes: Vec<f32>,

    /// 列の物理量
    pub params: Vec<InitParam>,

    /// 高度ごとに`params`の順番で並べた値
    pub rows: Vec<Vec<f32>>,
}

impl InitialConditionTable {
    fn from_raw(raw: &RawMatrix, columns: &[(InitParam, usize)]) -> Self {
        Self {
            altitudes: raw.column(0),
            params: columns.iter().map(|(p, _)| *p).collect(),
            rows: raw
                .iter_rows()
                .map(|row| columns.iter().map(|(_, c)| row[*c]).collect())
                .collect(),
        }
    }

    /// 物理量の値を高度順に返す。
    pub fn column(&self, param: InitParam) -> Option<Vec<f32>> {
        let position = self.params.iter().position(|p| *p == param)?;

        Some(self.rows.iter().map(|row| row[position]).collect())
    }
}

/// 初期状態ファイルの内容
#[derive(Debug, Clone, PartialEq)]
pub struct InitialCondition {
    /// ヘッダ
    header: IonoHeader,
    /// ヘッダ領域(`2 * ncol`要素)の生の値
    header_region: Vec<f32>,
    /// 物理量と列の組み合わせ
    columns: Vec<(InitParam, usize)>,
    /// 物理量の表
    table: InitialConditionTable,
    /// 生の行列
    raw: RawMatrix,
}

impl InitialCondition {
    /// ヘッダを返す。
    pub fn header(&self) -> &IonoHeader {
        &self.header
    }

    /// 物理量の表を返す。
    pub fn table(&self) -> &InitialConditionTable {
        &self.table
    }

    /// 生の行列を返す。
    pub fn raw(&self) -> &RawMatrix {
        &self.raw
    }

    /// 高度(km)を返す。
    pub fn altitudes(&self) -> &[f32] {
        &self.table.altitudes
    }

    /// 物理量の表、生の行列、ヘッダに分解する。
    pub fn into_parts(self) -> (InitialConditionTable, RawMatrix, IonoHeader) {
        (self.table, self.raw, self.header)
    }

    /// シミュレーション出力と共通の物理量を取り出す。
    pub fn state_profile(&self) -> StateProfile {
        let positions: [Option<usize>; STATE_PARAM_COUNT] = std::array::from_fn(|i| {
            self.table
                .params
                .iter()
                .position(|p| *p == InitParam::State(StateParam::ALL[i]))
        });

        StateProfile {
            altitudes: self.table.altitudes.clone(),
            rows: self
                .table
                .rows
                .iter()
                .map(|row| std::array::from_fn(|i| positions[i].map_or(f32::NAN, |c| row[c])))
                .collect(),
        }
    }

    /// ISRパラメーターを計算する。
    pub fn isr(&self) -> IsrProfile {
        let profile = self.state_profile();

        derive_isr(&profile.altitudes, &profile.rows, self.header.version())
    }

    /// 高度方向の格子を変更した生の行列に置き換える。
    ///
    /// 高度の数をヘッダに反映して、物理量の表を再構築する。
    ///
    /// # 引数
    ///
    /// * `raw` - 変更後の高度の格子で補間した生の行列
    pub fn replace_grid(&mut self, raw: RawMatrix) -> ReaderResult<()> {
        if raw.cols() != self.header.ncol {
            return Err(ReaderError::LayoutMismatch(format!(
                "置き換える行列の列の数{}が、初期状態ファイルの列の数{}と一致しません。",
                raw.cols(),
                self.header.ncol
            )));
        }
        if raw.rows() == 0 {
            return Err(ReaderError::LayoutMismatch(
                "置き換える行列に高度がありません。".to_string(),
            ));
        }
        if MAX_ALTITUDE_CELLS < raw.rows() {
            warn!(
                nx = raw.rows(),
                max = MAX_ALTITUDE_CELLS,
                "altitude grid may be too large for the simulator"
            );
        }

        self.header.nx = raw.rows();
        self.table = InitialConditionTable::from_raw(&raw, &self.columns);
        self.raw = raw;

        Ok(())
    }

    /// 初期状態ファイルを書き込む。
    ///
    /// ヘッダ領域の先頭の値を現在の高度の数に置き換えて書き込み、続けて生の行列を書き込む。
    ///
    /// # 引数
    ///
    /// * `path` - 書き込むファイルのパス
    pub fn write<P>(&self, path: P) -> ReaderResult<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| ReaderError::Open(format!("{}: {e}", path.display())))?;
        let mut writer = BufWriter::new(file);

        let mut header_region = self.header_region.clone();
        header_region[0] = self.header.nx as f32;
        write_f32_words(&mut writer, &header_region)
            .map_err(|e| e.with_context(path, "ヘッダ"))?;
        write_f32_words(&mut writer, self.raw.as_slice())
            .map_err(|e| e.with_context(path, "データ"))?;
        writer.flush().map_err(|e| {
            ReaderError::Unexpected(format!("{}への書き込みに失敗しました。{e}", path.display()))
        })?;
        debug!(path = ?path, nx = self.header.nx, "wrote initial condition");

        Ok(())
    }
}

/// 初期状態ファイルを読み込む。
///
/// ヘッダの後、`2 * ncol`要素の位置から`nx`行`ncol`列の値を読み込む。
///
/// # 引数
///
/// * `path` - 初期状態ファイルのパス
///
/// # 戻り値
///
/// `InitialCondition`
pub fn decode_initial_condition<P>(path: P) -> ReaderResult<InitialCondition>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| ReaderError::Open(format!("{}: {e}", path.display())))?;
    let file_size = file
        .metadata()
        .map_err(|e| {
            ReaderError::Unexpected(format!(
                "{}のファイル・サイズを取得できませんでした。{e}",
                path.display()
            ))
        })?
        .len();
    let mut reader = BufReader::new(file);

    let (header, _) = read_header(&mut reader).map_err(|e| e.with_context(path, "ヘッダ"))?;
    let columns = initial_condition_columns(header.version(), header.ncol);
    check_columns(columns.iter().map(|(_, c)| *c), header.ncol)
        .map_err(|e| e.with_context(path, "ヘッダ"))?;
    // 値を読み込む前に、ヘッダが示す大きさがファイルに収まるか確認する
    match checked_record_bytes(header.ncol, header.nx) {
        Some(bytes) if bytes as u64 <= file_size => {}
        _ => {
            return Err(ReaderError::TruncatedFile(format!(
                "{}: 高度の数{}と列の数{}が示す大きさに対して、ファイル・サイズ{file_size}バイトが不足しています。",
                path.display(),
                header.nx,
                header.ncol
            )))
        }
    }

    reader.seek(SeekFrom::Start(0)).map_err(|e| {
        ReaderError::Unexpected(format!("{}の先頭へのシークに失敗しました。{e}", path.display()))
    })?;
    let header_width = 2 * header.ncol;
    let header_region = read_f32_words(&mut reader, header_width)
        .map_err(|e| e.with_context(path, "ヘッダ領域"))?;
    let values = read_f32_words(&mut reader, header.nx * header.ncol).map_err(|e| {
        e.with_context(
            path,
            &format!("オフセット{}バイトからのデータ", header_width * ELEMENT_BYTES),
        )
    })?;
    let raw = RawMatrix::from_row_major(header.nx, header.ncol, values)?;
    let table = InitialConditionTable::from_raw(&raw, &columns);
    debug!(
        path = ?path,
        nx = header.nx,
        ncol = header.ncol,
        columns = columns.len(),
        "read initial condition"
    );

    Ok(InitialCondition {
        header,
        header_region,
        columns,
        table,
        raw,
    })
}
