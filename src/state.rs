use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use time::OffsetDateTime;
use tracing::debug;

use crate::binary::{read_f32_words, ELEMENT_BYTES};
use crate::errors::{ReaderError, ReaderResult};
use crate::header::{declared_counts, decode_header, HEADER_WORDS};
use crate::layout::{
    checked_record_bytes, state_columns, FormatVersion, RecordLayout, StateParam,
    STATE_PARAM_COUNT,
};
use crate::nearest::{nearest_time_index, TimeSelection};
use crate::plasma::{derive_isr, IsrProfile};
use crate::table::RawMatrix;

type FileReader = BufReader<File>;

/// 高度ごとの物理量
#[derive(Debug, Clone, PartialEq)]
pub struct StateProfile {
    /// 高度(km)
    ///
    /// ファイルに記録されている順番で、並べ替えない。
    pub altitudes: Vec<f32>,

    /// 高度ごとに`StateParam::ALL`の順番で並べた物理量
    pub rows: Vec<[f32; STATE_PARAM_COUNT]>,
}

impl StateProfile {
    /// 生の行列から、列の対応表にしたがって物理量を取り出す。
    ///
    /// 先頭の列は高度である。
    pub(crate) fn from_raw(data: &RawMatrix, columns: &[usize; STATE_PARAM_COUNT]) -> Self {
        let altitudes = data.column(0);
        let rows = data
            .iter_rows()
            .map(|row| std::array::from_fn(|i| row[columns[i]]))
            .collect();

        Self { altitudes, rows }
    }

    /// 物理量の値を高度順に返す。
    pub fn column(&self, param: StateParam) -> Vec<f32> {
        self.rows.iter().map(|row| row[param.index()]).collect()
    }

    /// 指定した高度位置の物理量を返す。
    pub fn value(&self, altitude_index: usize, param: StateParam) -> Option<f32> {
        self.rows.get(altitude_index).map(|row| row[param.index()])
    }
}

/// シミュレーション出力の1時刻分のレコード
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    /// 時刻（UTC）
    pub time: OffsetDateTime,

    /// 太陽天頂角
    pub chi: f32,

    /// レコードの形式
    pub version: FormatVersion,

    /// 高度ごとの物理量
    pub profile: StateProfile,
}

impl StateRecord {
    /// ISRパラメーターを計算する。
    pub fn isr(&self) -> IsrProfile {
        derive_isr(&self.profile.altitudes, &self.profile.rows, self.version)
    }
}

/// シミュレーション出力ファイル(transcar_output)のレコードを先頭から順に返すイテレーター
///
/// レコード数はファイル・サイズをレコードのバイト数で割って求め、余りのバイトは無視する。
/// レコードの読み込みに失敗した場合は、エラーを返した後に終了する。
#[derive(Debug)]
pub struct StateSeriesReader {
    /// パス
    path: Rc<PathBuf>,
    /// ファイル・リーダー
    reader: FileReader,
    /// レコードの構造
    ///
    /// ファイルがヘッダより短い場合は`None`
    layout: Option<RecordLayout>,
    /// レコード数
    number_of_records: usize,
    /// 次に読み込むレコードの位置
    next_record: usize,
    /// 読み込みに失敗したか
    failed: bool,
}

impl StateSeriesReader {
    /// シミュレーション出力ファイルを開く。
    ///
    /// 最初のレコードのヘッダからレコードの構造を決定する。
    ///
    /// # 引数
    ///
    /// * `path` - シミュレーション出力ファイルのパス
    ///
    /// # 戻り値
    ///
    /// `StateSeriesReader`
    pub fn open<P>(path: P) -> ReaderResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = Rc::new(path.as_ref().to_owned());
        let file = OpenOptions::new()
            .read(true)
            .open(path.as_path())
            .map_err(|e| ReaderError::Open(format!("{}: {e}", path.display())))?;
        let file_size = file
            .metadata()
            .map_err(|e| {
                ReaderError::Unexpected(format!(
                    "{}のファイル・サイズを取得できませんでした。{e}",
                    path.display()
                ))
            })?
            .len() as usize;
        let mut reader = BufReader::new(file);

        if file_size < HEADER_WORDS * ELEMENT_BYTES {
            debug!(path = ?path, file_size, "file shorter than one header, no records");
            return Ok(Self::empty(path, reader));
        }

        let words = read_f32_words(&mut reader, HEADER_WORDS)
            .map_err(|e| e.with_context(&path, "最初のレコードのヘッダ"))?;
        // 1レコードに満たないファイルは、ヘッダを検証せずに空とみなす
        if let Some(record_bytes) = declared_counts(&words)
            .and_then(|(nx, ncol)| checked_record_bytes(ncol, nx))
            .filter(|bytes| file_size < *bytes)
        {
            debug!(
                path = ?path,
                file_size,
                record_bytes,
                "file shorter than one record, no records"
            );
            return Ok(Self::empty(path, reader));
        }
        let header = decode_header(&words)
            .map_err(|e| e.with_context(&path, "最初のレコードのヘッダ"))?;
        let layout = RecordLayout::from_header(&header)
            .map_err(|e| e.with_context(&path, "最初のレコードのヘッダ"))?;
        let number_of_records = file_size / layout.record_bytes();
        reader.seek(SeekFrom::Start(0)).map_err(|e| {
            ReaderError::Unexpected(format!(
                "{}の先頭へのシークに失敗しました。{e}",
                path.display()
            ))
        })?;
        debug!(
            path = ?path,
            nx = layout.nx,
            ncol = layout.ncol,
            records = number_of_records,
            "opened simulation output"
        );

        Ok(Self {
            path,
            reader,
            layout: Some(layout),
            number_of_records,
            next_record: 0,
            failed: false,
        })
    }

    fn empty(path: Rc<PathBuf>, reader: FileReader) -> Self {
        Self {
            path,
            reader,
            layout: None,
            number_of_records: 0,
            next_record: 0,
            failed: false,
        }
    }

    /// レコードの構造を返す。
    pub fn layout(&self) -> Option<&RecordLayout> {
        self.layout.as_ref()
    }

    /// レコード数を返す。
    pub fn number_of_records(&self) -> usize {
        self.number_of_records
    }

    /// パスを返す。
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn read_record(&mut self, layout: RecordLayout) -> ReaderResult<StateRecord> {
        let index = self.next_record;
        let offset = index * layout.record_bytes();
        let context = format!("{index}番目のレコード(オフセット{offset}バイト)");

        let head = read_f32_words(&mut self.reader, layout.header_width)
            .map_err(|e| e.with_context(&self.path, &context))?;
        let header = decode_header(&head).map_err(|e| e.with_context(&self.path, &context))?;

        let data = read_f32_words(&mut self.reader, layout.data_width)
            .map_err(|e| e.with_context(&self.path, &context))?;
        let data = RawMatrix::from_row_major(layout.nx, layout.ncol, data)
            .map_err(|e| e.with_context(&self.path, &context))?;
        let version = header.version();

        Ok(StateRecord {
            time: header.time,
            chi: header.chi,
            version,
            profile: StateProfile::from_raw(&data, state_columns(version)),
        })
    }
}

impl Iterator for StateSeriesReader {
    type Item = ReaderResult<StateRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.number_of_records <= self.next_record {
            return None;
        }
        let layout = self.layout?;

        let result = self.read_record(layout);
        self.next_record += 1;
        if result.is_err() {
            self.failed = true;
        }

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.number_of_records.saturating_sub(self.next_record);
        (0, Some(remaining))
    }
}

/// シミュレーション出力ファイルから読み込んだレコード
#[derive(Debug, Clone, PartialEq)]
pub struct StateSeries {
    /// レコード
    ///
    /// 日時を要求した場合は、選択したレコードのみを格納する。
    pub records: Vec<StateRecord>,

    /// 要求した日時に対して選択したレコードの、ファイル内の位置
    pub selection: Option<TimeSelection>,
}

/// シミュレーション出力ファイルを読み込む。
///
/// 日時を要求した場合も、すべてのレコードを読み込んだ後で、最も近い時刻のレコードを選択する。
/// 1つでもレコードの読み込みに失敗した場合は、読み込んだレコードを破棄してエラーを返す。
///
/// # 引数
///
/// * `path` - シミュレーション出力ファイルのパス
/// * `requested` - 取り出すレコードの日時
///
/// # 戻り値
///
/// `StateSeries`
pub fn decode_state_series<P>(
    path: P,
    requested: Option<OffsetDateTime>,
) -> ReaderResult<StateSeries>
where
    P: AsRef<Path>,
{
    let reader = StateSeriesReader::open(path)?;
    let mut records = reader.collect::<ReaderResult<Vec<_>>>()?;

    let Some(requested) = requested else {
        return Ok(StateSeries {
            records,
            selection: None,
        });
    };

    let times: Vec<OffsetDateTime> = records.iter().map(|r| r.time).collect();
    let selection = nearest_time_index(&times, Some(requested));
    if let Some(selection) = &selection {
        let selected = records.swap_remove(selection.index());
        records = vec![selected];
    }

    Ok(StateSeries { records, selection })
}
