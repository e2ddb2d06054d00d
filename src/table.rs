use crate::errors::{ReaderError, ReaderResult};

/// 高度方向を行、列を物理量とした生の値の行列
///
/// 値は高度優先（行優先）で格納する。
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl RawMatrix {
    /// 行優先で並んだ値から行列を構築する。
    ///
    /// # 引数
    ///
    /// * `rows` - 行の数
    /// * `cols` - 列の数
    /// * `values` - 行優先で並んだ値
    ///
    /// # 戻り値
    ///
    /// `RawMatrix`
    pub fn from_row_major(rows: usize, cols: usize, values: Vec<f32>) -> ReaderResult<Self> {
        if cols == 0 {
            return Err(ReaderError::LayoutMismatch(
                "列の数が0の行列は構築できません。".to_string(),
            ));
        }
        if values.len() != rows * cols {
            return Err(ReaderError::LayoutMismatch(format!(
                "値の数{}が{rows}行{cols}列と一致しません。",
                values.len()
            )));
        }

        Ok(Self { rows, cols, values })
    }

    /// 行の数を返す。
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 列の数を返す。
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 行を返す。
    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// 行を順に返すイテレーターを返す。
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.values.chunks_exact(self.cols)
    }

    /// 値を返す。
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if self.rows <= row || self.cols <= col {
            return None;
        }
        Some(self.values[row * self.cols + col])
    }

    /// 列の値を高度順に返す。
    pub fn column(&self, col: usize) -> Vec<f32> {
        self.iter_rows().map(|row| row[col]).collect()
    }

    /// 行優先で並んだすべての値を返す。
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_columns() {
        let m = RawMatrix::from_row_major(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(0), vec![1.0, 4.0]);
        assert_eq!(m.get(0, 2), Some(3.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn value_count_must_match_shape() {
        assert!(matches!(
            RawMatrix::from_row_major(2, 3, vec![0.0; 5]),
            Err(ReaderError::LayoutMismatch(_))
        ));
    }
}
