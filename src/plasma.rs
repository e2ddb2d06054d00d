//! 非干渉散乱レーダー(ISR)で観測できる量の計算
//!
//! 複数種の密度、速度、温度から、電子密度、イオン速度、イオン温度、電子温度を計算する。
//! 値は32ビット浮動小数点数のまま計算する。
//! 電子密度が0の高度では、電子密度で割る量はNaNになる。

use crate::layout::{FormatVersion, StateParam, STATE_PARAM_COUNT};

/// ISRパラメーターの名前
pub const ISR_PARAM_NAMES: [&str; 4] = ["ne", "vi", "Ti", "Te"];

/// 1高度のISRパラメーター
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsrParameters {
    /// 電子密度
    pub ne: f32,
    /// イオン速度
    pub vi: f32,
    /// イオン温度
    pub ti: f32,
    /// 電子温度
    pub te: f32,
}

impl IsrParameters {
    /// `ISR_PARAM_NAMES`の順番で値を返す。
    pub fn to_array(&self) -> [f32; 4] {
        [self.ne, self.vi, self.ti, self.te]
    }
}

/// 高度ごとのISRパラメーター
#[derive(Debug, Clone, PartialEq)]
pub struct IsrProfile {
    /// 高度(km)
    pub altitudes: Vec<f32>,
    /// 高度ごとのISRパラメーター
    pub rows: Vec<IsrParameters>,
}

/// 1高度の物理量からISRパラメーターを計算する。
///
/// # 引数
///
/// * `row` - `StateParam::ALL`の順番に並んだ物理量
/// * `version` - レコードの形式（電子温度の計算方法を決定する）
///
/// # 戻り値
///
/// ISRパラメーター
pub fn derive_row(row: &[f32; STATE_PARAM_COUNT], version: FormatVersion) -> IsrParameters {
    let v = |p: StateParam| row[p.index()];
    let (n1, n2, n3) = (v(StateParam::N1), v(StateParam::N2), v(StateParam::N3));

    let ne = n1
        + n2
        + n3
        + v(StateParam::N4)
        + v(StateParam::N5)
        + v(StateParam::N6)
        + v(StateParam::N7);
    let nm = v(StateParam::N4) + v(StateParam::N5) + v(StateParam::N6);

    let vi = (n1 * v(StateParam::V1)
        + n2 * v(StateParam::V2)
        + n3 * v(StateParam::V3)
        + nm * v(StateParam::Vm))
        / ne;

    let ti_par = (n1 * v(StateParam::T1p)
        + n2 * v(StateParam::T2p)
        + n3 * v(StateParam::T3p)
        + nm * v(StateParam::Tmp))
        / ne;
    let ti_perp = (n1 * v(StateParam::T1t)
        + n2 * v(StateParam::T2t)
        + n3 * v(StateParam::T3t)
        + nm * v(StateParam::Tmt))
        / ne;
    let ti = (1.0 / 3.0) * ti_par + (2.0 / 3.0) * ti_perp;

    let te = match version {
        FormatVersion::Transconvec13 => v(StateParam::Tep),
        FormatVersion::Legacy | FormatVersion::Extended => {
            (v(StateParam::Tep) + 2.0 * v(StateParam::Tet)) / 3.0
        }
    };

    IsrParameters { ne, vi, ti, te }
}

/// 高度ごとの物理量からISRパラメーターを計算する。
pub fn derive_isr(
    altitudes: &[f32],
    rows: &[[f32; STATE_PARAM_COUNT]],
    version: FormatVersion,
) -> IsrProfile {
    IsrProfile {
        altitudes: altitudes.to_vec(),
        rows: rows.iter().map(|row| derive_row(row, version)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(values: &[(StateParam, f32)]) -> [f32; STATE_PARAM_COUNT] {
        let mut row = [0f32; STATE_PARAM_COUNT];
        for (p, v) in values {
            row[p.index()] = *v;
        }
        row
    }

    #[test]
    fn zero_density_propagates_nan() {
        let row = row_with(&[(StateParam::V1, 100.0), (StateParam::T1p, 1000.0)]);
        let isr = derive_row(&row, FormatVersion::Transconvec13);
        assert_eq!(isr.ne, 0.0);
        assert!(isr.vi.is_nan());
        assert!(isr.ti.is_nan());
        assert!(!isr.te.is_nan());
    }

    #[test]
    fn equal_species_velocity() {
        let row = row_with(&[
            (StateParam::N1, 1.0),
            (StateParam::N2, 1.0),
            (StateParam::N3, 1.0),
            (StateParam::V1, 10.0),
            (StateParam::V2, 10.0),
            (StateParam::V3, 10.0),
        ]);
        let isr = derive_row(&row, FormatVersion::Legacy);
        assert_eq!(isr.ne, 3.0);
        assert_eq!(isr.vi, 10.0);
    }

    #[test]
    fn minor_species_are_lumped() {
        // n7は電子密度に寄与するが、速度と温度には寄与しない
        let row = row_with(&[
            (StateParam::N1, 2.0),
            (StateParam::N4, 1.0),
            (StateParam::N5, 0.5),
            (StateParam::N6, 0.5),
            (StateParam::N7, 4.0),
            (StateParam::V1, 8.0),
            (StateParam::Vm, -4.0),
            (StateParam::T1p, 900.0),
            (StateParam::T1t, 1200.0),
            (StateParam::Tmp, 600.0),
            (StateParam::Tmt, 300.0),
        ]);
        let isr = derive_row(&row, FormatVersion::Transconvec13);
        assert_eq!(isr.ne, 8.0);
        // (2*8 + 2*(-4)) / 8
        assert_eq!(isr.vi, 1.0);
        // par: (2*900 + 2*600)/8 = 375, perp: (2*1200 + 2*300)/8 = 375
        let expected = (1.0f32 / 3.0) * 375.0 + (2.0f32 / 3.0) * 375.0;
        assert_eq!(isr.ti, expected);
    }

    #[test]
    fn electron_temperature_by_version() {
        let row = row_with(&[(StateParam::Tep, 3000.0), (StateParam::Tet, 1500.0)]);
        assert_eq!(derive_row(&row, FormatVersion::Transconvec13).te, 3000.0);
        assert_eq!(derive_row(&row, FormatVersion::Legacy).te, 2000.0);
        assert_eq!(derive_row(&row, FormatVersion::Extended).te, 2000.0);
    }

    #[test]
    fn profile_keeps_altitudes() {
        let rows = [
            row_with(&[(StateParam::N1, 1.0)]),
            row_with(&[(StateParam::N2, 2.0)]),
        ];
        let profile = derive_isr(&[100.0, 120.0], &rows, FormatVersion::Legacy);
        assert_eq!(profile.altitudes, vec![100.0, 120.0]);
        assert_eq!(profile.rows.len(), 2);
        assert_eq!(profile.rows[1].ne, 2.0);
        assert_eq!(profile.rows[1].to_array()[0], 2.0);
    }
}
