//! シミュレーション制御ファイル(DATCAR)の読み込み
//!
//! DATCARは1行に1つの値を決まった順番で記録している。
//! 各行の最初の空白までを値とみなし、残りはコメントとして無視する。

use std::fs;
use std::path::Path;

use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::dates::{date_from_year_day, utc_from_day_seconds};
use crate::errors::{ReaderError, ReaderResult};

/// シミュレーション制御ファイルの内容
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationControl {
    pub kiappel: i32,
    /// 降下粒子ファイル名
    pub precipitation_file: String,
    pub dt_sim: f64,
    pub dt_fluid: f64,
    /// シミュレーション開始日(YYYYDDD)
    pub iyd_ini: i64,
    /// シミュレーション開始時刻（0時からの経過秒）
    pub sim_start_seconds: f64,
    /// シミュレーション終了時刻（0時からの経過秒）
    pub sim_length_seconds: f64,
    pub jpreci: i32,
    /// 地理緯度と地理経度（度）
    pub latitude_geo: f64,
    pub longitude_geo: f64,
    /// 降下粒子の前後の対流時間
    pub temps_conv_before: f64,
    pub temps_conv: f64,
    pub step: f64,
    pub dt_kinetic: f64,
    pub v_para_b: f64,
    /// F10.7太陽電波指数（当日値と平均値）
    pub f107_index: f64,
    pub f107_average: f64,
    /// Ap指数
    pub ap_index: f64,
    /// 対流電場(mV/m)
    pub convection_efield: f64,
    /// 衝突係数
    pub cof_o: f64,
    pub cof_n2: f64,
    pub cof_o2: f64,
    pub cof_n: f64,
    pub cof_h: f64,
    pub e_top_flux: f64,
    /// 降下粒子の入力ファイル名
    pub precipitation_input_file: String,
    pub precint: i32,
    pub precext: i32,
    /// 降下粒子の開始時刻と終了時刻（0時からの経過秒）
    pub precip_start_seconds: f64,
    pub precip_end_seconds: f64,

    /// シミュレーション日
    pub day_of_sim: Date,
    /// シミュレーションの開始日時と終了日時（UTC）
    pub start_sim: OffsetDateTime,
    pub end_sim: OffsetDateTime,
    /// 降下粒子の開始日時と終了日時（UTC）
    pub start_precip: OffsetDateTime,
    pub end_precip: OffsetDateTime,
}

/// 要求された日時の検証結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedTime {
    /// 降下粒子の期間内
    Within(OffsetDateTime),

    /// 降下粒子の期間外であったため、降下粒子の終了日時を代わりに使用する。
    Fallback {
        time: OffsetDateTime,
        diagnostic: String,
    },

    /// 日時が要求されていない
    Unspecified,
}

impl RequestedTime {
    /// 使用する日時を返す。
    pub fn time(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Within(t) | Self::Fallback { time: t, .. } => Some(*t),
            Self::Unspecified => None,
        }
    }
}

impl SimulationControl {
    /// 要求された日時が降下粒子の期間内にあるか確認する。
    ///
    /// 期間外の場合は、降下粒子の終了日時を代わりに使用する。
    pub fn check_request(&self, requested: Option<OffsetDateTime>) -> RequestedTime {
        let Some(requested) = requested else {
            return RequestedTime::Unspecified;
        };
        if self.start_precip < requested && requested < self.end_precip {
            return RequestedTime::Within(requested);
        }

        info!(start = %self.start_precip, end = %self.end_precip, "precipitation period");
        warn!(
            %requested,
            fallback = %self.end_precip,
            "requested time outside precipitation period, using precipitation end"
        );
        RequestedTime::Fallback {
            time: self.end_precip,
            diagnostic: format!(
                "要求された日時{requested}は降下粒子の期間{}から{}の範囲外です。",
                self.start_precip, self.end_precip
            ),
        }
    }
}

/// 行ごとの値を順に取り出す。
struct Lines<'a> {
    lines: std::str::Lines<'a>,
    number: usize,
}

impl<'a> Lines<'a> {
    fn token(&mut self, name: &str) -> ReaderResult<&'a str> {
        self.number += 1;
        let line = self.lines.next().ok_or_else(|| {
            ReaderError::MalformedControlFile(format!("{}行目({name})がありません。", self.number))
        })?;

        line.split_whitespace().next().ok_or_else(|| {
            ReaderError::MalformedControlFile(format!("{}行目({name})が空です。", self.number))
        })
    }

    fn string(&mut self, name: &str) -> ReaderResult<String> {
        Ok(self.token(name)?.to_string())
    }

    fn float(&mut self, name: &str) -> ReaderResult<f64> {
        let token = self.token(name)?;
        token.parse::<f64>().map_err(|e| {
            ReaderError::MalformedControlFile(format!(
                "{}行目({name})の値`{token}`を数値に変換できません。{e}",
                self.number
            ))
        })
    }

    fn int<T>(&mut self, name: &str) -> ReaderResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let token = self.token(name)?;
        token.parse::<T>().map_err(|e| {
            ReaderError::MalformedControlFile(format!(
                "{}行目({name})の値`{token}`を整数に変換できません。{e}",
                self.number
            ))
        })
    }

    fn pair(&mut self, name: &str) -> ReaderResult<(f64, f64)> {
        let token = self.token(name)?;
        let parts = token
            .split(',')
            .map(|s| s.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| {
                ReaderError::MalformedControlFile(format!(
                    "{}行目({name})の値`{token}`を数値に変換できません。{e}",
                    self.number
                ))
            })?;
        match parts[..] {
            [a, b] => Ok((a, b)),
            _ => Err(ReaderError::MalformedControlFile(format!(
                "{}行目({name})の値`{token}`はカンマで区切った2つの値である必要があります。",
                self.number
            ))),
        }
    }
}

/// シミュレーション制御ファイルの内容を解析する。
///
/// # 引数
///
/// * `text` - シミュレーション制御ファイルの内容
///
/// # 戻り値
///
/// `SimulationControl`
pub fn parse_datcar(text: &str) -> ReaderResult<SimulationControl> {
    let mut lines = Lines {
        lines: text.lines(),
        number: 0,
    };

    let kiappel = lines.int("kiappel")?;
    let precipitation_file = lines.string("precfile")?;
    let dt_sim = lines.float("dtsim")?;
    let dt_fluid = lines.float("dtfluid")?;
    let iyd_ini: i64 = lines.int("iyd_ini")?;
    let day_line = lines.number;
    let sim_start_seconds = lines.float("tempsini")?;
    let sim_length_seconds = lines.float("tempslim")?;
    let jpreci = lines.int("jpreci")?;
    let (latitude_geo, longitude_geo) = lines.pair("latgeo_ini,longeo_ini")?;
    let temps_conv_before = lines.float("tempsconv_1")?;
    let temps_conv = lines.float("tempsconv")?;
    let step = lines.float("step")?;
    let dt_kinetic = lines.float("dtkinetic")?;
    let v_para_b = lines.float("vparaB")?;
    let f107_index = lines.float("f107ind")?;
    let f107_average = lines.float("f107avg")?;
    let ap_index = lines.float("apind")?;
    let convection_efield = lines.float("convecEfield")?;
    let cof_o = lines.float("cofo")?;
    let cof_n2 = lines.float("cofn2")?;
    let cof_o2 = lines.float("cofo2")?;
    let cof_n = lines.float("cofn")?;
    let cof_h = lines.float("cofh")?;
    let e_top_flux = lines.float("etopflux")?;
    let precipitation_input_file = lines.string("precinfn")?;
    let precint = lines.int("precint")?;
    let precext = lines.int("precext")?;
    let precip_start_seconds = lines.float("precipstart")?;
    let precip_end_seconds = lines.float("precipend")?;

    let day_of_sim = date_from_year_day(iyd_ini).map_err(|e| {
        ReaderError::MalformedControlFile(format!("{day_line}行目(iyd_ini): {e}"))
    })?;
    let instant = |seconds: f64, name: &str| {
        utc_from_day_seconds(day_of_sim, seconds)
            .map_err(|e| ReaderError::MalformedControlFile(format!("{name}: {e}")))
    };

    Ok(SimulationControl {
        kiappel,
        precipitation_file,
        dt_sim,
        dt_fluid,
        iyd_ini,
        sim_start_seconds,
        sim_length_seconds,
        jpreci,
        latitude_geo,
        longitude_geo,
        temps_conv_before,
        temps_conv,
        step,
        dt_kinetic,
        v_para_b,
        f107_index,
        f107_average,
        ap_index,
        convection_efield,
        cof_o,
        cof_n2,
        cof_o2,
        cof_n,
        cof_h,
        e_top_flux,
        precipitation_input_file,
        precint,
        precext,
        precip_start_seconds,
        precip_end_seconds,
        day_of_sim,
        start_sim: instant(sim_start_seconds, "tempsini")?,
        // 終了日時は開始日時ではなく、シミュレーション日の0時を起点とする
        end_sim: instant(sim_length_seconds, "tempslim")?,
        start_precip: instant(precip_start_seconds, "precipstart")?,
        end_precip: instant(precip_end_seconds, "precipend")?,
    })
}

/// シミュレーション制御ファイルを読み込む。
pub fn read_datcar<P>(path: P) -> ReaderResult<SimulationControl>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ReaderError::Open(format!("{}: {e}", path.display())))?;

    parse_datcar(&text).map_err(|e| e.with_context(path, "DATCAR"))
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    const DATCAR: &str = "\
0           kiappel
precip.dat  precipitation file
5.          dto
60.         sortie
2013090     iyd_ini
28800.      tempsini
36000.      tempslim
1           jpreci
65.12,-147.43   latgeo_ini,longeo_ini
600.        tempsconv_1
600.        tempsconv
1.          step
30.         postinto
0.          vparaB
120.        f107ind
118.        f107avg
7.          apind
50.         convecEfield
1.          cofo
1.          cofn2
1.          cofo2
1.          cofn
1.          cofh
0.          etopflux
dir.input/precinput.dat   precinfn
1           precint
0           precext
30000.      precipstart
33000.      precipend
";

    #[test]
    fn parse_positional_lines() {
        let control = parse_datcar(DATCAR).unwrap();
        assert_eq!(control.kiappel, 0);
        assert_eq!(control.precipitation_file, "precip.dat");
        assert_eq!(control.iyd_ini, 2013090);
        assert_eq!(control.day_of_sim, date!(2013 - 03 - 31));
        assert_eq!(control.latitude_geo, 65.12);
        assert_eq!(control.longitude_geo, -147.43);
        assert_eq!(control.f107_index, 120.0);
        assert_eq!(control.precipitation_input_file, "dir.input/precinput.dat");
        assert_eq!(control.precint, 1);
        assert_eq!(control.start_sim, datetime!(2013-03-31 08:00 UTC));
        assert_eq!(control.end_sim, datetime!(2013-03-31 10:00 UTC));
        assert_eq!(control.start_precip, datetime!(2013-03-31 08:20 UTC));
        assert_eq!(control.end_precip, datetime!(2013-03-31 09:10 UTC));
    }

    #[test]
    fn missing_line_reports_line_number() {
        let truncated: String = DATCAR.lines().take(10).collect::<Vec<_>>().join("\n");
        match parse_datcar(&truncated) {
            Err(ReaderError::MalformedControlFile(m)) => assert!(m.contains("11行目")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn bad_coordinate_pair_is_rejected() {
        let text = DATCAR.replace("65.12,-147.43", "65.12");
        assert!(matches!(
            parse_datcar(&text),
            Err(ReaderError::MalformedControlFile(_))
        ));
    }

    #[test]
    fn request_inside_precipitation_is_kept() {
        let control = parse_datcar(DATCAR).unwrap();
        let t = datetime!(2013-03-31 09:00:30 UTC);
        assert_eq!(control.check_request(Some(t)), RequestedTime::Within(t));
        assert_eq!(control.check_request(None), RequestedTime::Unspecified);
        assert_eq!(RequestedTime::Unspecified.time(), None);
    }

    #[test]
    fn request_outside_precipitation_falls_back_to_end() {
        let control = parse_datcar(DATCAR).unwrap();
        for t in [
            datetime!(2013-03-31 08:00 UTC),
            datetime!(2013-03-31 08:20 UTC),
            datetime!(2013-03-31 11:00 UTC),
        ] {
            let checked = control.check_request(Some(t));
            assert!(matches!(checked, RequestedTime::Fallback { .. }));
            assert_eq!(checked.time(), Some(control.end_precip));
        }
    }
}
