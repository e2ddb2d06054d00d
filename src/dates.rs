use time::{Date, Duration, OffsetDateTime};

/// 日付に加算できる経過秒の絶対値の上限
const MAX_OFFSET_SECONDS: f64 = 1.0e10;

/// `YYYYDDD`形式（年と通日）の値から日付を構築する。
///
/// # 引数
///
/// * `year_day` - 年 * 1000 + 通日
///
/// # 戻り値
///
/// 日付
pub(crate) fn date_from_year_day(year_day: i64) -> Result<Date, String> {
    if year_day <= 0 {
        return Err(format!("年と通日`{year_day}`が負またはゼロです。"));
    }
    let year = year_day / 1000;
    let ordinal = year_day % 1000;
    let year = i32::try_from(year).map_err(|e| format!("年`{year}`が範囲外です。{e}"))?;
    let ordinal =
        u16::try_from(ordinal).map_err(|e| format!("通日`{ordinal}`が範囲外です。{e}"))?;

    Date::from_ordinal_date(year, ordinal)
        .map_err(|e| format!("年`{year}`と通日`{ordinal}`から日付を構築できませんでした。{e}"))
}

/// 年と通日、その日の0時からの経過秒からUTC日時を構築する。
///
/// 年と通日は浮動小数点数で記録されているため、整数部のみを使用する。
pub(crate) fn utc_from_year_day_seconds(
    year_day: f64,
    seconds_of_day: f64,
) -> Result<OffsetDateTime, String> {
    if !year_day.is_finite()
        || !seconds_of_day.is_finite()
        || MAX_OFFSET_SECONDS < seconds_of_day.abs()
    {
        return Err(format!(
            "年と通日`{year_day}`または経過秒`{seconds_of_day}`が扱える範囲にありません。"
        ));
    }
    let date = date_from_year_day(year_day.trunc() as i64)?;

    utc_from_day_seconds(date, seconds_of_day)
}

/// 日の0時からの経過秒をUTC日時に変換する。
pub(crate) fn utc_from_day_seconds(day: Date, seconds: f64) -> Result<OffsetDateTime, String> {
    if !seconds.is_finite() || MAX_OFFSET_SECONDS < seconds.abs() {
        return Err(format!("経過秒`{seconds}`が扱える範囲にありません。"));
    }

    day.midnight()
        .assume_utc()
        .checked_add(Duration::seconds_f64(seconds))
        .ok_or_else(|| format!("{day}に経過秒`{seconds}`を加算できません。"))
}
