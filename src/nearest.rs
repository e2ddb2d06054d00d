use time::OffsetDateTime;
use tracing::warn;

/// 要求された日時に対して選択した時刻の位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSelection {
    /// 要求された日時に最も近い時刻
    Nearest { index: usize },

    /// 要求された日時が記録されている時刻の範囲外であったため、最も近い端の時刻を代わりに選択した。
    OutOfRange { index: usize, diagnostic: String },

    /// 日時が要求されなかったため、最後の時刻を選択した。
    Latest { index: usize },
}

impl TimeSelection {
    /// 選択した時刻の位置を返す。
    pub fn index(&self) -> usize {
        match self {
            Self::Nearest { index } | Self::OutOfRange { index, .. } | Self::Latest { index } => {
                *index
            }
        }
    }

    /// 代替の時刻を選択した理由を返す。
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::OutOfRange { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// 要求された日時に最も近い時刻の位置を返す。
///
/// 時刻は昇順に並んでいることを想定しているが、同じ時刻が連続していてもよい。
/// 差が等しい時刻が複数ある場合は、最初の時刻を選択する。
/// 日時が要求されていない場合は、最後の時刻を選択する。
///
/// # 引数
///
/// * `times` - 時刻
/// * `requested` - 要求された日時
///
/// # 戻り値
///
/// 選択した時刻の位置。時刻が1つもない場合は`None`
pub fn nearest_time_index(
    times: &[OffsetDateTime],
    requested: Option<OffsetDateTime>,
) -> Option<TimeSelection> {
    let last = times.len().checked_sub(1)?;
    let Some(requested) = requested else {
        return Some(TimeSelection::Latest { index: last });
    };

    let mut index = 0;
    let mut min_diff = (times[0] - requested).abs();
    for (i, t) in times.iter().enumerate().skip(1) {
        let diff = (*t - requested).abs();
        if diff < min_diff {
            index = i;
            min_diff = diff;
        }
    }

    let first = times[0];
    let end = times[last];
    if requested < first.min(end) || first.max(end) < requested {
        let diagnostic = format!(
            "要求された日時{requested}は記録されている時刻{first}から{end}の範囲外です。{}を使用します。",
            times[index]
        );
        warn!(%requested, used = %times[index], "requested time outside available range");
        return Some(TimeSelection::OutOfRange { index, diagnostic });
    }

    Some(TimeSelection::Nearest { index })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn times() -> Vec<OffsetDateTime> {
        vec![
            datetime!(2013-03-31 09:00 UTC),
            datetime!(2013-03-31 09:00:30 UTC),
            datetime!(2013-03-31 09:01 UTC),
        ]
    }

    #[test]
    fn exact_match_is_selected() {
        let selection = nearest_time_index(&times(), Some(datetime!(2013-03-31 09:00:30 UTC)));
        assert_eq!(selection, Some(TimeSelection::Nearest { index: 1 }));
    }

    #[test]
    fn missing_request_selects_last() {
        let selection = nearest_time_index(&times(), None).unwrap();
        assert_eq!(selection, TimeSelection::Latest { index: 2 });
        assert_eq!(selection.diagnostic(), None);
    }

    #[test]
    fn request_before_first_falls_back_to_first() {
        let selection =
            nearest_time_index(&times(), Some(datetime!(2013-03-31 08:00 UTC))).unwrap();
        assert_eq!(selection.index(), 0);
        assert!(matches!(selection, TimeSelection::OutOfRange { .. }));
        assert!(selection.diagnostic().is_some());

        let selection =
            nearest_time_index(&times(), Some(datetime!(2013-03-31 10:00 UTC))).unwrap();
        assert_eq!(selection.index(), 2);
    }

    #[test]
    fn ties_select_first_occurrence() {
        // 09:00:15は0番目と1番目から等距離
        let selection = nearest_time_index(&times(), Some(datetime!(2013-03-31 09:00:15 UTC)));
        assert_eq!(selection, Some(TimeSelection::Nearest { index: 0 }));

        let repeated = vec![
            datetime!(2013-03-31 09:00 UTC),
            datetime!(2013-03-31 09:01 UTC),
            datetime!(2013-03-31 09:01 UTC),
        ];
        let selection = nearest_time_index(&repeated, Some(datetime!(2013-03-31 09:00:50 UTC)));
        assert_eq!(selection, Some(TimeSelection::Nearest { index: 1 }));
    }

    #[test]
    fn empty_sequence_has_no_selection() {
        assert_eq!(nearest_time_index(&[], None), None);
        assert_eq!(
            nearest_time_index(&[], Some(datetime!(2013-03-31 09:00 UTC))),
            None
        );
    }
}
