//! Transcar電離圏シミュレーターの出力ファイルを読み込むライブラリ
//!
//! * シミュレーション出力ファイル(transcar_output): [`decode_state_series`]
//! * 初期状態ファイル: [`decode_initial_condition`]
//! * 励起率ファイル(emissions.dat): [`decode_excitation_rates`]
//! * シミュレーション制御ファイル(DATCAR): [`read_datcar`]

mod binary;
mod dates;

pub mod datcar;
pub mod errors;
pub mod excitation;
pub mod header;
pub mod initial;
pub mod layout;
pub mod nearest;
pub mod plasma;
pub mod state;
pub mod table;

pub use binary::ELEMENT_BYTES;
pub use datcar::{parse_datcar, read_datcar, RequestedTime, SimulationControl};
pub use errors::{ReaderError, ReaderResult};
pub use excitation::{
    decode_excitation_rates, parse_excitation_rates, ExcitationRates, PrecipitationBin, Reaction,
};
pub use header::{decode_header, IonoHeader, HEADER_WORDS};
pub use initial::{decode_initial_condition, InitialCondition, InitialConditionTable};
pub use layout::{FormatVersion, InitParam, RecordLayout, StateParam};
pub use nearest::{nearest_time_index, TimeSelection};
pub use plasma::{derive_isr, IsrParameters, IsrProfile};
pub use state::{decode_state_series, StateProfile, StateRecord, StateSeries, StateSeriesReader};
pub use table::RawMatrix;
