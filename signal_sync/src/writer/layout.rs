//! Destination row layouts per record shape.

use diesel::SqliteConnection;
use market_feeds::models::{
    feed_kind::FeedKind, record::MarketRecord, resource::ResourceDescriptor,
};
use market_feeds::tz::format_sql;
use serde_json::{Map, Value, json};

use crate::db::{catalog::table_columns, ident::Ident};
use crate::writer::WriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    Indicator,
    FxBar,
}

impl Shape {
    fn of(record: &MarketRecord) -> Self {
        match record {
            MarketRecord::Scalar { .. } => Self::Scalar,
            MarketRecord::Indicator { .. } => Self::Indicator,
            MarketRecord::FxBar { .. } => Self::FxBar,
        }
    }
}

/// Ordered destination columns; the first `key_len` form the conflict key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    shape: Shape,
    columns: Vec<Ident>,
    key_len: usize,
}

impl RowLayout {
    /// `Timestamp` plus one value column, keyed by `Timestamp`.
    pub fn scalar(value_column: Ident) -> Self {
        Self {
            shape: Shape::Scalar,
            columns: vec![Ident::trusted("Timestamp"), value_column],
            key_len: 1,
        }
    }

    /// Indicator rows, keyed by `(Timestamp, Symbol)`; the value column is `{FUNCTION}_Value`.
    pub fn indicator(function: &str) -> Result<Self, WriteError> {
        let value = Ident::parse(&format!("{function}_Value"))?;
        Ok(Self {
            shape: Shape::Indicator,
            columns: vec![
                Ident::trusted("Timestamp"),
                Ident::trusted("Symbol"),
                value,
                Ident::trusted("Interval"),
                Ident::trusted("TimePeriod"),
                Ident::trusted("SeriesType"),
            ],
            key_len: 2,
        })
    }

    /// OHLC rows, keyed by `(Timestamp, FromSymbol, ToSymbol)`.
    pub fn fx_bar() -> Self {
        Self {
            shape: Shape::FxBar,
            columns: ["Timestamp", "FromSymbol", "ToSymbol", "OpenPrice", "HighPrice", "LowPrice", "ClosePrice"]
                .into_iter()
                .map(Ident::trusted)
                .collect(),
            key_len: 3,
        }
    }

    pub fn columns(&self) -> &[Ident] {
        &self.columns
    }

    pub fn key(&self) -> &[Ident] {
        &self.columns[..self.key_len]
    }

    pub fn non_key(&self) -> impl Iterator<Item = &Ident> {
        self.columns[self.key_len..].iter()
    }

    /// One JSON row object keyed by column name.
    pub fn row(&self, record: &MarketRecord) -> Result<Value, WriteError> {
        if Shape::of(record) != self.shape {
            return Err(WriteError::DataShape(format!(
                "{:?} record cannot be written with a {:?} layout",
                Shape::of(record),
                self.shape
            )));
        }
        let values = match record {
            MarketRecord::Scalar { timestamp, value } => vec![json!(format_sql(*timestamp)), json!(value)],
            MarketRecord::Indicator { timestamp, symbol, value, interval, time_period, series_type } => vec![
                json!(format_sql(*timestamp)),
                json!(symbol),
                json!(value),
                json!(interval),
                json!(time_period),
                json!(series_type),
            ],
            MarketRecord::FxBar { timestamp, from_symbol, to_symbol, open, high, low, close } => vec![
                json!(format_sql(*timestamp)),
                json!(from_symbol),
                json!(to_symbol),
                json!(open),
                json!(high),
                json!(low),
                json!(close),
            ],
        };
        let row: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| c.as_str().to_string())
            .zip(values)
            .collect();
        Ok(Value::Object(row))
    }
}

/// Work out where `kind` records land in `table`.
///
/// Economic series discover their value column: apart from a surrogate `id`,
/// the table must hold exactly two columns, `Timestamp` first.
pub fn resolve_layout(
    conn: &mut SqliteConnection,
    kind: FeedKind,
    resource: &ResourceDescriptor,
    table: &Ident,
) -> Result<RowLayout, WriteError> {
    match kind {
        FeedKind::Commodity => Ok(RowLayout::scalar(Ident::trusted("ClosePrice"))),
        FeedKind::FxIntraday | FeedKind::FxDaily => Ok(RowLayout::fx_bar()),
        FeedKind::TechnicalIndicator => {
            let function = resource.function_upper().ok_or_else(|| {
                WriteError::DataShape(format!("{} has no api_function", resource.name))
            })?;
            RowLayout::indicator(&function)
        }
        FeedKind::EconomicSeries => {
            let columns: Vec<String> = table_columns(conn, table)?
                .into_iter()
                .filter(|c| !c.eq_ignore_ascii_case("id"))
                .collect();
            match columns.as_slice() {
                [ts, value] if ts.eq_ignore_ascii_case("Timestamp") => {
                    Ok(RowLayout::scalar(Ident::parse(value)?))
                }
                _ => Err(WriteError::DataShape(format!(
                    "{table} must have Timestamp as its first column and exactly one value column, found {columns:?}"
                ))),
            }
        }
    }
}
