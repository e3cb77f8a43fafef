//! End-to-end behaviour of the recursive loop with stub models.

use approx::assert_relative_eq;
use ndarray::{Array1, ArrayView2};
use restock::data::{
    CalendarRow, CalendarTable, DataSet, Day, HistoryStore, Observation, PriceRow, PriceTable,
    SeriesKey, SeriesUniverse,
};
use restock::features::{FeatureBuilder, LagSet, WindowSet};
use restock::model::{Codebook, ForecastModel, ModelError, Scorer};
use restock::data::ingest::{CALENDAR_FILE, PRICES_FILE, SALES_FILE};
use restock::{
    DayReport, ForecastConfig, ForecastError, RecursiveForecastEngine, codebook_from_dir,
    prepare_engine,
};
use std::sync::atomic::{AtomicUsize, Ordering};

const IDS: [&str; 3] = [
    "FOODS_1_001_CA_1_validation",
    "FOODS_1_002_CA_1_validation",
    "HOBBIES_1_001_TX_2_validation",
];

fn universe() -> SeriesUniverse {
    SeriesUniverse::new([
        SeriesKey::new(IDS[0], "FOODS_1_001", "FOODS_1", "FOODS", "CA_1", "CA"),
        SeriesKey::new(IDS[1], "FOODS_1_002", "FOODS_1", "FOODS", "CA_1", "CA"),
        SeriesKey::new(IDS[2], "HOBBIES_1_001", "HOBBIES_1", "HOBBIES", "TX_2", "TX"),
    ])
}

fn calendar(days: impl IntoIterator<Item = Day>) -> CalendarTable {
    let rows: Vec<CalendarRow> = days
        .into_iter()
        .map(|day| CalendarRow {
            day,
            date: format!("day-{day}"),
            wm_yr_wk: 11600 + i64::from(day / 7),
            weekday: "Monday".to_string(),
            wday: 3,
            month: 5,
            year: 2016,
            event_name_1: None,
            event_type_1: None,
            event_name_2: None,
            event_type_2: None,
            snap_ca: 1,
            snap_tx: 0,
            snap_wi: 0,
        })
        .collect();
    CalendarTable::from_rows(&rows).unwrap()
}

fn prices() -> PriceTable {
    PriceTable::from_rows(&[PriceRow::new("CA_1", "FOODS_1_001", 11873, 2.5)]).unwrap()
}

/// History where every series sold `value(day)` on each day of `days`.
fn history(days: impl IntoIterator<Item = Day>, value: impl Fn(Day) -> f64) -> HistoryStore {
    HistoryStore::seed(days.into_iter().flat_map(|day| {
        let quantity = value(day);
        IDS.iter().map(move |id| Observation::new(*id, day, quantity))
    }))
    .unwrap()
}

fn builder(lags: &[Day], windows: &[usize], required: &[&str]) -> FeatureBuilder {
    FeatureBuilder::new(
        calendar(1..=2000),
        prices(),
        LagSet::new(lags.to_vec()).unwrap(),
        WindowSet::new(windows.to_vec()).unwrap(),
        required.iter().map(|s| s.to_string()).collect(),
    )
}

/// Predicts `row[0] + offset`, optionally failing on a given call.
struct EchoModel {
    names: Vec<String>,
    offset: f64,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl EchoModel {
    fn new(names: &[&str], offset: f64) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            offset,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ForecastModel for EchoModel {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(ModelError::Format("stub failure".to_string()));
        }
        Ok(rows.rows().into_iter().map(|r| r[0] + self.offset).collect())
    }
}

fn engine(
    builder: FeatureBuilder,
    model: EchoModel,
    history: HistoryStore,
    first_day: Day,
    horizon: usize,
) -> RecursiveForecastEngine<EchoModel> {
    RecursiveForecastEngine::new(
        builder,
        Scorer::new(Codebook::default()),
        model,
        history,
        universe(),
        first_day,
        horizon,
    )
    .unwrap()
}

#[test]
fn test_full_horizon_is_complete() {
    let engine = engine(
        builder(&[28, 35, 42, 49, 56], &[7, 14, 28], &["sales_lag_28", "sales_rolling_mean_7"]),
        EchoModel::new(&["sales_lag_28", "sales_rolling_mean_7"], 0.5),
        history(1814..=1913, |day| f64::from(day % 5)),
        1914,
        28,
    );
    let table = engine.run().unwrap();

    assert_eq!(table.len(), 28 * IDS.len());
    assert_eq!(table.days(), (1914..=1941).collect::<Vec<_>>());
    assert_eq!(table.series_count(), IDS.len());
    assert!(table.check_complete().is_ok());

    // Rows are ordered by day, then by universe order
    assert_eq!(table.rows()[0].series_id, IDS[0]);
    assert_eq!(table.rows()[2].series_id, IDS[2]);
    assert_eq!(table.rows()[3].day, 1915);
}

#[test]
fn test_forecast_feeds_later_lags() {
    // Day d sold d units; the model forecasts lag_3 + 1
    let engine = engine(
        builder(&[1, 3], &[7], &["sales_lag_3"]),
        EchoModel::new(&["sales_lag_3"], 1.0),
        history(1..=10, f64::from),
        11,
        6,
    );
    let table = engine.run().unwrap();
    let id = IDS[1];

    assert_eq!(table.get(id, 11), Some(9.0));
    assert_eq!(table.get(id, 12), Some(10.0));
    assert_eq!(table.get(id, 13), Some(11.0));
    // From day 14 on, lag_3 reads the engine's own forecasts
    for day in 14..=16 {
        assert_eq!(table.get(id, day), Some(table.get(id, day - 3).unwrap() + 1.0));
    }
}

#[test]
fn test_forecast_feeds_later_rolling_windows() {
    let engine = engine(
        builder(&[28], &[7], &["sales_rolling_mean_7"]),
        EchoModel::new(&["sales_rolling_mean_7"], 1.0),
        history(1..=100, |_| 2.0),
        101,
        29,
    );
    let table = engine.run().unwrap();
    let id = IDS[0];

    // Windows for days 101..=128 end on or before day 100
    for day in 101..=128 {
        assert_relative_eq!(table.get(id, day).unwrap(), 3.0, epsilon = 1e-6);
    }
    // Day 129 reads days 95..=101, the last being the first forecast
    assert_relative_eq!(table.get(id, 129).unwrap(), 15.0 / 7.0 + 1.0, epsilon = 1e-6);
}

#[test]
fn test_negative_model_output_is_clamped() {
    let engine = engine(
        builder(&[28], &[7], &["sales_lag_28"]),
        EchoModel::new(&["sales_lag_28"], -10.0),
        history(1..=40, |_| 1.0),
        41,
        5,
    );
    let table = engine.run().unwrap();
    assert!(table.rows().iter().all(|r| r.forecast == 0.0));
    assert!(table.check_complete().is_ok());
}

#[test]
fn test_rows_share_one_timestamp() {
    let engine = engine(
        builder(&[28], &[7], &["sales_lag_28"]),
        EchoModel::new(&["sales_lag_28"], 0.0),
        history(1..=40, |_| 1.0),
        41,
        4,
    );
    let table = engine.run().unwrap();
    let stamp = table.generated_at().unwrap();
    assert!(table.rows().iter().all(|r| r.generated_at == stamp));
}

#[test]
fn test_progress_reports_each_day() {
    let engine = engine(
        builder(&[28], &[7], &["sales_lag_28"]),
        EchoModel::new(&["sales_lag_28"], 0.0),
        history(1..=40, |_| 4.0),
        41,
        3,
    );
    let mut reports: Vec<DayReport> = Vec::new();
    engine.run_with_progress(|r| reports.push(r.clone())).unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].day, 41);
    assert_eq!(reports[2].position, 3);
    assert_eq!(reports[2].horizon, 3);
    assert_eq!(reports[1].series, IDS.len());
    assert_relative_eq!(reports[0].mean_forecast, 4.0);
}

#[test]
fn test_builder_failure_aborts_run() {
    let engine = engine(
        builder(&[28], &[7], &["not_a_feature"]),
        EchoModel::new(&["not_a_feature"], 0.0),
        history(1..=40, |_| 1.0),
        41,
        28,
    );
    let err = engine.run().unwrap_err();
    assert!(matches!(err, ForecastError::Build { day: 41, .. }));
}

#[test]
fn test_scorer_failure_aborts_run() {
    let mut model = EchoModel::new(&["sales_lag_28"], 0.0);
    model.fail_on_call = Some(3);
    let engine = engine(
        builder(&[28], &[7], &["sales_lag_28"]),
        model,
        history(1..=40, |_| 1.0),
        41,
        28,
    );
    let err = engine.run().unwrap_err();
    assert_eq!(err.day(), Some(43));
    assert!(matches!(err, ForecastError::Scoring { .. }));
}

#[test]
fn test_overlapping_first_day_is_a_duplicate() {
    let engine = engine(
        builder(&[28], &[7], &["sales_lag_28"]),
        EchoModel::new(&["sales_lag_28"], 0.0),
        history(1..=40, |_| 1.0),
        40,
        28,
    );
    let err = engine.run().unwrap_err();
    assert!(matches!(err, ForecastError::Append { day: 40, .. }));
}

#[test]
fn test_zero_horizon_is_rejected() {
    let result = RecursiveForecastEngine::new(
        builder(&[28], &[7], &["sales_lag_28"]),
        Scorer::new(Codebook::default()),
        EchoModel::new(&["sales_lag_28"], 0.0),
        HistoryStore::new(),
        universe(),
        1,
        0,
    );
    assert!(matches!(result, Err(ForecastError::Config(_))));
}

#[test]
fn test_prepare_engine_derives_codebook() {
    let data = DataSet {
        universe: universe(),
        history: history(1814..=1913, |_| 3.0),
        calendar: calendar(1..=2000),
        prices: prices(),
        first_forecast_day: 1914,
    };
    let config = ForecastConfig {
        horizon_days: 2,
        ..Default::default()
    };

    let model = EchoModel::new(&["sales_lag_28", "store_id"], 0.0);
    let engine = prepare_engine(data, model, &config).unwrap();
    assert_eq!(engine.first_day(), 1914);
    assert_eq!(engine.horizon(), 2);

    let table = engine.run().unwrap();
    assert_eq!(table.len(), 2 * IDS.len());
    assert!(table.rows().iter().all(|r| r.forecast == 3.0));
}

#[test]
fn test_codebook_from_dir_with_short_history() {
    let dir = tempfile::tempdir().unwrap();
    // Two day columns, well under the default history window
    std::fs::write(
        dir.path().join(SALES_FILE),
        "id,item_id,dept_id,cat_id,store_id,state_id,d_1,d_2\n\
         FOODS_1_001_CA_1_validation,FOODS_1_001,FOODS_1,FOODS,CA_1,CA,0,1\n\
         HOBBIES_1_001_TX_2_validation,HOBBIES_1_001,HOBBIES_1,HOBBIES,TX_2,TX,2,3\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(CALENDAR_FILE),
        "date,wm_yr_wk,weekday,wday,month,year,d,event_name_1,event_type_1,snap_CA\n\
         2011-01-29,11101,Saturday,1,1,2011,d_1,,,0\n\
         2011-01-30,11101,Sunday,2,1,2011,d_2,,,0\n\
         2011-01-31,11101,Monday,3,1,2011,d_3,,,0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(PRICES_FILE),
        "store_id,item_id,wm_yr_wk,sell_price\n\
         CA_1,FOODS_1_001,11101,2.0\n",
    )
    .unwrap();

    let features = vec!["sales_lag_28".to_string(), "store_id".to_string(), "weekday".to_string()];
    let codebook = codebook_from_dir(dir.path(), &features).unwrap();

    let stores = codebook.categories("store_id").unwrap();
    assert_eq!(stores, ["CA_1".to_string(), "TX_2".to_string()]);
    assert!(codebook.categories("weekday").is_some());
    assert!(codebook.categories("sales_lag_28").is_none());
}
