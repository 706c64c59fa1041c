// CSV export tests: query parsing, header, rates, percentages, time range

mod common;

use common::{Row, approx_eq, temp_repo};
use std::collections::BTreeMap;
use yams_wui::csv_export::{CsvQuery, export_csv};
use yams_wui::models::ValueKind;

const NOW_SECS: i64 = 1_700_000_000;
const NOW_MS: i64 = NOW_SECS * 1000;

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn query(plugin: &str, host: &str, items: &[(&str, &str)]) -> CsvQuery {
    CsvQuery::from_pairs(plugin, host, &pairs(items), 1).unwrap()
}

/// Parsed data rows: (timestamp, values).
fn data_rows(csv: &str) -> Vec<(i64, Vec<f64>)> {
    csv.lines()
        .skip(1)
        .map(|line| {
            let mut fields = line.split(',');
            let ts = fields.next().unwrap().parse().unwrap();
            (ts, fields.map(|f| f.parse().unwrap()).collect())
        })
        .collect()
}

#[test]
fn from_pairs_parses_filters() {
    let q = query(
        "interface",
        "web1",
        &[
            ("type", "if_octets"),
            ("type_instance", "eth0"),
            ("dsnames", "rx"),
            ("dsnames", "tx"),
            ("meta", "rack"),
            ("rack", "r1"),
            ("percentage", "1"),
            ("time_range", "6"),
        ],
    );
    assert_eq!(q.type_.as_deref(), Some("if_octets"));
    assert_eq!(q.type_instance.as_deref(), Some("eth0"));
    assert_eq!(q.plugin_instance, None);
    assert_eq!(q.dsnames, vec!["rx", "tx"]);
    assert_eq!(q.meta, vec![("rack".to_string(), "r1".to_string())]);
    assert!(q.percentage);
    assert_eq!(q.time_range_hours, 6);

    let defaults = query("load", "h", &[]);
    assert!(!defaults.percentage);
    assert_eq!(defaults.time_range_hours, 1);
    assert!(defaults.dsnames.is_empty());
}

#[test]
fn from_pairs_rejects_bad_input() {
    let err = CsvQuery::from_pairs("disk", "h", &pairs(&[("meta", "rack")]), 1).unwrap_err();
    assert!(err.to_string().contains("rack"));
    assert!(CsvQuery::from_pairs("disk", "h", &pairs(&[("time_range", "0")]), 1).is_err());
    assert!(CsvQuery::from_pairs("disk", "h", &pairs(&[("time_range", "abc")]), 1).is_err());
    assert!(!query("disk", "h", &[("percentage", "true")]).percentage);
    let err = CsvQuery::from_pairs(
        "disk",
        "h",
        &pairs(&[("meta", "po\"ol"), ("po\"ol", "fast")]),
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("must not contain"));
}

#[tokio::test]
async fn export_writes_header_and_rates_dropping_first_row() {
    let (_dir, repo) = temp_repo().await;
    let eth0 = Row::new("web.example", "interface", "if_octets").type_instance("eth0");
    repo.save_value_lists(&[
        eth0.at(NOW_SECS - 30, &[("rx", ValueKind::Derive, 100.0), ("tx", ValueKind::Derive, 10.0)]),
        eth0.at(NOW_SECS - 20, &[("rx", ValueKind::Derive, 150.0), ("tx", ValueKind::Derive, 20.0)]),
        eth0.at(NOW_SECS - 10, &[("rx", ValueKind::Derive, 250.0), ("tx", ValueKind::Derive, 40.0)]),
    ])
    .await
    .unwrap();

    let q = query("interface", "web.example", &[("type", "if_octets"), ("type_instance", "eth0")]);
    let csv = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    let expected = format!(
        "timestamp,web_example.interface.if_octets.eth0.rx,web_example.interface.if_octets.eth0.tx\n{},50,10\n{},100,20\n",
        (NOW_SECS - 20) * 1000,
        (NOW_SECS - 10) * 1000
    );
    assert_eq!(csv, expected);
}

#[tokio::test]
async fn export_keeps_gauges_and_filters_dsnames() {
    let (_dir, repo) = temp_repo().await;
    let load = Row::new("h", "load", "load");
    let sources = |v: f64| {
        [
            ("shortterm", ValueKind::Gauge, v),
            ("midterm", ValueKind::Gauge, v + 1.0),
        ]
    };
    repo.save_value_lists(&[
        load.at(NOW_SECS - 20, &sources(0.5)),
        load.at(NOW_SECS - 10, &sources(1.5)),
    ])
    .await
    .unwrap();

    let q = query("load", "h", &[("type", "load"), ("dsnames", "midterm")]);
    let csv = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("timestamp,h.load.load.midterm"));
    assert_eq!(data_rows(&csv), vec![((NOW_SECS - 10) * 1000, vec![2.5])]);
}

#[tokio::test]
async fn export_time_range_limits_rows() {
    let (_dir, repo) = temp_repo().await;
    let load = Row::new("h", "load", "load");
    repo.save_value_lists(&[
        load.value(NOW_SECS - 3 * 3600, ValueKind::Gauge, 1.0),
        load.value(NOW_SECS - 2 * 3600, ValueKind::Gauge, 2.0),
        load.value(NOW_SECS - 60, ValueKind::Gauge, 3.0),
        load.value(NOW_SECS - 30, ValueKind::Gauge, 4.0),
    ])
    .await
    .unwrap();

    let one_hour = export_csv(&repo, &query("load", "h", &[]), NOW_MS).await.unwrap().unwrap();
    assert_eq!(data_rows(&one_hour), vec![((NOW_SECS - 30) * 1000, vec![4.0])]);

    let q = query("load", "h", &[("time_range", "4")]);
    let four_hours = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    assert_eq!(data_rows(&four_hours).len(), 3);
}

#[tokio::test]
async fn export_percentage_uses_totals_across_hosts() {
    let (_dir, repo) = temp_repo().await;
    let a = Row::new("a", "memory", "memory").type_instance("used");
    let b = Row::new("b", "memory", "memory").type_instance("used");
    let ca = Row::new("a", "cpu", "cpu").plugin_instance("0").type_instance("user");
    let cb = Row::new("b", "cpu", "cpu").plugin_instance("0").type_instance("user");
    repo.save_value_lists(&[
        a.value(NOW_SECS - 30, ValueKind::Gauge, 20.0),
        b.value(NOW_SECS - 30, ValueKind::Gauge, 80.0),
        a.value(NOW_SECS - 20, ValueKind::Gauge, 30.0),
        b.value(NOW_SECS - 20, ValueKind::Gauge, 90.0),
        ca.value(NOW_SECS - 30, ValueKind::Derive, 0.0),
        cb.value(NOW_SECS - 30, ValueKind::Derive, 0.0),
        ca.value(NOW_SECS - 20, ValueKind::Derive, 10.0),
        cb.value(NOW_SECS - 20, ValueKind::Derive, 30.0),
    ])
    .await
    .unwrap();

    let q = query("memory", "a", &[("type", "memory"), ("type_instance", "used"), ("percentage", "1")]);
    let csv = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    let rows = data_rows(&csv);
    assert_eq!(rows.len(), 1);
    // 30 of 120
    assert!(approx_eq(rows[0].1[0], 25.0), "{}", csv);

    let q = query("cpu", "a", &[("type", "cpu"), ("percentage", "1")]);
    let csv = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    let rows = data_rows(&csv);
    // delta 10 of total delta 40
    assert!(approx_eq(rows[0].1[0], 25.0), "{}", csv);
}

#[tokio::test]
async fn export_filters_on_meta() {
    let (_dir, repo) = temp_repo().await;
    let disk = Row::new("h", "disk", "disk_ops").plugin_instance("sda");
    let mut rows = vec![
        disk.value(NOW_SECS - 20, ValueKind::Derive, 1.0),
        disk.value(NOW_SECS - 10, ValueKind::Derive, 4.0),
    ];
    for row in &mut rows {
        row.meta = Some(BTreeMap::from([("pool".to_string(), "fast".to_string())]));
    }
    repo.save_value_lists(&rows).await.unwrap();

    let q = query("disk", "h", &[("meta", "pool"), ("pool", "fast")]);
    let csv = export_csv(&repo, &q, NOW_MS).await.unwrap().unwrap();
    assert_eq!(data_rows(&csv), vec![((NOW_SECS - 10) * 1000, vec![3.0])]);

    let q = query("disk", "h", &[("meta", "pool"), ("pool", "slow")]);
    assert_eq!(export_csv(&repo, &q, NOW_MS).await.unwrap(), None);
}

#[tokio::test]
async fn export_without_data_is_none() {
    let (_dir, repo) = temp_repo().await;
    assert_eq!(
        export_csv(&repo, &query("load", "h", &[]), NOW_MS).await.unwrap(),
        None
    );

    repo.save_value_lists(&[Row::new("h", "load", "load").value(NOW_SECS, ValueKind::Gauge, 1.0)])
        .await
        .unwrap();
    let q = query("load", "h", &[("dsnames", "missing")]);
    assert_eq!(export_csv(&repo, &q, NOW_MS).await.unwrap(), None);

    // Host with no rows in range
    assert_eq!(
        export_csv(&repo, &query("load", "other", &[]), NOW_MS).await.unwrap(),
        None
    );

    // A single row renders only the header
    let csv = export_csv(&repo, &query("load", "h", &[]), NOW_MS).await.unwrap().unwrap();
    assert_eq!(csv, "timestamp,h.load.load.value\n");
}
