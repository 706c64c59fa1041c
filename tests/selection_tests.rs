// Source selection -> data.csv URLs

use std::collections::BTreeMap;
use yams_wui::selection::{SourceSelection, y_max};

fn selection() -> SourceSelection {
    SourceSelection {
        plugin: "interface".into(),
        type_: "if_octets".into(),
        type_instance: "eth0".into(),
        hosts: vec!["web1".into(), "web2".into()],
        ..Default::default()
    }
}

#[test]
fn one_url_per_host() {
    let urls = selection().data_urls().unwrap();
    assert_eq!(
        urls,
        vec![
            "data.csv/interface/web1?type=if_octets&type_instance=eth0",
            "data.csv/interface/web2?type=if_octets&type_instance=eth0",
        ]
    );
}

#[test]
fn url_carries_every_filter() {
    let sel = SourceSelection {
        plugin: "disk".into(),
        plugin_instance: "sda".into(),
        type_: "disk_ops".into(),
        hosts: vec!["db1".into()],
        dsnames: vec!["read".into(), "write".into()],
        meta: BTreeMap::from([("pool".to_string(), "fast".to_string())]),
        percentage: true,
        ..Default::default()
    };
    assert_eq!(
        sel.data_urls().unwrap(),
        vec![
            "data.csv/disk/db1?type=disk_ops&plugin_instance=sda&dsnames=read&dsnames=write&meta=pool&pool=fast&percentage=1"
        ]
    );
}

#[test]
fn meta_is_only_sent_with_dsnames() {
    let sel = SourceSelection {
        meta: BTreeMap::from([("pool".to_string(), "fast".to_string())]),
        hosts: vec!["web1".into()],
        ..selection()
    };
    assert_eq!(
        sel.data_urls().unwrap(),
        vec!["data.csv/interface/web1?type=if_octets&type_instance=eth0"]
    );
}

#[test]
fn incomplete_selection_is_rejected() {
    let mut sel = selection();
    sel.hosts.clear();
    assert!(sel.data_urls().is_err());

    let mut sel = selection();
    sel.type_.clear();
    assert!(sel.data_urls().unwrap_err().to_string().contains("type"));
}

#[test]
fn append_skips_urls_already_present() {
    let existing = vec![
        "data.csv/load/x?type=load".to_string(),
        "data.csv/interface/web2?type=if_octets&type_instance=eth0".to_string(),
    ];
    let urls = selection().append_urls(&existing).unwrap();
    assert_eq!(
        urls,
        vec![
            "data.csv/load/x?type=load",
            "data.csv/interface/web2?type=if_octets&type_instance=eth0",
            "data.csv/interface/web1?type=if_octets&type_instance=eth0",
        ]
    );
}

#[test]
fn y_axis_pinned_only_when_all_are_percentages() {
    let pct = vec![
        "data.csv/cpu/a?type=cpu&percentage=1".to_string(),
        "data.csv/cpu/b?type=cpu&percentage=1".to_string(),
    ];
    assert_eq!(y_max(&pct), Some(100.0));

    let mut mixed = pct.clone();
    mixed.push("data.csv/load/a?type=load".to_string());
    assert_eq!(y_max(&mixed), None);
}

#[test]
fn selection_deserializes_from_camel_case_json() {
    let sel: SourceSelection = serde_json::from_value(serde_json::json!({
        "plugin": "cpu",
        "pluginInstance": "0",
        "type": "cpu",
        "hosts": ["h"],
        "percentage": true
    }))
    .unwrap();
    assert_eq!(sel.plugin_instance, "0");
    assert_eq!(sel.type_, "cpu");
    assert!(sel.dsnames.is_empty());
    assert!(sel.percentage);
}
