// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tessera::{
    render, Dashboard, DashboardConfig, DataError, DatasetLoader, ExportFormat, TesseraError,
};

const SAMPLE: &str = "\
Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Date,Time,Payment,gross income,Rating
750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,1/5/2019,13:08,Ewallet,26.1415,9.1
226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3/8/2019,10:29,Cash,3.82,9.6
631-41-3108,A,Yangon,Normal,Male,Home and lifestyle,46.33,7,3/3/2019,13:23,Credit card,16.2155,7.4
123-19-1176,A,Yangon,Member,Male,Health and beauty,58.22,8,1/27/2019,20:33,Ewallet,23.288,8.4
";

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/dashboard.yml")
}

#[test]
fn test_load_csv_records_metadata() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "supermarket_sales.csv", SAMPLE);
    let dataset = DatasetLoader::new().load_csv(&path).unwrap();
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.cities(), ["Yangon", "Naypyitaw"]);
    let metadata = dataset.metadata();
    assert_eq!(metadata.name, "supermarket_sales");
    assert_eq!(metadata.row_count, 4);
    assert_eq!(metadata.source_path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_missing_file_fails_fast() {
    let dir = TempDir::new().unwrap();
    let err = DatasetLoader::new()
        .load_csv(dir.path().join("absent.csv"))
        .unwrap_err();
    assert!(matches!(err, DataError::DataFileError { .. }));
}

#[test]
fn test_dashboard_open_rejects_bad_rows() {
    let dir = TempDir::new().unwrap();
    let bad = SAMPLE.replace("1/27/2019", "27 January");
    let path = write_fixture(&dir, "sales.csv", &bad);
    let config = DashboardConfig::default().with_data_path(&path);
    match Dashboard::open(config) {
        Err(TesseraError::Data(DataError::TemporalParsingError { line, value })) => {
            assert_eq!(line, 5);
            assert_eq!(value, "27 January");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("bad date was accepted"),
    }
}

#[test]
fn test_config_file_resolves_relative_data_path() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir, "sales.csv", SAMPLE);
    let config_path = write_fixture(&dir, "dashboard.yml", "data:\n  path: sales.csv\n");
    let dashboard = Dashboard::from_config_file(&config_path).unwrap();
    assert_eq!(dashboard.summary().row_count, 4);
    assert_eq!(dashboard.config().layout.height, 200);
}

#[test]
fn test_invalid_config_is_reported_with_field() {
    let dir = TempDir::new().unwrap();
    let config_path = write_fixture(&dir, "dashboard.yml", "layout:\n  height: 0\n");
    let err = Dashboard::from_config_file(&config_path).err().unwrap();
    assert!(matches!(err, TesseraError::Config(_)));
    assert!(err.to_string().contains("layout.height"));
}

#[test]
fn test_shipped_config_and_sample_data_load() {
    let dashboard = Dashboard::from_config_file(shipped_config()).unwrap();
    let summary = dashboard.summary();
    assert!(summary.row_count > 0);
    assert_eq!(summary.cities.len(), 3);
    let controller = dashboard.controller().unwrap();
    let publication = controller.latest().unwrap();
    let html = render::render(&publication, ExportFormat::Html).unwrap();
    assert!(html.contains("income-per-product-fig"));
    let json: serde_json::Value =
        serde_json::from_str(&render::render(&publication, ExportFormat::Json).unwrap()).unwrap();
    assert_eq!(json["figures"].as_object().unwrap().len(), 5);
    assert_eq!(json["filter"]["measure"], "gross_income");
}
