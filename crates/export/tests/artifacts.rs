use std::collections::BTreeMap;
use std::fs;

use serde::Serialize;
use sizing_export::{solution, sweep, table, writer_for_path};
use sizing_model::{Registry, Solution, SolveError, SweepPoint, SweepResult};
use tempfile::tempdir;

fn sample_solution() -> Solution {
    let mut registry = Registry::new();
    registry.scalar("W_total", "N", "Total Aircraft Weight").unwrap();
    let h = registry.vector("hft", 2, "m", "Altitude").unwrap();
    let mut values = BTreeMap::new();
    values.insert(registry.key("W_total", None).unwrap(), 1_000.0);
    values.insert(h.key(0), 10_000.0);
    let mut solution = Solution::from_si(&registry, 4_448.0, &values);
    solution.sensitivities.insert("mission.small".into(), 0.1);
    solution.sensitivities.insert("mission.large".into(), -2.0);
    solution
}

#[test]
fn solution_csv_lists_every_element() {
    let mut out = Vec::new();
    solution::write_csv(&mut out, &sample_solution()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "name,index,value,unit,label");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("W_total,,1000"));
    assert!(lines[2].starts_with("hft,0,10000"));
    assert!(lines[3].starts_with("hft,1,NaN"));
}

#[test]
fn solution_json_writes_null_for_untouched_elements() {
    let mut out = Vec::new();
    solution::write_json(&mut out, &sample_solution()).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed["values"]["hft"]["unit"], "m");
    assert!(parsed["values"]["hft"]["value"][1].is_null());
    assert_eq!(parsed["cost"], 4_448.0);
}

#[test]
fn sensitivities_are_sorted_by_magnitude() {
    let mut out = Vec::new();
    solution::write_sensitivities(&mut out, &sample_solution()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["constraint,sensitivity", "mission.large,-2", "mission.small,0.1"]);
}

#[test]
fn sweep_failures_keep_their_rows() {
    let result = SweepResult {
        quantity: "ReqRng".into(),
        unit: "miles".into(),
        points: vec![
            SweepPoint {
                value: 2_000.0,
                outcome: Ok(sample_solution()),
            },
            SweepPoint {
                value: 50_000.0,
                outcome: Err(SolveError::Infeasible {
                    binding: vec!["mission.total_range".into()],
                }),
            },
        ],
    };
    let mut out = Vec::new();
    sweep::write_sweep(&mut out, &result, &["W_total"]).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "ReqRng [miles],W_total,status");
    assert_eq!(lines[1], "2000,1000,ok");
    assert!(lines[2].starts_with("50000,,"));
    assert!(lines[2].contains("mission.total_range"));
    assert_eq!(result.gaps(), vec![50_000.0]);
}

#[test]
fn rows_serialize_with_field_headers() {
    #[derive(Serialize)]
    struct Row {
        slot: usize,
        altitude_ft: f64,
    }
    let mut out = Vec::new();
    table::write_rows(
        &mut out,
        &[
            Row {
                slot: 0,
                altitude_ft: 1_500.0,
            },
            Row {
                slot: 1,
                altitude_ft: 10_000.0,
            },
        ],
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "slot,altitude_ft\n0,1500.0\n1,10000.0\n"
    );
}

#[test]
fn file_writers_create_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/out/solution.json");
    {
        let mut writer = writer_for_path(&path).unwrap();
        solution::write_json(&mut writer, &sample_solution()).unwrap();
    }
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"W_total\""));
}
