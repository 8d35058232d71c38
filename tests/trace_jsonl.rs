use axiom_harness::axioms::GreaterThan;
use axiom_harness::pivot::FirstPivotSelection;
use axiom_harness::{kwiksort_traced, ComparisonTrace, JsonlTraceSink, TraceSink};
use tempfile::tempdir;

#[derive(Debug, serde::Deserialize)]
struct TraceRow {
    comparison_index: usize,
    axiom: String,
    depth: usize,
    vertex_index: usize,
    pivot_index: usize,
    preference: f64,
}

fn make_trace(comparison_index: usize) -> ComparisonTrace {
    ComparisonTrace {
        timestamp_ms: 0,
        comparison_index,
        axiom: "GT".to_string(),
        depth: 0,
        vertex_index: 1,
        pivot_index: 0,
        preference: -1.0,
        from_matrix: false,
    }
}

#[test]
fn jsonl_trace_sink_writes_events_and_flushes_on_join() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let (sink, worker) = JsonlTraceSink::new(&path).unwrap();
    sink.record(make_trace(1)).unwrap();
    sink.record(make_trace(2)).unwrap();

    drop(sink);
    worker.join().unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: TraceRow = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.comparison_index, 1);
}

#[test]
fn kwiksort_records_every_partition_comparison() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let (sink, worker) = JsonlTraceSink::new(&path).unwrap();

    // First-element pivots on an ascending list degrade to n(n-1)/2 comparisons.
    let outputs = [1u32, 2, 3, 4];
    let order = kwiksort_traced(&GreaterThan, &(), &outputs, &mut FirstPivotSelection, &sink).unwrap();
    assert_eq!(order, vec![3, 2, 1, 0]);

    drop(sink);
    worker.join().unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<TraceRow> = raw
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.axiom == "GT"));
    assert_eq!(
        rows.iter().map(|r| r.comparison_index).collect::<Vec<_>>(),
        (0..6).collect::<Vec<_>>()
    );
    assert_eq!((rows[0].vertex_index, rows[0].pivot_index, rows[0].depth), (1, 0, 0));
    assert_eq!(rows[0].preference, 1.0);
    assert_eq!(rows[3].depth, 1);
}
