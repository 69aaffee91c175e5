//! Performance benchmarks for the absence reconciliation engine.
//!
//! Covers the full pipeline at increasing input sizes, the overlap scans on
//! their own, and result workbook serialization.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use absence_recon::config::ReconConfig;
use absence_recon::io::write_report;
use absence_recon::models::{Cell, RawTable};
use absence_recon::reconciliation::{
    ReconInputs, detect_interval_overlaps, detect_overlaps, normalize_primary, run,
};

fn text(s: String) -> Cell {
    Cell::Text(s)
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Builds inputs with `rows` primary absences spread over `rows / 4` people.
///
/// Every tenth entry id is repeated, a third of the absences are fractioned
/// (some with different hours), a third reach the total export and a sixth a
/// monetary export.
fn create_inputs(rows: usize) -> ReconInputs {
    let people = (rows / 4).max(1);
    let mut primary = Vec::with_capacity(rows);
    let mut fractioned = Vec::new();
    let mut total = Vec::new();
    let mut monetary = Vec::new();

    for i in 0..rows {
        let person = 1000 + (i % people) as u32;
        let day = 1 + (i / people) as u32 * 3 % 27;
        let month = 1 + (i % 12) as u32;
        let entry = if i % 10 == 9 { i - 1 } else { i };
        let start = format!("{:02}/{:02}/2024", day, month);
        let end = format!("{:02}/{:02}/2024", day + 1, month);
        let iso = format!("2024-{:02}-{:02}", month, day);

        primary.push(vec![
            Cell::Number(person as f64),
            Cell::Number(entry as f64),
            text(start),
            text(end),
            Cell::Number(8.0),
            text("Horas".to_string()),
        ]);

        match i % 6 {
            0 | 1 => fractioned.push(vec![
                Cell::Number(person as f64),
                text(format!("Persona {}", person)),
                text(iso),
                Cell::Number(if i % 12 == 0 { 7.5 } else { 8.0 }),
                text("usuario".to_string()),
                text("PS".to_string()),
                text("PS".to_string()),
                text("2024-12-31".to_string()),
                text("Y".to_string()),
            ]),
            2 | 3 => total.push(vec![Cell::Number(person as f64), text(iso)]),
            4 => monetary.push(vec![Cell::Number(person as f64), text(iso)]),
            _ => {}
        }
    }

    ReconInputs {
        primary: RawTable::from_rows(
            columns(&[
                "PERSON_NUMBER",
                "PER_ABSENCE_ENTRY_ID",
                "START_DATE",
                "END_DATE",
                "DURATION",
                "UOM",
            ]),
            primary,
        ),
        fractioned: RawTable::from_rows(
            columns(&[
                "ID",
                "Nombre",
                "Fecha Inicio",
                "Horas",
                "Usuario",
                "Instancia",
                "Instancia.1",
                "Recepción",
                "Processed",
            ]),
            fractioned,
        ),
        total: RawTable::from_rows(columns(&["ID", "Fecha Inicio Real"]), total),
        monetary: vec![
            RawTable::from_rows(columns(&["Id Empleado", "Fecha Inicio Disfrute"]), monetary),
            RawTable::from_rows(columns(&["Id Empleado", "Fecha Inicio Disfrute"]), vec![]),
        ],
    }
}

/// Benchmark: the full pipeline at increasing primary sizes.
fn bench_pipeline(c: &mut Criterion) {
    let config = ReconConfig::default();
    let mut group = c.benchmark_group("pipeline");

    for rows in [100usize, 1_000, 10_000] {
        let inputs = create_inputs(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &inputs, |b, inputs| {
            b.iter(|| black_box(run(inputs.clone(), &config).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark: both overlap scans over normalized records.
fn bench_overlaps(c: &mut Criterion) {
    let config = ReconConfig::default();
    let inputs = create_inputs(10_000);
    let records = normalize_primary(&inputs.primary, &config.sources.primary, 2)
        .unwrap()
        .records;

    let mut group = c.benchmark_group("overlaps");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("running_chain", |b| {
        b.iter(|| black_box(detect_overlaps(&records)))
    });
    group.bench_function("interval_groups", |b| {
        b.iter(|| black_box(detect_interval_overlaps(&records)))
    });
    group.finish();
}

/// Benchmark: serializing the result workbook.
fn bench_export(c: &mut Criterion) {
    let config = ReconConfig::default();
    let report = run(create_inputs(10_000), &config).unwrap();

    let mut group = c.benchmark_group("export");
    group.sample_size(10);
    group.bench_function("write_report", |b| {
        b.iter(|| black_box(write_report(&report).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_overlaps, bench_export);
criterion_main!(benches);
