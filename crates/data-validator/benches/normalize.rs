use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_validator::{RecordNormalizer, SensorScan, ValidationConfig, Validator};
use timeline::{SensorId, TimelineGrid};

fn bench_normalize(c: &mut Criterion) {
    let grid = TimelineGrid::generate(5).unwrap();
    let validator = Validator::new(ValidationConfig::default()).unwrap();
    let normalizer = RecordNormalizer::new(&grid, &validator);
    let sensor = SensorId::from("SENSOR01");

    let lines: Vec<String> = grid
        .iter()
        .enumerate()
        .map(|(i, key)| match i % 10 {
            0 => format!("02.09.2024;{};NaN;45.0", key),
            1 => format!("02.09.2024;{};;45.0", key),
            _ => format!("02.09.2024;{};{:.1};45.0", key, 15.0 + (i % 100) as f64 / 10.0),
        })
        .collect();

    c.bench_function("normalize_line", |b| {
        b.iter(|| normalizer.normalize(black_box(&lines[42]), Some(44), &sensor))
    });

    c.bench_function("scan_full_day_5s", |b| {
        b.iter(|| {
            let mut scan = SensorScan::new(&normalizer, sensor.clone());
            for (i, line) in lines.iter().enumerate() {
                scan.push_line(black_box(line), Some(i + 2));
            }
            scan.finish()
        })
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
