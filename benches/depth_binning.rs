use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use data_range_processor::{
    Observation, ObservationSet, PipelineConfig, apply_quality_filters, bin_observations,
    detect_outlier_windows,
};

fn profile_set(count: usize) -> ObservationSet {
    let start = Utc.with_ymd_and_hms(2016, 6, 1, 0, 0, 0).unwrap();
    let observations = (0..count)
        .map(|i| {
            let depth = (i % 5_000) as f64 * 0.1;
            let value = 12.0 - depth * 0.02 + ((i * 7919) % 100) as f64 * 0.001;
            Observation::new(start + Duration::seconds(i as i64), depth, value, None, 1)
        })
        .collect();
    ObservationSet::new("ctdpf_ckl_seawater_temperature", "ºC", None, observations)
}

fn bench_depth_binning(c: &mut Criterion) {
    let config = PipelineConfig::default();
    let mut group = c.benchmark_group("depth_binning");

    for count in [10_000, 100_000] {
        let set = profile_set(count);
        group.bench_with_input(BenchmarkId::new("bin", count), &set, |b, set| {
            b.iter(|| bin_observations(black_box(set), &config))
        });
        group.bench_with_input(BenchmarkId::new("filter_bin_scan", count), &set, |b, set| {
            b.iter(|| {
                let range = Some((-5.0, 35.0));
                let outcome = apply_quality_filters(black_box(set), &config, range, &[]);
                let binning = bin_observations(&outcome.trusted, &config);
                detect_outlier_windows(&binning, config.sigma_multiplier)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_depth_binning);
criterion_main!(benches);
