use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pointclip::{run, ClipConfig, RegionSpec};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::tempdir;

fn create_tiles(
    dir: &tempfile::TempDir,
    file_count: usize,
    rows_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("tile_{}.xyz", i));
        let mut file = File::create(file_path)?;
        for j in 0..rows_per_file {
            writeln!(
                file,
                "{}.25 {}.75 {}.10",
                460_000 + (j % 1000),
                100_000 + i * 1000 + j / 1000,
                300 + j % 50
            )?;
        }
    }
    Ok(())
}

fn create_base_config(dir: &tempfile::TempDir, out: &tempfile::TempDir) -> ClipConfig {
    ClipConfig {
        input_dir: dir.path().to_path_buf(),
        output: out.path().join("clip.xyz"),
        region: Some(RegionSpec::Bounds {
            min_x: 460_250.0,
            max_x: 460_750.0,
            min_y: 100_000.0,
            max_y: 104_000.0,
        }),
        worker_count: NonZeroUsize::new(1),
        ..ClipConfig::default()
    }
}

fn bench_worker_scaling(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    create_tiles(&dir, 16, 20_000).unwrap();

    let mut group = c.benchmark_group("Worker Scaling");
    group.sample_size(10);

    for &workers in &[1, 2, 4, 8] {
        let mut config = create_base_config(&dir, &out);
        config.worker_count = NonZeroUsize::new(workers);

        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| black_box(run(&config).unwrap()));
        });
    }
    group.finish();
}

fn bench_stride(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    create_tiles(&dir, 4, 50_000).unwrap();

    let mut group = c.benchmark_group("Stride");
    group.sample_size(10);

    for &stride in &[1, 10, 100] {
        let mut config = create_base_config(&dir, &out);
        config.stride = NonZeroUsize::new(stride).unwrap();
        config.worker_count = NonZeroUsize::new(4);

        group.bench_function(format!("stride_{}", stride), |b| {
            b.iter(|| black_box(run(&config).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_worker_scaling, bench_stride);
criterion_main!(benches);
