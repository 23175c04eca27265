use criterion::{Criterion, criterion_group, criterion_main};
use medren::camera::fix_make_model;
use medren::time::filename_parsing::extract_datetime_from_filename;
use medren::time::parsing::select_best_timestamp;
use std::hint::black_box;

fn bench(c: &mut Criterion) {
    let filenames = [
        "PXL_20250103_180944831.MP.jpg",
        "Screenshot_20240501-203015.png",
        "2024-05-01 20.30.15.jpg",
        "1714595415000.jpg",
        "DSC01234.JPG",
    ];
    c.bench_function("extract_datetime_from_filename", |b| {
        b.iter(|| {
            for name in filenames {
                black_box(extract_datetime_from_filename(black_box(name)));
            }
        });
    });

    c.bench_function("fix_make_model", |b| {
        b.iter(|| fix_make_model(black_box(Some("FUJI PHOTO FILM CO., LTD.")), black_box(Some("FinePix S5600"))));
    });

    c.bench_function("select_best_timestamp", |b| {
        b.iter(|| {
            select_best_timestamp(black_box(&[Some("0000:00:00 00:00:00"), Some("2020:04:24 12:07:46")]))
        });
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
