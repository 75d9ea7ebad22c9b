use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use preprocess::{BlobBuilder, BlobParams, ChannelOrder};

/// Create raw pixel buffer for benchmarking (gradient pattern)
fn create_test_pixels(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            pixels[idx] = (x % 256) as u8; // R
            pixels[idx + 1] = (y % 256) as u8; // G
            pixels[idx + 2] = ((x + y) % 256) as u8; // B
        }
    }
    pixels
}

fn imagenet_params() -> BlobParams {
    BlobParams {
        scale: 1.0,
        mean: [104.0, 117.0, 123.0],
        channel_order: ChannelOrder::Bgr,
        size: Some((224, 224)),
    }
}

fn benchmark_blob_from_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_from_image");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];
    let mut builder = BlobBuilder::new(imagenet_params());

    for (width, height) in resolutions.iter() {
        let pixels = create_test_pixels(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("resize_224", format!("{}x{}", width, height)),
            &pixels,
            |b, pixels| {
                b.iter(|| {
                    builder
                        .blob_from_image(black_box(pixels), black_box(*width), black_box(*height))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_blob_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_from_batch");

    let pixels = create_test_pixels(1280, 720);
    let mut builder = BlobBuilder::new(imagenet_params());

    for batch_size in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::new("1280x720", batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    builder
                        .blob_from_batch(black_box(&pixels), 1280, 720, batch_size)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_blob_from_image, benchmark_blob_batches);
criterion_main!(benches);
