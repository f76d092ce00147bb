use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use canny_image::Image;
use canny_imgproc::filter::{apply_separable_kernel, filter2d, kernels::SeparableKernel};
use canny_imgproc::parallel::ExecutionStrategy;

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("Gaussian Blur");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        for kernel_size in [3, 5, 7].iter() {
            group.throughput(criterion::Throughput::Elements(
                (*width * *height * *kernel_size) as u64,
            ));

            let parameter_string = format!("{}x{}x{}", width, height, kernel_size);

            let image_size = [*width, *height].into();
            let data = (0..width * height).map(|i| (i % 251) as u8).collect();
            let image = Image::<u8, 1>::new(image_size, data).unwrap();
            let output = Image::<u8, 1>::from_size_val(image_size, 0).unwrap();

            let kernel = SeparableKernel::gaussian(*kernel_size, 1.5).unwrap();
            let dense = kernel.to_kernel2d().unwrap();

            for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
                group.bench_with_input(
                    BenchmarkId::new(format!("separable_{strategy:?}"), &parameter_string),
                    &(&image, &output),
                    |b, i| {
                        let (src, mut dst) = (i.0, i.1.clone());
                        b.iter(|| {
                            black_box(apply_separable_kernel(src, &mut dst, &kernel, strategy))
                        })
                    },
                );
            }

            group.bench_with_input(
                BenchmarkId::new("filter2d_Parallel", &parameter_string),
                &(&image, &output),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    b.iter(|| {
                        black_box(filter2d(src, &mut dst, &dense, ExecutionStrategy::Parallel))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
