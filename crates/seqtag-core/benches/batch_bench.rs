use criterion::{Criterion, black_box, criterion_group, criterion_main};
use seqtag_core::{BatchOptions, TaggerConfig, batchify};

fn bench_batchify(c: &mut Criterion) {
    let config = TaggerConfig::default();

    let words: Vec<Vec<u32>> = (0..64u32)
        .map(|i| (0..(i % 40 + 1)).map(|j| 4 + j).collect())
        .collect();
    let chars: Vec<Vec<Vec<u32>>> = words
        .iter()
        .map(|seq| seq.iter().map(|&w| vec![4; (w % 12 + 1) as usize]).collect())
        .collect();

    let options = BatchOptions::new().with_sos(true).with_eos(true);

    c.bench_function("batchify_words_64", |b| {
        b.iter(|| batchify(&config, &[], black_box(&words), options).unwrap());
    });

    c.bench_function("batchify_words_chars_64", |b| {
        b.iter(|| batchify(&config, black_box(&chars), black_box(&words), options).unwrap());
    });
}

criterion_group!(benches, bench_batchify);
criterion_main!(benches);
