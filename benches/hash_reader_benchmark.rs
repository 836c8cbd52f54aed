use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ionhash::{Algorithm, Element, ElementReader, HashReader, HashSum, IonReader, Value};
use rand::Rng;

fn document(rnd: &mut impl Rng, records: usize) -> Vec<Element> {
    (0..records)
        .map(|i| {
            let mut payload = vec![0u8; 64];
            rnd.fill(&mut payload[..]);
            let tags = (0..8)
                .map(|_| Element::from(rnd.gen_range(0..1_000_000i64)))
                .collect();
            Element::structure(vec![
                ("id", Element::from(i as i64)),
                ("name", Element::from("benchmark record")),
                ("payload", Element::new(Value::Blob(payload))),
                ("tags", Element::list(tags)),
            ])
            .with_annotations(["record"])
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rnd = rand::thread_rng();
    let doc = document(&mut rnd, 100);

    for algorithm in [Algorithm::Sha256, Algorithm::Sha3_256] {
        c.bench_function(&format!("hash 100 records {algorithm}"), |b| {
            b.iter(|| {
                let mut hr = HashReader::new(ElementReader::new(&doc), algorithm)
                    .expect("reader at top level");
                while hr.next().expect("in-memory read").is_some() {}
                black_box(hr.digest().expect("digest"));
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
