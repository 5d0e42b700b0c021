use criterion::{black_box, criterion_group, criterion_main, Criterion};
use complaint_router::classifier::{LinearArtifact, LinearModel};
use complaint_router::DepartmentClassifier;
use serde_json::json;

const WORDS: [&str; 12] = [
    "semaforo", "basura", "luminaria", "bache", "arbol", "agua",
    "cloaca", "ruido", "transito", "vereda", "plaza", "colectivo",
];

/// Synthetic model: `departments` classes over a vocabulary of `vocab_size` terms.
fn setup_benchmark_classifier(departments: usize, vocab_size: usize) -> DepartmentClassifier {
    let vocabulary: serde_json::Map<String, serde_json::Value> = (0..vocab_size)
        .map(|i| {
            let term = if i < WORDS.len() { WORDS[i].to_string() } else { format!("termino{}", i) };
            (term, json!(i))
        })
        .collect();
    let coef: Vec<Vec<f32>> = (0..departments)
        .map(|d| (0..vocab_size).map(|i| if i % departments == d { 1.0 } else { -0.1 }).collect())
        .collect();

    let artifact: LinearArtifact = serde_json::from_value(json!({
        "labels": (0..departments).map(|d| format!("Departamento{}", d)).collect::<Vec<_>>(),
        "vectorizer": {
            "vocabulary": vocabulary,
            "idf": vec![1.0f32; vocab_size],
            "strip_accents": true,
            "ngram_range": [1, 2]
        },
        "coef": coef,
        "intercept": vec![0.0f32; departments]
    }))
    .unwrap();

    DepartmentClassifier::from_model(Box::new(LinearModel::from_artifact(artifact).unwrap()))
}

fn bench_prediction(c: &mut Criterion) {
    let classifier = setup_benchmark_classifier(8, 2_000);
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        classifier.classify(black_box(&["El semáforo no funciona"])).unwrap()
    }));

    group.bench_function("long_text", |b| b.iter(|| {
        classifier.classify(black_box(&[
            "Desde hace varias semanas la luminaria de la plaza está apagada, \
             la basura se acumula en la vereda y el semáforo de la esquina \
             funciona de manera intermitente. Los vecinos ya presentaron \
             reclamos anteriores sin respuesta y el tránsito se vuelve \
             peligroso durante la noche, sobre todo para los colectivos."
        ])).unwrap()
    }));

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let classifier = setup_benchmark_classifier(8, 2_000);
    let mut group = c.benchmark_group("Batch");
    group.sample_size(30);

    for &size in &[1usize, 10, 100] {
        let texts: Vec<String> = (0..size)
            .map(|i| format!("Reclamo {} sobre {} en la zona {}", i, WORDS[i % WORDS.len()], i % 7))
            .collect();
        group.bench_function(format!("batch_{}", size), |b| b.iter(|| {
            classifier.classify(black_box(&texts)).unwrap()
        }));
    }

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scaling");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &count in &[2usize, 5, 10, 20, 50] {
        let classifier = setup_benchmark_classifier(count, 2_000);
        group.bench_function(format!("departments_{}", count), |b| b.iter(|| {
            classifier.classify(black_box(&["Bache profundo frente a la escuela"])).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_prediction,
    bench_batch,
    bench_scaling
);
criterion_main!(benches);
