use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use emld_trainer::domain::{
    Annotation, AnnotationMetadata, AnnotationType, BoundingBox, Content, Dataset, Split,
    SplitRatios, Tag,
};
use emld_trainer::pipeline::labels::LabelIntegerMap;
use emld_trainer::pipeline::manifest::ManifestEncoder;
use emld_trainer::pipeline::partition::shuffle_and_partition_with;
use emld_trainer::pipeline::split::split_counts;
use emld_trainer::store::{Store, annotations, contents, datasets, tags};
use rand::SeedableRng;
use rand::rngs::StdRng;

const ANNOTATION_COUNT: usize = 1_000;
const TAG_NAMES: [&str; 4] = ["bird", "cat", "dog", "fish"];

fn setup_store() -> (Store, Vec<Annotation>) {
    let store = Store::open_in_memory().expect("store open");
    let conn = store.conn();
    datasets::insert(
        conn,
        &Dataset {
            id: "d1".into(),
            user_id: "u1".into(),
            project_id: "p1".into(),
            version: 0,
            locked: false,
            split: SplitRatios::default(),
        },
    )
    .expect("seed dataset");
    for name in TAG_NAMES {
        tags::insert(
            conn,
            &Tag {
                id: format!("t-{name}"),
                user_id: "u1".into(),
                project_id: "p1".into(),
                dataset_id: "d1".into(),
                name: name.into(),
                properties: serde_json::Value::Null,
            },
        )
        .expect("seed tag");
    }
    let mut seeded = Vec::with_capacity(ANNOTATION_COUNT);
    for idx in 0..ANNOTATION_COUNT {
        let content_id = format!("c{idx}");
        contents::insert(
            conn,
            &Content {
                id: content_id.clone(),
                user_id: "u1".into(),
                stored_dir: "emld/u1/uploads".into(),
                stored_path: format!("{idx}.jpg"),
                width: 800,
                height: 600,
            },
            "p1",
        )
        .expect("seed content");
        let tag_id = format!("t-{}", TAG_NAMES[idx % TAG_NAMES.len()]);
        let annotation = Annotation {
            id: format!("a{idx}"),
            user_id: "u1".into(),
            project_id: "p1".into(),
            dataset_id: "d1".into(),
            content_id,
            tag_ids: vec![tag_id.clone()],
            metadata: AnnotationMetadata {
                bounding_boxes: vec![BoundingBox {
                    tag_id,
                    xmin: 5,
                    ymin: 5,
                    xmax: 120,
                    ymax: 90,
                }],
            },
            split: Split::Undefined,
        };
        annotations::insert(conn, &annotation).expect("seed annotation");
        seeded.push(annotation);
    }
    (store, seeded)
}

fn bench_partition(c: &mut Criterion) {
    let (_store, seeded) = setup_store();
    c.bench_with_input(
        BenchmarkId::new("split_and_partition", ANNOTATION_COUNT),
        &seeded,
        |b, seeded| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| {
                let counts = split_counts(seeded.len(), 0.7, 0.2, 0.1);
                shuffle_and_partition_with(black_box(seeded.clone()), counts, &mut rng)
                    .expect("partition")
            });
        },
    );
}

fn bench_encode(c: &mut Criterion) {
    let (store, seeded) = setup_store();
    let labels = LabelIntegerMap::from_names(TAG_NAMES);
    for annotation_type in [AnnotationType::Classification, AnnotationType::BoundingBox] {
        c.bench_with_input(
            BenchmarkId::new("encode_manifest", annotation_type.as_str()),
            &seeded,
            |b, seeded| {
                b.iter(|| {
                    let mut encoder =
                        ManifestEncoder::new(store.conn(), "u1", annotation_type, &labels, "s3://");
                    encoder.encode(black_box(seeded)).expect("encode")
                });
            },
        );
    }
}

criterion_group!(benches, bench_partition, bench_encode);
criterion_main!(benches);
