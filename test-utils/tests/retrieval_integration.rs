//! Integration tests: Midras facade → embedder → vector index

use std::sync::Arc;

use midras::{
    IndexPoint, InMemoryEmbedder, InMemoryIndex, Midras, MidrasError, Mode, Payload, PdfOptions,
    PointId,
};
use midras_test_utils::fixtures::{FakeRasterizer, axis_colbert, sample_payload};

const PDF: &[u8] = b"%PDF-1.4 fixture";

// ============================================================
// Embedding
// ============================================================

#[tokio::test]
async fn two_queries_yield_two_equal_width_embeddings() {
    let midras = Midras::in_memory();
    let resp = midras.embed_queries(&["hello", "it's me"]).await.unwrap();

    assert_eq!(resp.len(), 2);
    let width = resp.embeddings[0][0].len();
    for colbert in &resp.embeddings {
        assert!(!colbert.is_empty());
        assert!(colbert.iter().all(|v| v.len() == width));
    }
}

#[tokio::test]
async fn pdf_embeddings_do_not_depend_on_batch_size() {
    let rasterizer = FakeRasterizer::new(13);
    let midras = Midras::in_memory().with_rasterizer(Arc::new(FakeRasterizer::new(13)));
    let all_at_once = midras.embed_images(&rasterizer.pages()).await.unwrap();

    for batch_size in [1, 4, 10, 13, 100] {
        let resp = midras
            .embed_pdf(PDF.to_vec(), PdfOptions::default().batch_size(batch_size))
            .await
            .unwrap();
        assert_eq!(resp.len(), 13, "batch_size={batch_size}");
        assert_eq!(resp.embeddings, all_at_once.embeddings, "batch_size={batch_size}");
    }
}

#[tokio::test]
async fn pdf_from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    std::fs::write(&path, PDF).unwrap();

    let midras = Midras::in_memory().with_rasterizer(Arc::new(FakeRasterizer::new(2)));
    let resp = midras
        .embed_pdf(path.clone(), PdfOptions::default().include_images(true))
        .await
        .unwrap();
    assert_eq!(resp.len(), 2);
    assert_eq!(resp.images.map(|i| i.len()), Some(2));
}

// ============================================================
// Index round trips
// ============================================================

#[tokio::test]
async fn embed_add_then_query_finds_document() {
    let midras = Midras::in_memory();
    midras.create_index("docs").await.unwrap();

    let texts = ["invoice total due", "weather forecast rain", "quarterly revenue"];
    let resp = midras.embed_queries(&texts).await.unwrap();
    for (i, colbert) in resp.embeddings.into_iter().enumerate() {
        midras
            .add_point("docs", i, colbert, sample_payload(i as u64))
            .await
            .unwrap();
    }

    let results = midras.query("docs", "weather forecast rain", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, PointId::Num(1));
    assert!(results[0].score >= results[1].score);
    assert_eq!(results[0].data.as_ref().unwrap()["page"], 1);
}

#[tokio::test]
async fn identical_vector_ranks_first_with_maximal_score() {
    let midras = Midras::in_memory();
    midras.create_index("docs").await.unwrap();

    let target = axis_colbert(128, &[3, 7]);
    midras
        .add_points(
            "docs",
            vec![
                IndexPoint::new(1_u64, axis_colbert(128, &[0, 1]), Payload::new()),
                IndexPoint::new(2_u64, target.clone(), Payload::new()),
                IndexPoint::new(3_u64, axis_colbert(128, &[3, 9]), Payload::new()),
            ],
        )
        .await
        .unwrap();

    let results = midras.search("docs", &target, 5).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, PointId::Num(2));
    assert!((results[0].score - 2.0).abs() < 1e-5);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn search_returns_at_most_k() {
    let midras = Midras::in_memory();
    midras.create_index("docs").await.unwrap();
    let points = (0..8)
        .map(|i| IndexPoint::new(i as u64, axis_colbert(128, &[i]), Payload::new()))
        .collect();
    midras.add_points("docs", points).await.unwrap();

    let results = midras.search("docs", &axis_colbert(128, &[0]), 3).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn payload_round_trips_unchanged() {
    let midras = Midras::in_memory();
    midras.create_index("docs").await.unwrap();
    let data = sample_payload(42);
    midras
        .add_point("docs", "page-42", axis_colbert(128, &[5]), data.clone())
        .await
        .unwrap();

    let results = midras.search("docs", &axis_colbert(128, &[5]), 1).await.unwrap();
    assert_eq!(results[0].id, PointId::from("page-42"));
    assert_eq!(results[0].data.as_ref(), Some(&data));
}

#[tokio::test]
async fn search_after_delete_is_not_found() {
    let midras = Midras::in_memory();
    midras.create_index("tmp").await.unwrap();
    midras.delete_index("tmp").await.unwrap();

    let err = midras
        .search("tmp", &axis_colbert(128, &[0]), 5)
        .await
        .unwrap_err();
    match err {
        MidrasError::Index(e) => assert!(e.is_not_found()),
        other => panic!("expected index error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_backends_plug_into_facade() {
    let embedder = InMemoryEmbedder::new(midras::EmbeddingConfig::builder().dimensions(16).build());
    let index = InMemoryIndex::new(midras::IndexParams { dimensions: 16 });
    let midras = Midras::new(Arc::new(embedder), Arc::new(index)).with_mode(Mode::Turbo);

    midras.create_index("small").await.unwrap();
    let colbert = midras
        .embed_queries(&["tiny"])
        .await
        .unwrap()
        .into_first()
        .unwrap();
    midras
        .add_point("small", 1_u64, colbert, Payload::new())
        .await
        .unwrap();
    assert_eq!(midras.query("small", "tiny", 1).await.unwrap().len(), 1);
}

// ============================================================
// Blocking client
// ============================================================

#[test]
fn blocking_client_runs_full_flow() {
    let midras = midras::blocking::Midras::in_memory().unwrap();
    midras.create_index("docs").unwrap();

    let colbert = midras
        .embed_queries(&["hello"])
        .unwrap()
        .into_first()
        .unwrap();
    midras
        .add_point("docs", 9_u64, colbert, sample_payload(9))
        .unwrap();

    let results = midras.query("docs", "hello", 5).unwrap();
    assert_eq!(results[0].id, PointId::Num(9));
    assert!(midras.delete_index("docs").unwrap());
}
