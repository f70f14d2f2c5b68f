use std::sync::Arc;

use bytes::Bytes;
use talent_media::asset_store::{AssetStore, LocalStore};
use talent_media::config::MediaQuotas;
use talent_media::media::{MediaError, MediaService, NewPayload};
use talent_media::storage::models::{MediaKind, PayloadRef};
use talent_media::storage::Database;

fn test_service() -> (tempfile::TempDir, MediaService, Arc<LocalStore>, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    let assets = Arc::new(LocalStore::new(dir.path().join("uploads")).unwrap());
    let service = MediaService::new(
        db.clone(),
        Arc::clone(&assets) as Arc<dyn AssetStore>,
        MediaQuotas::default(),
    );
    (dir, service, assets, db)
}

fn image(name: &str) -> NewPayload {
    NewPayload::Upload {
        data: Bytes::from_static(b"not really a png"),
        file_name: Some(name.to_string()),
        mime_type: "image/png".to_string(),
    }
}

fn video(name: &str) -> NewPayload {
    NewPayload::Upload {
        data: Bytes::from_static(b"not really a video"),
        file_name: Some(name.to_string()),
        mime_type: "video/mp4".to_string(),
    }
}

fn link(url: &str) -> NewPayload {
    NewPayload::Link {
        url: url.to_string(),
    }
}

// ============================================================================
// allocation properties
// ============================================================================

#[tokio::test]
async fn adds_fill_indices_in_order_until_capacity() {
    let (_dir, svc, _assets, _db) = test_service();

    for expected in 0..5 {
        let slot = svc
            .add("user-1", MediaKind::Image, image(&format!("{expected}.png")))
            .await
            .unwrap();
        assert_eq!(slot.index, expected);
    }

    let err = svc
        .add("user-1", MediaKind::Image, image("sixth.png"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaError::CapacityExceeded { capacity: 5, .. }
    ));
}

#[tokio::test]
async fn freed_index_is_reused_before_higher_ones() {
    let (_dir, svc, _assets, _db) = test_service();

    for i in 0..5 {
        svc.add("user-1", MediaKind::Image, image(&format!("{i}.png")))
            .await
            .unwrap();
    }

    svc.delete("user-1", MediaKind::Image, 2).await.unwrap();

    let slot = svc
        .add("user-1", MediaKind::Image, image("again.png"))
        .await
        .unwrap();
    assert_eq!(slot.index, 2);
}

#[tokio::test]
async fn occupied_set_stays_within_capacity_under_churn() {
    let (_dir, svc, _assets, _db) = test_service();

    // Interleave adds and deletes and keep checking the invariant.
    for round in 0u32..4 {
        svc.add("user-1", MediaKind::Image, image(&format!("a{round}.png")))
            .await
            .unwrap();
        svc.add("user-1", MediaKind::Image, image(&format!("b{round}.png")))
            .await
            .unwrap();
        svc.delete("user-1", MediaKind::Image, round % 2).await.unwrap();

        let slots = svc.list("user-1", MediaKind::Image).await.unwrap();
        assert!(slots.len() <= 5);
        assert!(slots.iter().all(|s| s.index < 5));
    }
}

#[tokio::test]
async fn listing_returns_exact_survivors_ordered() {
    let (_dir, svc, _assets, _db) = test_service();

    for i in 0..5 {
        svc.add("user-1", MediaKind::Image, image(&format!("{i}.png")))
            .await
            .unwrap();
    }
    svc.delete("user-1", MediaKind::Image, 1).await.unwrap();
    svc.delete("user-1", MediaKind::Image, 3).await.unwrap();

    let slots = svc.list("user-1", MediaKind::Image).await.unwrap();
    let indices: Vec<u32> = slots.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 2, 4]);
}

#[tokio::test]
async fn listing_an_absent_group_is_empty_and_does_not_create_it() {
    let (_dir, svc, _assets, db) = test_service();

    assert!(svc.list("user-1", MediaKind::Image).await.unwrap().is_empty());
    assert!(db.get_group("user-1", MediaKind::Image).unwrap().is_none());
}

#[tokio::test]
async fn links_share_the_capacity_pool_with_uploads() {
    let (_dir, svc, _assets, _db) = test_service();

    let first = svc
        .add("user-1", MediaKind::Video, video("reel.mp4"))
        .await
        .unwrap();
    assert_eq!(first.index, 0);

    let second = svc
        .add("user-1", MediaKind::Video, link("https://example.com/reel"))
        .await
        .unwrap();
    assert_eq!(second.index, 1);

    // Videos cap at 2, uploads and links combined.
    let err = svc
        .add("user-1", MediaKind::Video, video("extra.mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::CapacityExceeded { .. }));
}

// ============================================================================
// replace
// ============================================================================

#[tokio::test]
async fn replace_keeps_the_index_and_swaps_the_asset() {
    let (_dir, svc, assets, _db) = test_service();

    svc.add("user-1", MediaKind::Image, image("0.png")).await.unwrap();
    let original = svc
        .add("user-1", MediaKind::Image, image("1.png"))
        .await
        .unwrap();
    let old_key = original.payload.asset_key().unwrap().to_string();

    let replaced = svc
        .replace("user-1", MediaKind::Image, 1, image("better.png"))
        .await
        .unwrap();
    assert_eq!(replaced.index, 1);
    let new_key = replaced.payload.asset_key().unwrap().to_string();
    assert_ne!(new_key, old_key);

    // Old payload is no longer resolvable; the new one is.
    assert!(!assets.exists(&old_key).await.unwrap());
    assert!(assets.exists(&new_key).await.unwrap());

    // Still exactly two slots, indices unchanged.
    let slots = svc.list("user-1", MediaKind::Image).await.unwrap();
    let indices: Vec<u32> = slots.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[tokio::test]
async fn replace_on_an_empty_slot_is_not_found() {
    let (_dir, svc, _assets, _db) = test_service();

    let err = svc
        .replace("user-1", MediaKind::Image, 0, image("x.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::NotFound { index: 0, .. }));

    svc.add("user-1", MediaKind::Image, image("0.png")).await.unwrap();
    let err = svc
        .replace("user-1", MediaKind::Image, 4, image("y.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::NotFound { index: 4, .. }));
}

#[tokio::test]
async fn replace_link_with_link_touches_no_assets() {
    let (_dir, svc, assets, _db) = test_service();

    let upload = svc
        .add("user-1", MediaKind::Video, video("reel.mp4"))
        .await
        .unwrap();
    let upload_key = upload.payload.asset_key().unwrap().to_string();

    svc.add("user-1", MediaKind::Video, link("https://example.com/old"))
        .await
        .unwrap();
    let replaced = svc
        .replace(
            "user-1",
            MediaKind::Video,
            1,
            link("https://example.com/new"),
        )
        .await
        .unwrap();
    assert_eq!(
        replaced.payload,
        PayloadRef::Link("https://example.com/new".to_string())
    );

    // The unrelated uploaded asset is untouched.
    assert!(assets.exists(&upload_key).await.unwrap());
}

#[tokio::test]
async fn replace_upload_with_link_frees_the_file() {
    let (_dir, svc, assets, _db) = test_service();

    let upload = svc
        .add("user-1", MediaKind::Video, video("reel.mp4"))
        .await
        .unwrap();
    let key = upload.payload.asset_key().unwrap().to_string();

    let replaced = svc
        .replace("user-1", MediaKind::Video, 0, link("https://example.com/v"))
        .await
        .unwrap();
    assert!(replaced.payload.is_link());
    assert!(!assets.exists(&key).await.unwrap());
}

// ============================================================================
// delete
// ============================================================================

#[tokio::test]
async fn delete_removes_the_row_and_the_asset() {
    let (_dir, svc, assets, _db) = test_service();

    let slot = svc
        .add("user-1", MediaKind::Image, image("0.png"))
        .await
        .unwrap();
    let key = slot.payload.asset_key().unwrap().to_string();
    assert!(assets.exists(&key).await.unwrap());

    svc.delete("user-1", MediaKind::Image, 0).await.unwrap();
    assert!(!assets.exists(&key).await.unwrap());
    assert!(svc.list("user-1", MediaKind::Image).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_survives_an_already_missing_asset_file() {
    let (_dir, svc, assets, _db) = test_service();

    let slot = svc
        .add("user-1", MediaKind::Image, image("0.png"))
        .await
        .unwrap();
    let key = slot.payload.asset_key().unwrap().to_string();

    // Someone removed the file out of band; the row is what counts.
    assets.delete(&key).await.unwrap();

    svc.delete("user-1", MediaKind::Image, 0).await.unwrap();
    assert!(svc.list("user-1", MediaKind::Image).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_on_an_empty_slot_is_not_found() {
    let (_dir, svc, _assets, _db) = test_service();

    let err = svc.delete("user-1", MediaKind::Image, 0).await.unwrap_err();
    assert!(matches!(err, MediaError::NotFound { .. }));
}

#[tokio::test]
async fn delete_all_drains_the_group_and_its_assets() {
    let (_dir, svc, assets, _db) = test_service();

    let mut keys = Vec::new();
    for i in 0..3 {
        let slot = svc
            .add("user-1", MediaKind::Image, image(&format!("{i}.png")))
            .await
            .unwrap();
        keys.push(slot.payload.asset_key().unwrap().to_string());
    }
    svc.add("user-1", MediaKind::Video, link("https://example.com/v"))
        .await
        .unwrap();

    let removed = svc.delete_all("user-1", MediaKind::Image).await.unwrap();
    assert_eq!(removed, 3);

    for key in &keys {
        assert!(!assets.exists(key).await.unwrap());
    }
    assert!(svc.list("user-1", MediaKind::Image).await.unwrap().is_empty());

    // Other kinds are untouched.
    assert_eq!(svc.list("user-1", MediaKind::Video).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_all_on_an_absent_group_removes_nothing() {
    let (_dir, svc, _assets, _db) = test_service();
    assert_eq!(svc.delete_all("user-1", MediaKind::Image).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_frees_capacity_again() {
    let (_dir, svc, _assets, _db) = test_service();

    svc.add("user-1", MediaKind::Intro, video("intro.mp4"))
        .await
        .unwrap();
    assert!(svc
        .add("user-1", MediaKind::Intro, video("second.mp4"))
        .await
        .is_err());

    svc.delete_all("user-1", MediaKind::Intro).await.unwrap();
    let slot = svc
        .add("user-1", MediaKind::Intro, video("third.mp4"))
        .await
        .unwrap();
    assert_eq!(slot.index, 0);
}

// ============================================================================
// concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_the_last_slot_produce_one_winner() {
    let (_dir, svc, _assets, _db) = test_service();
    let svc = Arc::new(svc);

    // Fill all but the last image slot.
    for i in 0..4 {
        svc.add("user-1", MediaKind::Image, image(&format!("{i}.png")))
            .await
            .unwrap();
    }

    let a = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.add("user-1", MediaKind::Image, image("a.png")).await })
    };
    let b = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.add("user-1", MediaKind::Image, image("b.png")).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(MediaError::CapacityExceeded { .. }))));

    // No double allocation: five slots, indices 0..=4 exactly once.
    let slots = svc.list("user-1", MediaKind::Image).await.unwrap();
    let indices: Vec<u32> = slots.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_never_share_an_index() {
    let (_dir, svc, _assets, _db) = test_service();
    let svc = Arc::new(svc);

    let mut handles = Vec::new();
    for i in 0..5 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.add("user-1", MediaKind::Image, image(&format!("{i}.png")))
                .await
        }));
    }

    // Retries are bounded, so a heavily contended add may give up early;
    // what must hold is that winners never share an index and the stored
    // rows are exactly the winners.
    let mut won = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(slot) => won.push(slot.index),
            Err(e) => assert!(matches!(e, MediaError::CapacityExceeded { .. })),
        }
    }
    won.sort_unstable();

    assert!(!won.is_empty());
    let mut deduped = won.clone();
    deduped.dedup();
    assert_eq!(won, deduped, "two adds claimed the same index");
    assert!(won.iter().all(|&i| i < 5));

    let slots = svc.list("user-1", MediaKind::Image).await.unwrap();
    let stored: Vec<u32> = slots.iter().map(|s| s.index).collect();
    assert_eq!(stored, won);
}
