mod common;

use common::*;
use setapp_lib::installer::core::ZipExtractor;
use setapp_lib::{InstallError, InstallStage};
use std::sync::Arc;

const FOO_URL: &str = "http://x/foo.zip";

#[tokio::test]
async fn installs_bundle_when_absent() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app"])));
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader.clone(), Arc::new(ListingExtractor), reporter.clone());

    let result = pipeline.install(&target(42, "Foo", FOO_URL), true).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert!(!result.skipped);
    assert!(sandbox.destination.join("Foo.app/Contents/Info.plist").exists());
    assert!(sandbox.temp_is_empty(), "scratch files left behind");
    assert_eq!(downloader.calls(), 1);
    assert_eq!(
        reporter.stages_for("Foo"),
        vec![
            InstallStage::Checking,
            InstallStage::Downloading,
            InstallStage::Extracting,
            InstallStage::Locating,
            InstallStage::Placing,
        ]
    );
    assert_eq!(reporter.finished.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn extracts_real_zip_archives() {
    let sandbox = Sandbox::new();
    let archive = zip_archive(&[
        ("Foo.app/Contents/Info.plist", "<plist/>"),
        ("Foo.app/Contents/MacOS/Foo", "binary"),
    ]);
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, archive));
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader, Arc::new(ZipExtractor), reporter);

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert_eq!(
        std::fs::read_to_string(sandbox.destination.join("Foo.app/Contents/MacOS/Foo")).unwrap(),
        "binary"
    );
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn installed_bundle_is_skipped_without_download() {
    let sandbox = Sandbox::new();
    sandbox.preinstall("Foo.app", "original");
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app"])));
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader.clone(), Arc::new(ListingExtractor), reporter.clone());

    for _ in 0..2 {
        let result = pipeline.install(&target(42, "Foo", FOO_URL), true).await;
        assert!(result.success);
        assert!(result.skipped);
        assert_eq!(result.stage(), InstallStage::Skipped);
    }

    assert_eq!(downloader.calls(), 0);
    assert_eq!(
        std::fs::read_to_string(sandbox.destination.join("Foo.app/marker")).unwrap(),
        "original"
    );
    assert_eq!(reporter.stages_for("Foo"), vec![InstallStage::Checking; 2]);
}

#[tokio::test]
async fn second_run_after_install_is_skipped() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app"])));
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader.clone(), Arc::new(ListingExtractor), reporter);
    let foo = target(42, "Foo", FOO_URL);

    let first = pipeline.install(&foo, false).await;
    let second = pipeline.install(&foo, false).await;

    assert!(first.success && !first.skipped);
    assert!(second.success && second.skipped);
    assert_eq!(downloader.calls(), 1);
}

#[tokio::test]
async fn prefix_match_counts_as_installed() {
    let sandbox = Sandbox::new();
    sandbox.preinstall("Foo Pro.app", "pro");
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app"])));
    let pipeline = sandbox.pipeline(
        downloader.clone(),
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(result.skipped);
    assert_eq!(downloader.calls(), 0);
}

#[tokio::test]
async fn download_failure_is_reported_and_cleaned_up() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new());
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(!result.success);
    assert!(matches!(result.error, Some(InstallError::DownloadFailed(_))));
    assert_eq!(result.stage(), InstallStage::Failed);
    assert!(!sandbox.destination.join("Foo.app").exists());
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn corrupt_archive_fails_extraction() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, "CORRUPT"));
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    match result.error {
        Some(InstallError::ExtractFailed(msg)) => assert!(msg.contains("EOCD"), "{}", msg),
        other => panic!("expected ExtractFailed, got {:?}", other),
    }
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn archive_without_bundle_fails_locating() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["README.txt"])));
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(matches!(result.error, Some(InstallError::BundleNotFound(_))));
    assert!(!sandbox.destination.exists());
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn places_every_bundle_in_archive() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(
        MockDownloader::new().serve(FOO_URL, listing(&["Foo.app", "Foo Helper.app", "LICENSE"])),
    );
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(result.success);
    assert!(sandbox.destination.join("Foo.app").is_dir());
    assert!(sandbox.destination.join("Foo Helper.app").is_dir());
    assert!(!sandbox.destination.join("LICENSE").exists());
}

#[tokio::test]
async fn existing_bundle_at_placement_is_left_untouched() {
    let sandbox = Sandbox::new();
    // Not a prefix of "Foo", so Checking does not skip
    sandbox.preinstall("Bar.app", "keep me");
    let downloader =
        Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app", "Bar.app"])));
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader, Arc::new(ListingExtractor), reporter.clone());

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(result.success);
    assert!(sandbox.destination.join("Foo.app").is_dir());
    assert_eq!(
        std::fs::read_to_string(sandbox.destination.join("Bar.app/marker")).unwrap(),
        "keep me"
    );
    assert!(!sandbox.destination.join("Bar.app/Contents").exists());
    assert!(reporter
        .messages
        .lock()
        .unwrap()
        .iter()
        .any(|(t, m)| t == "Foo" && m.contains("Bar.app")));
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn unwritable_destination_fails_placement() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.destination.parent().unwrap()).unwrap();
    std::fs::write(&sandbox.destination, "not a directory").unwrap();
    let downloader = Arc::new(MockDownloader::new().serve(FOO_URL, listing(&["Foo.app"])));
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );

    let result = pipeline.install(&target(42, "Foo", FOO_URL), false).await;

    assert!(!result.success);
    assert!(
        matches!(result.error, Some(InstallError::PlacementFailed(_))),
        "{:?}",
        result.error
    );
    assert!(sandbox.temp_is_empty());
}

#[tokio::test]
async fn byte_progress_only_when_requested() {
    let sandbox = Sandbox::new();
    let downloader = Arc::new(
        MockDownloader::new()
            .serve(FOO_URL, listing(&["Foo.app"]))
            .serve("http://x/bar.zip", listing(&["Bar.app"])),
    );
    let reporter = Arc::new(RecordingReporter::default());
    let pipeline = sandbox.pipeline(downloader, Arc::new(ListingExtractor), reporter.clone());

    pipeline.install(&target(1, "Foo", FOO_URL), false).await;
    assert_eq!(reporter.byte_updates(), 0);

    pipeline.install(&target(2, "Bar", "http://x/bar.zip"), true).await;
    assert_eq!(reporter.byte_updates(), 1);
}

#[tokio::test]
async fn panic_mid_download_still_cleans_scratch_files() {
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;

    let sandbox = Sandbox::new();
    let downloader = Arc::new(MockDownloader::new().panic_on(FOO_URL));
    let pipeline = sandbox.pipeline(
        downloader,
        Arc::new(ListingExtractor),
        Arc::new(RecordingReporter::default()),
    );
    let foo = target(42, "Foo", FOO_URL);

    let outcome = AssertUnwindSafe(pipeline.install(&foo, false))
        .catch_unwind()
        .await;

    assert!(outcome.is_err(), "panic should propagate to the caller");
    assert!(sandbox.temp_is_empty(), "partial archive left behind");
}
