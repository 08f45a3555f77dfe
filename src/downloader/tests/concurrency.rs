use super::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_concurrent_jobs_reach_independent_terminal_states() {
    const JOB_COUNT: usize = 20;

    let provider = Arc::new(
        FakeStreamProvider::new(vec![
            progressive("p480", "480p"),
            video_only("v720", "720p"),
            audio_only("a1"),
        ])
        .with_jitter(Duration::from_millis(30)),
    );
    let muxer = Arc::new(RecordingMuxer::new());
    let (downloader, _temp) = create_test_downloader(provider, muxer.clone()).await;

    let mut ids = Vec::with_capacity(JOB_COUNT);
    for n in 0..JOB_COUNT {
        let quality = if n % 2 == 0 { "480p" } else { "720p" };
        let id = downloader
            .submit(&format!("fake://video{}", n), Quality::parse(quality))
            .await
            .unwrap();
        ids.push(id);
    }

    for id in &ids {
        assert_eq!(
            wait_terminal(&downloader, id).await,
            JobStatus::Done,
            "job {} must finish independently",
            id
        );
    }

    // Every job produced its own artifact; ids scope the filenames, so
    // concurrent jobs cannot collide
    for id in &ids {
        assert!(downloader.has_artifact(id), "missing artifact for {}", id);
    }
    assert!(
        leftover_temp_files(&downloader).is_empty(),
        "merge-path temp files must all be reclaimed"
    );

    // Half the jobs took the merge path
    assert_eq!(muxer.call_count(), JOB_COUNT / 2);

    // Mux inputs never mix job ids
    for (video_path, audio_path, output_path) in muxer.calls() {
        let id_of = |path: &std::path::Path, prefix: &str| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(prefix))
                .and_then(|n| n.strip_suffix(".mp4"))
                .map(str::to_string)
        };
        let video_id = id_of(&video_path, "video_").unwrap();
        let audio_id = id_of(&audio_path, "audio_").unwrap();
        let output_id = id_of(&output_path, "artifact_").unwrap();
        assert_eq!(video_id, audio_id, "legs of one job only");
        assert_eq!(video_id, output_id);
    }
}

#[tokio::test]
async fn test_concurrency_limit_still_completes_all_jobs() {
    let provider = Arc::new(
        FakeStreamProvider::new(vec![progressive("p720", "720p")])
            .with_jitter(Duration::from_millis(10)),
    );
    let muxer = Arc::new(RecordingMuxer::new());

    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    config.download.max_concurrent_jobs = 2;
    let downloader = VideoDownloader::with_collaborators(config, provider, muxer)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for n in 0..10 {
        ids.push(
            downloader
                .submit(&format!("fake://video{}", n), Quality::parse("720p"))
                .await
                .unwrap(),
        );
    }

    for id in &ids {
        assert_eq!(wait_terminal(&downloader, id).await, JobStatus::Done);
    }
}

#[tokio::test]
async fn test_jobs_do_not_observe_each_others_progress() {
    let provider = Arc::new(
        FakeStreamProvider::new(vec![progressive("p720", "720p")])
            .with_jitter(Duration::from_millis(20)),
    );
    let muxer = Arc::new(RecordingMuxer::new());
    let (downloader, _temp) = create_test_downloader(provider, muxer).await;

    let first = downloader
        .submit("fake://video1", Quality::parse("720p"))
        .await
        .unwrap();
    let second = downloader
        .submit("fake://video2", Quality::parse("720p"))
        .await
        .unwrap();

    assert_eq!(wait_terminal(&downloader, &first).await, JobStatus::Done);

    // Events for the first job never carry the second job's id and vice
    // versa; statuses live in distinct records
    assert_ne!(first, second);
    let first_job = downloader.job(&first).unwrap();
    assert_eq!(first_job.id, first);

    assert_eq!(wait_terminal(&downloader, &second).await, JobStatus::Done);
}
