//! End-to-end tests of the stream lifecycle against a real filesystem.

use assert_matches::assert_matches;
use proven_file_stream::{Error, FileStream, FileStreamConfig, Status, run};
use tempfile::tempdir;

#[tokio::test]
async fn test_ready_signal_for_writable_path() {
    let dir = tempdir().unwrap();
    let stream = FileStream::new();

    let handle = tokio::spawn(run(dir.path().join("out.txt"), stream.clone()));

    assert_matches!(stream.status().await, Some(Status::Ready));

    stream.shutdown().await.unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_open_failure_in_missing_directory() {
    let path = "/nonexistent_dir/out.txt";
    let stream = FileStream::new();

    let handle = tokio::spawn(run(path, stream.clone()));

    assert_matches!(stream.status().await, Some(Status::Failed(Error::Open { .. })));
    handle.await.unwrap().unwrap();

    assert!(!std::path::Path::new(path).exists());
    assert!(stream.status().await.is_none());
    assert_matches!(stream.submit("never written").await, Err(Error::StreamClosed));
}

#[tokio::test]
async fn test_open_helper_surfaces_open_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("dir.txt");

    let result = FileStream::open(&path).await;

    assert_matches!(result, Err(Error::Open { path: failed, .. }) if failed == path);
}

#[tokio::test]
async fn test_hello_world() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test_out.txt");
    let stream = FileStream::new();

    let handle = tokio::spawn(run(path.clone(), stream.clone()));
    stream.ready().await.unwrap();

    stream.submit("hello ").await.unwrap();
    stream.submit("world").await.unwrap();
    stream.request_quit().await.unwrap();

    let summary = stream.closed().await.unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(summary.writes_applied, 2);
    assert_eq!(summary.bytes_written, 11);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
}

#[tokio::test]
async fn test_order_is_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ordered.txt");
    let stream = FileStream::open(&path).await.unwrap();

    let fragments: Vec<String> = (0..200).map(|i| format!("{i},")).collect();
    for fragment in &fragments {
        stream.submit(fragment.as_str()).await.unwrap();
    }
    stream.shutdown().await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), fragments.concat());
}

#[tokio::test]
async fn test_closed_is_reported_exactly_once() {
    let dir = tempdir().unwrap();
    let stream = FileStream::new();

    let handle = tokio::spawn(run(dir.path().join("out.txt"), stream.clone()));
    stream.ready().await.unwrap();
    stream.request_quit().await.unwrap();

    assert!(stream.status().await.unwrap().is_closed());
    handle.await.unwrap().unwrap();

    assert!(stream.status().await.is_none());
    assert!(stream.closed().await.unwrap_err().is_closed());
    assert!(stream.request_quit().await.unwrap_err().is_closed());
    assert!(stream.submit("late").await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_file_grows_monotonically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("growing.txt");
    let stream = FileStream::open(&path).await.unwrap();

    let mut expected = 0u64;
    for i in 0..50 {
        let payload = "x".repeat(i + 1);
        expected += payload.len() as u64;
        stream.submit(payload).await.unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected);
    }

    let summary = stream.shutdown().await.unwrap();
    assert_eq!(summary.bytes_written, expected);
    assert_eq!(summary.write_failures, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.txt");
    let config = FileStreamConfig::builder().write_queue_capacity(8).build();
    let stream = FileStream::open_with_config(&path, config).await.unwrap();

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let stream = stream.clone();
            tokio::spawn(async move {
                for line in 0..25 {
                    stream
                        .submit(format!("{producer}:{line}\n"))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }

    let summary = stream.shutdown().await.unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();

    assert_eq!(summary.writes_applied, 100);
    assert_eq!(summary.bytes_written, contents.len() as u64);

    // Each producer's own lines keep their submission order.
    for producer in 0..4 {
        let own: Vec<usize> = contents
            .lines()
            .filter_map(|l| l.strip_prefix(&format!("{producer}:")))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(own, (0..25).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_writes_queued_at_quit_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dropped.txt");
    let config = FileStreamConfig::builder().write_queue_capacity(4).build();
    let stream = FileStream::with_config(config);

    let pending: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|payload| {
            let stream = stream.clone();
            tokio::spawn(async move { stream.submit(payload).await })
        })
        .collect();

    // Both submissions must be queued before the quit token.
    while stream.pending_writes() < 2 {
        tokio::task::yield_now().await;
    }
    stream.request_quit().await.unwrap();

    let handle = tokio::spawn(run(path.clone(), stream.clone()));
    stream.ready().await.unwrap();
    let summary = stream.closed().await.unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(summary.writes_applied, 0);
    for submission in pending {
        assert_matches!(submission.await.unwrap(), Err(Error::StreamClosed));
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[tokio::test]
async fn test_sync_on_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("synced.txt");
    let config = FileStreamConfig::builder().sync_on_close(true).build();

    let stream = FileStream::open_with_config(&path, config).await.unwrap();
    stream.submit("durable").await.unwrap();
    let summary = stream.shutdown().await.unwrap();

    assert_eq!(summary.writes_applied, 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "durable");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_write_failures_are_counted_not_reported() {
    let stream = FileStream::new();

    let handle = tokio::spawn(run("/dev/full", stream.clone()));
    assert_matches!(stream.status().await, Some(Status::Ready));

    stream.submit("abc").await.unwrap();
    stream.submit("def").await.unwrap();
    stream.request_quit().await.unwrap();

    assert_matches!(
        stream.status().await,
        Some(Status::Closed(summary)) if summary.write_failures == 2
            && summary.writes_applied == 0
            && summary.bytes_written == 0
    );
    handle.await.unwrap().unwrap();
    assert!(stream.status().await.is_none());
}
