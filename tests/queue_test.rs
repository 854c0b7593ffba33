//! Tests for `src/queue/memory.rs` — score-ordered scheduling semantics.

use docrelay::queue::memory::MemoryQueue;
use docrelay::queue::{EnqueueOptions, RetryQueue, SEND_QUEUE, WEBHOOK_RETRY_QUEUE};
use serde_json::json;

#[tokio::test]
async fn undelayed_job_is_immediately_due() {
    let queue = MemoryQueue::new();
    let id = queue
        .enqueue(SEND_QUEUE, json!({"n": 1}), EnqueueOptions::default())
        .await
        .expect("enqueue");
    assert!(id.starts_with("job-"));

    let job = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("job is due");
    assert_eq!(job.id, id);
    assert_eq!(job.data, json!({"n": 1}));
    assert_eq!(job.attempts, 0);
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 0);
}

#[tokio::test]
async fn delayed_job_stays_invisible_until_due() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(
            SEND_QUEUE,
            json!({"later": true}),
            EnqueueOptions {
                delay_ms: Some(60_000),
                attempts: 3,
                priority: None,
            },
        )
        .await
        .expect("enqueue");

    // Counted but not dequeued.
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 1);
    assert!(queue.dequeue(SEND_QUEUE).await.expect("dequeue").is_none());
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 1);
}

#[tokio::test]
async fn higher_priority_pops_first() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(
            SEND_QUEUE,
            json!("low"),
            EnqueueOptions {
                delay_ms: None,
                attempts: 1,
                priority: Some(0),
            },
        )
        .await
        .expect("enqueue low");
    queue
        .enqueue(
            SEND_QUEUE,
            json!("high"),
            EnqueueOptions {
                delay_ms: None,
                attempts: 1,
                priority: Some(10_000),
            },
        )
        .await
        .expect("enqueue high");

    let first = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("first job");
    let second = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("second job");
    assert_eq!(first.data, json!("high"));
    assert_eq!(second.data, json!("low"));
}

#[tokio::test]
async fn enqueue_options_land_on_the_job() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(
            SEND_QUEUE,
            json!({}),
            EnqueueOptions {
                delay_ms: Some(0),
                attempts: 3,
                priority: None,
            },
        )
        .await
        .expect("enqueue");

    let job = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("job is due");
    assert_eq!(job.max_attempts, 3);
    assert_eq!(job.priority, 0);
    assert!(job.scheduled_at >= job.created_at);
}

#[tokio::test]
async fn requeue_preserves_attempt_count() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(
            SEND_QUEUE,
            json!({"payload": "x"}),
            EnqueueOptions {
                delay_ms: Some(0),
                attempts: 3,
                priority: None,
            },
        )
        .await
        .expect("enqueue");

    let mut job = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("job is due");
    job.attempts = 2;
    queue.requeue(SEND_QUEUE, job, 0).await.expect("requeue");

    let back = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("requeued job is due");
    assert_eq!(back.attempts, 2);
    assert_eq!(back.max_attempts, 3);
    assert_eq!(back.data, json!({"payload": "x"}));
}

#[tokio::test]
async fn requeue_with_delay_is_not_immediately_due() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(SEND_QUEUE, json!(1), EnqueueOptions::default())
        .await
        .expect("enqueue");
    let job = queue
        .dequeue(SEND_QUEUE)
        .await
        .expect("dequeue")
        .expect("job is due");

    queue.requeue(SEND_QUEUE, job, 60_000).await.expect("requeue");
    assert!(queue.dequeue(SEND_QUEUE).await.expect("dequeue").is_none());
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 1);
}

#[tokio::test]
async fn channels_are_isolated() {
    let queue = MemoryQueue::new();
    queue
        .enqueue(SEND_QUEUE, json!("send job"), EnqueueOptions::default())
        .await
        .expect("enqueue");

    // The webhook retry channel shares the backend but not the jobs.
    assert!(queue
        .dequeue(WEBHOOK_RETRY_QUEUE)
        .await
        .expect("dequeue")
        .is_none());
    assert_eq!(queue.length(WEBHOOK_RETRY_QUEUE).await.expect("length"), 0);
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 1);

    queue
        .enqueue(WEBHOOK_RETRY_QUEUE, json!("webhook job"), EnqueueOptions::default())
        .await
        .expect("enqueue webhook");
    let job = queue
        .dequeue(WEBHOOK_RETRY_QUEUE)
        .await
        .expect("dequeue")
        .expect("webhook job is due");
    assert_eq!(job.data, json!("webhook job"));
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 1);
}

#[tokio::test]
async fn clear_drops_every_job_on_the_channel() {
    let queue = MemoryQueue::new();
    for n in 0..3 {
        queue
            .enqueue(SEND_QUEUE, json!(n), EnqueueOptions::default())
            .await
            .expect("enqueue");
    }
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 3);

    queue.clear(SEND_QUEUE).await.expect("clear");
    assert_eq!(queue.length(SEND_QUEUE).await.expect("length"), 0);
    assert!(queue.dequeue(SEND_QUEUE).await.expect("dequeue").is_none());
}

#[tokio::test]
async fn dequeue_on_unknown_channel_is_none() {
    let queue = MemoryQueue::new();
    assert!(queue
        .dequeue("nothing-here")
        .await
        .expect("dequeue")
        .is_none());
}
