//! End-to-end scenarios from the testable-properties section: cancelled
//! buffered task (#5) and future-group wait (#6).

use std::time::Duration;

use gocc::{BufferedExecutor, ChanBlockingQueue, DirectExecutor, ExecutorConfig, FutureGroup, GoccError};

#[tokio::test]
async fn scenario_5_cancelled_buffered_task() {
    let queue = ChanBlockingQueue::new(4);
    let executor = BufferedExecutor::new(queue, ExecutorConfig::default().with_concurrency(1));

    let future_a = executor
        .execute(Box::new(|| {
            std::thread::sleep(Duration::from_millis(200));
            Ok::<_, GoccError>("a-result")
        }))
        .expect("queue has room");

    let future_b = executor
        .execute(Box::new(|| Ok::<_, GoccError>("b-result")))
        .expect("queue has room");
    future_b.cancel();

    assert_eq!(future_a.get().await.unwrap(), "a-result");
    assert!(matches!(future_b.get().await, Err(GoccError::TaskCancelled)));
}

#[tokio::test]
async fn scenario_6_future_group_of_100() {
    let executor = DirectExecutor::new(100);
    let group = FutureGroup::new(100);

    for _ in 0..100 {
        executor
            .execute_in_group(
                Box::new(|| {
                    std::thread::sleep(Duration::from_millis(100));
                    Ok::<_, GoccError>(325)
                }),
                &group,
            )
            .expect("capacity covers all 100 tasks");
    }

    group.wait().await;
    assert!(group.try_wait());

    for member in group.members() {
        assert_eq!(member.try_get().unwrap(), 325);
    }
}
