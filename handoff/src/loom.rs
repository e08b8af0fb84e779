#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{HandoffQueue, WakeSignal};
    use loom::{model::Builder, sync::Arc, thread};

    #[test]
    fn test_push_racing_drain_is_never_stranded() {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }

        builder.check(|| {
            let queue = Arc::new(HandoffQueue::new());
            let signal = Arc::new(WakeSignal::new().unwrap());
            let num_messages = 3;

            let producer = {
                let queue = queue.clone();
                let signal = signal.clone();
                thread::spawn(move || {
                    for i in 0..num_messages {
                        queue.push(i);
                        signal.signal().unwrap();
                    }
                })
            };

            let mut received = vec![];
            while received.len() < num_messages {
                signal.wait().unwrap();
                received.extend(queue.drain_all());
            }

            producer.join().unwrap();

            assert_eq!(received, (0..num_messages).collect::<Vec<_>>());
        });
    }

    #[test]
    fn test_acknowledge_then_drain_sees_coalesced_push() {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }

        builder.check(|| {
            let queue = Arc::new(HandoffQueue::new());
            let signal = Arc::new(WakeSignal::new().unwrap());

            queue.push(0);
            signal.signal().unwrap();

            let producer = {
                let queue = queue.clone();
                let signal = signal.clone();
                thread::spawn(move || {
                    queue.push(1);
                    signal.signal().unwrap();
                })
            };

            signal.acknowledge().unwrap();
            let mut received: Vec<_> = queue.drain_all().into_iter().collect();

            producer.join().unwrap();

            if received.len() < 2 {
                assert!(signal.is_pending());
                signal.acknowledge().unwrap();
                received.extend(queue.drain_all());
            }
            assert_eq!(received, vec![0, 1]);
        });
    }
}
