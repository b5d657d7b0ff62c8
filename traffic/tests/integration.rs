/**
 * Integration tests for the traffic pipeline over real sockets.
 * Unit tests belong at the bottom of source files.
 */

#[cfg(test)]
mod test {
    use common::THREAD_SLOW_DOWN;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;
    use testing::{
        assert_client_closed, assert_client_receives_bytes, connect, listen_on_available_port, record_hex,
        send_bytes_from,
    };
    use traffic::coordinator::{accept_workers, run_local};
    use traffic::{Coordinator, CoordinatorConfig, Error, RankingMode, Reading, SensorTotal, Window, Worker, WorkerConfig};

    const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

    fn spawn_worker(port: u16, rank: u32, config: WorkerConfig) -> thread::JoinHandle<Result<usize, Error>> {
        thread::spawn(move || Worker::new(rank, config).run_tcp(("127.0.0.1", port)))
    }

    fn spawn_coordinator(
        listener: TcpListener,
        workers: usize,
        readings: Vec<Reading>,
    ) -> thread::JoinHandle<Result<traffic::Report, Error>> {
        thread::spawn(move || {
            let mut channels = accept_workers(&listener, workers)?;
            Coordinator::new(CoordinatorConfig::default()).run(readings, &Window::new("", "~"), &mut channels)
        })
    }

    #[test]
    fn worker_sorts_share() {
        let (listener, port) = listen_on_available_port();
        let worker = spawn_worker(port, 1, WorkerConfig::default());
        let (mut coordinator, _) = listener.accept().expect("accept");

        assert_client_receives_bytes!(coordinator, "80 00 00 00 01", DEFAULT_TIMEOUT);
        send_bytes_from!(coordinator, "10 00 00 00 03");
        send_bytes_from!(
            coordinator,
            &format!(
                "20 {} {} {}",
                record_hex("08:10:00", 1, 1),
                record_hex("08:00:00", 2, 9),
                record_hex("08:00:00", 3, 4)
            )
        );

        assert_client_receives_bytes!(coordinator, "10 00 00 00 03", DEFAULT_TIMEOUT);
        assert_client_receives_bytes!(
            coordinator,
            &format!(
                "20 {} {} {}",
                record_hex("08:00:00", 3, 4),
                record_hex("08:00:00", 2, 9),
                record_hex("08:10:00", 1, 1)
            ),
            DEFAULT_TIMEOUT
        );
        assert_eq!(3, worker.join().expect("worker thread").expect("worker"));
    }

    #[test]
    fn worker_without_local_sort_echoes_share() {
        let (listener, port) = listen_on_available_port();
        let worker = spawn_worker(port, 4, WorkerConfig { local_sort: false });
        let (mut coordinator, _) = listener.accept().expect("accept");
        let records = format!("{} {}", record_hex("09:00:00", 1, 1), record_hex("08:00:00", 2, 2));

        assert_client_receives_bytes!(coordinator, "80 00 00 00 04", DEFAULT_TIMEOUT);
        send_bytes_from!(coordinator, "10 00 00 00 02");
        send_bytes_from!(coordinator, &format!("20 {records}"));

        assert_client_receives_bytes!(coordinator, &format!("10 00 00 00 02 20 {records}"), DEFAULT_TIMEOUT);
        assert_eq!(2, worker.join().expect("worker thread").expect("worker"));
    }

    #[test]
    fn worker_reassembles_fragmented_share() {
        let (listener, port) = listen_on_available_port();
        let worker = spawn_worker(port, 1, WorkerConfig::default());
        let (mut coordinator, _) = listener.accept().expect("accept");
        let payload = format!("20 {} {}", record_hex("08:00:01", 7, 1), record_hex("08:00:00", 8, 1));
        let (first, second) = payload.split_at(42);

        assert_client_receives_bytes!(coordinator, "80 00 00 00 01", DEFAULT_TIMEOUT);
        send_bytes_from!(coordinator, "10 00");
        thread::sleep(THREAD_SLOW_DOWN);
        send_bytes_from!(coordinator, "00 00 02");
        send_bytes_from!(coordinator, first);
        thread::sleep(THREAD_SLOW_DOWN);
        send_bytes_from!(coordinator, second);

        assert_client_receives_bytes!(
            coordinator,
            &format!("10 00 00 00 02 20 {} {}", record_hex("08:00:00", 8, 1), record_hex("08:00:01", 7, 1)),
            DEFAULT_TIMEOUT
        );
        assert_eq!(2, worker.join().expect("worker thread").expect("worker"));
    }

    #[test]
    fn worker_rejects_malformed_message() {
        let (listener, port) = listen_on_available_port();
        let worker = spawn_worker(port, 1, WorkerConfig::default());
        let (mut coordinator, _) = listener.accept().expect("accept");

        assert_client_receives_bytes!(coordinator, "80 00 00 00 01", DEFAULT_TIMEOUT);
        send_bytes_from!(coordinator, "99 00 00 00 01");
        assert_client_closed!(coordinator, DEFAULT_TIMEOUT);
        assert!(matches!(worker.join().expect("worker thread"), Err(Error::InvalidData)));
    }

    #[test]
    fn worker_fails_when_coordinator_vanishes() {
        let (listener, port) = listen_on_available_port();
        let worker = spawn_worker(port, 1, WorkerConfig::default());
        let (mut coordinator, _) = listener.accept().expect("accept");

        assert_client_receives_bytes!(coordinator, "80 00 00 00 01", DEFAULT_TIMEOUT);
        send_bytes_from!(coordinator, "10 00 00 00 05");
        drop(coordinator);
        assert!(matches!(worker.join().expect("worker thread"), Err(Error::ChannelClosed)));
    }

    #[test]
    fn coordinator_orders_workers_by_rank() {
        let (listener, port) = listen_on_available_port();
        let readings = vec![
            Reading::new("08:00:03", 1, 1),
            Reading::new("08:00:02", 2, 2),
            Reading::new("08:00:01", 3, 3),
        ];
        let coordinator = spawn_coordinator(listener, 2, readings);

        // Rank 2 connects first but must still receive the second share.
        let mut second = connect(port);
        send_bytes_from!(second, "80 00 00 00 02");
        thread::sleep(THREAD_SLOW_DOWN);
        let first = spawn_worker(port, 1, WorkerConfig::default());

        assert_client_receives_bytes!(
            second,
            &format!("10 00 00 00 01 20 {}", record_hex("08:00:01", 3, 3)),
            DEFAULT_TIMEOUT
        );
        send_bytes_from!(second, &format!("10 00 00 00 01 20 {}", record_hex("08:00:01", 3, 3)));

        let report = coordinator.join().expect("coordinator thread").expect("report");
        assert_eq!(3, report.filtered);
        assert_eq!(
            vec![
                SensorTotal { sensor: 3, vehicles: 3 },
                SensorTotal { sensor: 2, vehicles: 2 },
                SensorTotal { sensor: 1, vehicles: 1 },
            ],
            report.ranking
        );
        assert_eq!(2, first.join().expect("worker thread").expect("worker"));
    }

    #[test]
    fn coordinator_aborts_when_a_worker_vanishes() {
        let (listener, port) = listen_on_available_port();
        let readings: Vec<Reading> = (0..9).map(|i| Reading::new("08:00:00", i, 1)).collect();
        let coordinator = spawn_coordinator(listener, 3, readings);

        let first = spawn_worker(port, 1, WorkerConfig::default());
        let third = spawn_worker(port, 3, WorkerConfig::default());
        let mut second = connect(port);
        send_bytes_from!(second, "80 00 00 00 02");
        assert_client_receives_bytes!(second, "10 00 00 00 03", DEFAULT_TIMEOUT);
        drop(second);

        assert!(matches!(coordinator.join().expect("coordinator thread"), Err(Error::ChannelClosed)));
        // Either may have been cut off by the abort.
        _ = first.join().expect("worker thread");
        _ = third.join().expect("worker thread");
    }

    #[test]
    fn coordinator_rejects_duplicate_rank() {
        let (listener, port) = listen_on_available_port();
        let coordinator = spawn_coordinator(listener, 2, vec![]);
        let mut first = connect(port);
        send_bytes_from!(first, "80 00 00 00 01");
        let mut again = connect(port);
        send_bytes_from!(again, "80 00 00 00 01");
        assert!(matches!(
            coordinator.join().expect("coordinator thread"),
            Err(Error::DuplicateWorker(1))
        ));
    }

    #[test]
    fn coordinator_rejects_unknown_rank() {
        let (listener, port) = listen_on_available_port();
        let coordinator = spawn_coordinator(listener, 2, vec![]);
        let mut stray = connect(port);
        send_bytes_from!(stray, "80 00 00 00 00");
        assert!(matches!(
            coordinator.join().expect("coordinator thread"),
            Err(Error::UnknownWorker(0))
        ));
    }

    #[test]
    fn local_pipeline_reports_most_congested() {
        let readings = vec![
            Reading::new("08:00:00", 1, 5),
            Reading::new("08:00:00", 2, 7),
            Reading::new("09:00:00", 1, 3),
            Reading::new("08:10:00", 3, 1),
            Reading::new("08:20:00", 4, 2),
        ];
        let window = Window::new("08:00:00", "08:30:00");

        let by_total = run_local(
            readings.clone(),
            &window,
            3,
            &Coordinator::new(CoordinatorConfig::default()),
            WorkerConfig::default(),
        )
        .expect("report");
        assert_eq!(4, by_total.filtered);
        assert_eq!(
            vec![
                SensorTotal { sensor: 2, vehicles: 7 },
                SensorTotal { sensor: 1, vehicles: 5 },
                SensorTotal { sensor: 4, vehicles: 2 },
            ],
            by_total.ranking
        );

        let by_sensor = run_local(
            readings,
            &window,
            2,
            &Coordinator::new(CoordinatorConfig {
                ranking: RankingMode::SensorId,
                top: 3,
            }),
            WorkerConfig { local_sort: false },
        )
        .expect("report");
        assert_eq!(vec![4, 3, 2], by_sensor.ranking.iter().map(|entry| entry.sensor).collect::<Vec<_>>());
    }
}
