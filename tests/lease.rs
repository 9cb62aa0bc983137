#[cfg(test)]
mod tests {
    use quarry::{ConnectionString, Executor, LeaseConfig, LeaseManager, OrmError};
    use quarry_tests::{MockConnection, MockDriver, MockServer, init_logs, silent_logs};
    use std::{sync::Arc, thread, time::Duration};
    use tokio::{runtime::Handle, time::sleep};

    fn leases(grace_ms: u64) -> LeaseManager<MockConnection> {
        LeaseManager::new(
            LeaseConfig::new()
                .grace_period(Duration::from_millis(grace_ms))
                .sweep_interval(Duration::from_secs(60)),
        )
    }

    fn url_of(server: &MockServer) -> ConnectionString {
        ConnectionString::for_driver::<MockDriver>(&server.url()).unwrap()
    }

    #[tokio::test]
    async fn shared_then_closed_after_grace() {
        init_logs();
        let server = MockServer::start("lease-shared");
        let url = url_of(&server);
        let leases = leases(50);

        let a = leases.acquire(&url).await.unwrap();
        let b = leases.acquire(&url).await.unwrap();
        assert!(Arc::ptr_eq(a.handle(), b.handle()));
        assert_eq!(a.key(), "mock://lease-shared/db");
        assert_eq!(server.connects(), 1);
        assert_eq!(leases.references(&url), 2);

        drop(a);
        assert_eq!(leases.references(&url), 1);
        assert!(leases.released_at(&url).is_none());

        b.release();
        assert_eq!(leases.references(&url), 0);
        assert!(leases.released_at(&url).is_some());
        assert!(leases.is_open(&url));
        assert_eq!(server.disconnects(), 0);

        sleep(Duration::from_millis(250)).await;
        assert_eq!(server.disconnects(), 1);
        assert!(!leases.is_open(&url));
        assert!(leases.is_empty());
    }

    #[tokio::test]
    async fn reacquired_within_grace() {
        let server = MockServer::start("lease-grace");
        let url = url_of(&server);
        let leases = leases(150);

        leases.acquire(&url).await.unwrap().release();
        sleep(Duration::from_millis(20)).await;
        let lease = leases.acquire(&url).await.unwrap();
        assert_eq!(server.connects(), 1);
        assert!(leases.released_at(&url).is_none());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(server.disconnects(), 0);
        assert!(leases.is_open(&url));

        // Still usable after the first grace period expired
        server.respond_affected(2);
        assert_eq!(lease.execute("DELETE".into()).await.unwrap().rows_affected, 2);

        drop(lease);
        sleep(Duration::from_millis(400)).await;
        assert_eq!(server.disconnects(), 1);
        assert_eq!(server.connects(), 1);
    }

    #[tokio::test]
    async fn connection_failure() {
        let server = MockServer::start("lease-failure");
        let url = url_of(&server);
        let leases = leases(50);

        server.fail_connect(true);
        silent_logs! {
            let error = leases.acquire(&url).await.unwrap_err();
            assert!(
                error
                    .downcast_ref::<OrmError>()
                    .is_some_and(OrmError::is_connection)
            );
            assert!(format!("{error:#}").contains("refused"));
        }
        assert_eq!(leases.references(&url), 0);
        assert_eq!(server.connects(), 0);

        server.fail_connect(false);
        let lease = leases.acquire(&url).await.unwrap();
        assert_eq!(server.connects(), 1);
        assert_eq!(leases.references(&url), 1);
        drop(lease);

        let missing = ConnectionString::parse("mock://lease-missing/db").unwrap();
        silent_logs! {
            assert!(leases.acquire(&missing).await.is_err());
        }
    }

    #[tokio::test]
    async fn keyed_by_database() {
        let server = MockServer::start("lease-keys");
        let leases = leases(50);
        let plain = url_of(&server);
        let with_options =
            ConnectionString::parse(&format!("{}?timeout=5", server.url())).unwrap();
        let other = ConnectionString::parse("mock://lease-keys/other").unwrap();

        let a = leases.acquire(&plain).await.unwrap();
        let b = leases.acquire(&with_options).await.unwrap();
        let c = leases.acquire(&other).await.unwrap();
        assert!(Arc::ptr_eq(a.handle(), b.handle()));
        assert!(!Arc::ptr_eq(a.handle(), c.handle()));
        assert_eq!(leases.len(), 2);
        assert_eq!(server.connects(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweep_reclaims_exited_threads() {
        let server = MockServer::start("lease-sweep");
        let url = url_of(&server);
        let leases = leases(200);

        let local = leases.acquire(&url).await.unwrap();
        let remote = {
            let handle = Handle::current();
            let leases = leases.clone();
            let url = url.clone();
            thread::spawn(move || handle.block_on(leases.acquire(&url)))
                .join()
                .unwrap()
                .unwrap()
        };
        assert!(!Arc::ptr_eq(local.handle(), remote.handle()));
        assert_eq!(server.connects(), 2);
        assert_eq!(leases.len(), 2);

        assert_eq!(leases.sweep(), 1);
        assert_eq!(leases.sweep(), 0);
        // Released by the sweep already
        drop(remote);

        sleep(Duration::from_millis(600)).await;
        assert_eq!(server.disconnects(), 1);
        assert_eq!(leases.len(), 1);
        assert_eq!(leases.references(&url), 1);
        drop(local);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shared_across_threads() {
        let server = MockServer::start("lease-threads");
        let url = url_of(&server);
        let leases = LeaseManager::<MockConnection>::new(
            LeaseConfig::new()
                .thread_affine(false)
                .grace_period(Duration::from_millis(50)),
        );

        let local = leases.acquire(&url).await.unwrap();
        let remote = {
            let handle = Handle::current();
            let leases = leases.clone();
            let url = url.clone();
            thread::spawn(move || handle.block_on(leases.acquire(&url)))
                .join()
                .unwrap()
                .unwrap()
        };
        assert!(Arc::ptr_eq(local.handle(), remote.handle()));
        assert_eq!(server.connects(), 1);
        assert_eq!(leases.references(&url), 2);
        assert_eq!(leases.sweep(), 0);

        drop(remote);
        drop(local);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(server.disconnects(), 1);
    }

    #[test]
    fn scheme_must_match_driver() {
        let error = ConnectionString::for_driver::<MockDriver>("postgres://localhost/db")
            .unwrap_err();
        assert!(
            error
                .downcast_ref::<OrmError>()
                .is_some_and(OrmError::is_configuration)
        );
    }
}
