//! Startup and shutdown behavior of the whole service.

use std::time::Duration;

use admin_portal::config::{self, ConfigError, Environment};
use admin_portal::db::{DbError, PoolState};
use admin_portal::lifecycle::{startup, Shutdown, StartupError};

mod common;

#[tokio::test]
async fn serves_until_shutdown_then_closes_pool() {
    let proxy_addr = "127.0.0.1:28481";
    let config = common::test_config(Environment::Test, proxy_addr);
    let db = common::pool_manager(&config);

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(startup::run(config, db.clone(), rx));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(db.state(), PoolState::Ready);

    let res = common::client()
        .post(format!("http://{}/api/admin/logout", proxy_addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    let cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("admin_session=;"));
    assert!(cookie.contains("Max-Age=0"));

    assert!(shutdown.trigger());
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("shutdown did not complete")
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(db.state(), PoolState::Terminated);
    assert!(matches!(db.acquire().await, Err(DbError::Closed)));
}

#[tokio::test]
async fn production_exits_when_database_unreachable() {
    let config = common::test_config(Environment::Production, "127.0.0.1:28482");
    let db = common::pool_manager(&config);

    let shutdown = Shutdown::new();
    let err = startup::run(config, db.clone(), shutdown.subscribe())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StartupError::Database(DbError::Unreachable { attempts: 3, .. })
    ));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(db.state(), PoolState::Terminated);

    // Never got as far as binding.
    assert!(tokio::net::TcpStream::connect("127.0.0.1:28482").await.is_err());
}

#[tokio::test]
async fn development_keeps_running_without_database() {
    let proxy_addr = "127.0.0.1:28483";
    let config = common::test_config(Environment::Development, proxy_addr);
    let db = common::pool_manager(&config);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(startup::run(config, db.clone(), shutdown.subscribe()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!handle.is_finished(), "process must keep running");
    assert_eq!(db.state(), PoolState::Ready);

    let res = common::client()
        .post(format!("http://{}/api/admin/logout", proxy_addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("shutdown did not complete")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn shutdown_during_probe_exits_cleanly() {
    let mut config = common::test_config(Environment::Production, "127.0.0.1:28484");
    config.database.probe_backoff_ms = 60_000;
    let db = common::pool_manager(&config);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(startup::run(config, db.clone(), shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("shutdown did not complete")
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(db.state(), PoolState::Terminated);
}

#[test]
fn missing_database_url_is_fatal() {
    let err: StartupError = config::load(None, |_| None).unwrap_err().into();

    assert!(matches!(
        err,
        StartupError::Config(ConfigError::MissingDatabaseUrl)
    ));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn bind_failure_closes_pool() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap().to_string();

    let config = common::test_config(Environment::Test, &addr);
    let db = common::pool_manager(&config);

    let shutdown = Shutdown::new();
    let err = startup::run(config, db.clone(), shutdown.subscribe())
        .await
        .unwrap_err();

    assert!(matches!(err, StartupError::Bind { .. }));
    assert_eq!(db.state(), PoolState::Terminated);
}
