//! Control loop behavior through the coordinator handle.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use net_failover::coordinator::Phase;
use net_failover::health::HealthState;
use net_failover::route::{MemoryRouteTable, RoutingEntry};
use net_failover::FailoverError;

mod common;

use common::{config, Harness};

#[tokio::test]
async fn test_existing_primary_is_adopted_without_mutation() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));

    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));
    assert_eq!(h.handle.phase().await.unwrap(), Phase::Steady);
    assert_eq!(h.table.mutation_count(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_startup_switches_off_a_dead_primary() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));

    h.feed("wwan0", true, 3).await;
    h.feed("eth0", false, 3).await;

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));
    assert_eq!(h.table.mutation_count(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_debounce_ignores_short_flaps() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.feed("eth0", false, 2).await;
    h.feed("eth0", true, 1).await;
    h.feed("eth0", false, 2).await;

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));
    let status = h.handle.interface_status().await.unwrap();
    assert_eq!(status[0].health, HealthState::Up);
    h.stop().await;
}

#[tokio::test]
async fn test_failover_then_no_automatic_failback() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.feed("eth0", false, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));

    h.feed("eth0", true, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));
    assert_eq!(h.table.mutation_count(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_override_to_up_interface_is_accepted_and_sticks() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.handle.force_gateway("wwan0").await.unwrap();
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));

    // A healthy gateway is not preempted by a higher-priority one.
    h.feed("eth0", false, 3).await;
    h.feed("eth0", true, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));
    h.stop().await;
}

#[tokio::test]
async fn test_override_rejections() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", false, 3).await;

    let err = h.handle.force_gateway("wwan0").await.unwrap_err();
    assert_eq!(
        err,
        FailoverError::InterfaceNotUp {
            name: "wwan0".into(),
            health: HealthState::Down
        }
    );

    let err = h.handle.force_gateway("wlan9").await.unwrap_err();
    assert_eq!(err, FailoverError::UnknownInterface("wlan9".into()));

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));
    assert_eq!(h.table.mutation_count(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_override_to_unknown_health_is_rejected() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    let err = h.handle.force_gateway("wwan0").await.unwrap_err();
    assert!(matches!(
        err,
        FailoverError::InterfaceNotUp { health: HealthState::Unknown, .. }
    ));
    h.stop().await;
}

#[tokio::test]
async fn test_degraded_and_recovery() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.feed("eth0", false, 3).await;
    h.feed("wwan0", false, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap(), None);
    assert_eq!(h.handle.phase().await.unwrap(), Phase::Degraded);

    h.feed("eth0", true, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));
    assert_eq!(h.handle.phase().await.unwrap(), Phase::Steady);
    h.stop().await;
}

#[tokio::test]
async fn test_failed_override_apply_keeps_current_gateway() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.table.fail_next_promotions(10);
    let err = h.handle.force_gateway("wwan0").await.unwrap_err();
    assert!(matches!(err, FailoverError::ApplyFailed { attempts: 3, .. }));

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));
    assert_eq!(h.handle.phase().await.unwrap(), Phase::Steady);
    h.stop().await;
}

#[tokio::test]
async fn test_failed_automatic_apply_degrades() {
    let h = Harness::start(&config(&["eth0", "wwan0"]));
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.table.fail_next_promotions(3);
    h.feed("eth0", false, 3).await;
    assert_eq!(h.handle.phase().await.unwrap(), Phase::Degraded);
    assert_eq!(h.table.mutation_count(), 0);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_override_times_out() {
    let mut cfg = config(&["eth0", "wwan0"]);
    cfg.api.force_timeout_secs = 1;
    cfg.route.base_delay_ms = 5_000;
    cfg.route.max_delay_ms = 5_000;
    let h = Harness::start(&cfg);
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;

    h.table.fail_next_promotions(10);
    let err = h.handle.force_gateway("wwan0").await.unwrap_err();
    assert_eq!(err, FailoverError::Timeout(Duration::from_secs(1)));
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_resync_adopts_external_route_change() {
    let mut cfg = config(&["eth0", "wwan0"]);
    cfg.route.resync_interval_secs = 1;
    let table = Arc::new(MemoryRouteTable::seeded(&cfg.interfaces));
    let h = Harness::with_table(&cfg, table.clone());
    h.feed("eth0", true, 3).await;
    h.feed("wwan0", true, 3).await;
    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("eth0"));

    table.replace(vec![
        RoutingEntry::new("wwan0", Ipv4Addr::new(10, 0, 0, 1), 50),
        RoutingEntry::new("eth0", Ipv4Addr::new(192, 168, 1, 1), 100),
    ]);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.handle.default_gateway().await.unwrap().as_deref(), Some("wwan0"));
    let routes = h.handle.routes().await.unwrap();
    assert_eq!(routes.len(), 2);
    h.stop().await;
}

#[tokio::test]
async fn test_stopped_coordinator_reports_unavailable() {
    let h = Harness::start(&config(&["eth0"]));
    let handle = h.handle.clone();
    h.stop().await;

    assert_eq!(handle.default_gateway().await.unwrap_err(), FailoverError::CoordinatorStopped);
    assert_eq!(handle.force_gateway("eth0").await.unwrap_err(), FailoverError::CoordinatorStopped);
}
