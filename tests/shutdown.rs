//! Store shutdown and leaked-connection cleanup.

mod common;

use common::*;
use triaddb::prelude::*;
use triaddb::ConnectionError;

#[test]
fn shutdown_force_closes_leaked_connections() {
    let (db, backend) = open();
    let leaked = db.connect().unwrap();
    leaked.add_statement(&st(1)).unwrap();

    db.shutdown().unwrap();

    assert!(!leaked.is_open());
    // the leaked connection's uncommitted work was rolled back
    assert_eq!(backend.committed_len(), 0);
    assert_eq!(db.metrics().connections_force_closed, 1);
    assert_eq!(db.metrics().active_connections, 0);
}

#[test]
fn shutdown_is_idempotent() {
    let (db, _) = open();
    db.shutdown().unwrap();
    db.shutdown().unwrap();
    assert!(!db.is_open());
}

#[test]
fn connect_after_shutdown_is_rejected() {
    let (db, _) = open();
    db.shutdown().unwrap();
    assert!(matches!(
        db.store().connect(),
        Err(ConnectionError::StoreClosed)
    ));
    assert!(matches!(db.connect(), Err(triaddb::Error::StoreClosed)));
}

#[test]
fn cleanly_closed_connections_are_not_counted_as_leaked() {
    let (db, _) = open();
    let conn = db.connect().unwrap();
    conn.close().unwrap();

    db.shutdown().unwrap();
    assert_eq!(db.metrics().connections_force_closed, 0);
}

#[test]
fn committed_work_survives_shutdown() {
    let (db, backend) = open();
    let conn = db.connect().unwrap();
    conn.add_statement(&st(1)).unwrap();
    conn.commit().unwrap();

    db.shutdown().unwrap();
    assert_eq!(backend.committed_len(), 1);
}

#[test]
fn fulltext_observer_hears_about_forced_rollbacks() {
    let observer = RecordingObserver::new();
    let (db, _) = open_with(Triad::builder().fulltext_observer(observer.clone()));
    let leaked = db.connect().unwrap();
    leaked.add_statement(&st(1)).unwrap();

    db.shutdown().unwrap();
    assert_eq!(observer.not_committed(), 1);
    assert_eq!(observer.committed(), 0);
}

#[test]
fn store_metrics_track_connection_counts() {
    let (db, _) = open();
    let a = db.connect().unwrap();
    let _b = db.connect().unwrap();
    assert_eq!(db.metrics().connections_opened, 2);
    assert_eq!(db.metrics().active_connections, 2);

    a.close().unwrap();
    assert_eq!(db.metrics().active_connections, 1);
}
