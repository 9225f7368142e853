//! Integration tests for leader to follower replication of rotating secrets

use keyserver::prelude::*;
use keyserver::testing::{ManualTimer, SequenceKeyGenerator};
use keyserver::DecodeError;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Helper to create a server that never fires on its own
fn server() -> KeyServer {
    KeyServer::builder()
        .timer(Arc::new(ManualTimer::new()))
        .generator(Arc::new(SequenceKeyGenerator::new()))
        .build()
        .unwrap()
}

/// Helper to create a leader that has run `batches` regeneration batches
fn leader(batches: usize) -> KeyServer {
    let leader = server();
    for _ in 0..batches {
        leader.generate_all_rotating_secrets();
    }
    leader
}

#[test]
fn stale_follower_catches_up() {
    // GIVEN: A leader at version 1 and a fresh follower at version 0
    let leader = leader(1);
    let follower = server();

    // WHEN: The follower asks for updates since its version
    let snapshot = leader
        .updated_rotating(follower.rotating_version())
        .unwrap()
        .expect("leader is ahead");

    // THEN: The snapshot carries version 1 and applies cleanly
    assert_eq!(snapshot.version, 1);
    let applied = follower.decode_rotating(&snapshot.payload).unwrap();

    assert_eq!(follower.rotating_version(), 1);
    assert_eq!(applied, leader.rotating_state());
    assert_eq!(follower.rotating_state(), leader.rotating_state());
    for service in ROTATING_SERVICES {
        assert_eq!(
            follower.get_service_secret(service),
            leader.get_service_secret(service)
        );
    }
}

#[test]
fn up_to_date_follower_gets_nothing() {
    // GIVEN: Leader and follower both at version 1
    let leader = leader(1);
    let follower = server();
    let snapshot = leader.updated_rotating(0).unwrap().unwrap();
    follower.decode_rotating(&snapshot.payload).unwrap();

    // WHEN / THEN: No update and no payload
    assert!(leader.updated_rotating(follower.rotating_version()).unwrap().is_none());
}

#[test]
fn follower_ahead_of_leader_gets_nothing() {
    let leader = leader(2);
    assert!(leader.updated_rotating(5).unwrap().is_none());
}

#[test]
fn apply_does_not_check_freshness() {
    // GIVEN: A follower already at version 3
    let follower = leader(3);
    let old = leader(1).updated_rotating(0).unwrap().unwrap();

    // WHEN: An older payload is applied anyway
    follower.decode_rotating(&old.payload).unwrap();

    // THEN: It replaces local state unconditionally
    assert_eq!(follower.rotating_version(), 1);
}

#[test]
fn malformed_payload_leaves_state_untouched() {
    let follower = leader(2);
    let before = follower.rotating_state();
    let good = leader(1).updated_rotating(0).unwrap().unwrap().payload;

    let truncated = follower.decode_rotating(&good[..good.len() - 3]).unwrap_err();
    assert!(matches!(
        truncated,
        KeyServerError::Decode(DecodeError::Malformed(_))
    ));

    let mut trailing = good.clone();
    trailing.push(0xff);
    let err = follower.decode_rotating(&trailing).unwrap_err();
    assert!(matches!(
        err,
        KeyServerError::Decode(DecodeError::TrailingBytes { count: 1 })
    ));

    let err = follower.decode_rotating(&[]).unwrap_err();
    assert!(!err.is_fatal());

    assert_eq!(follower.rotating_state(), before);
}

#[test]
fn replicated_generations_keep_their_ids() {
    // GIVEN: A leader with several retained generations per class
    let leader = leader(4);
    let follower = server();

    // WHEN: The follower catches up
    let snapshot = leader.updated_rotating(0).unwrap().unwrap();
    follower.decode_rotating(&snapshot.payload).unwrap();

    // THEN: Every retained generation resolves by id on the follower
    for service in ROTATING_SERVICES {
        let ids: Vec<_> = leader
            .service_secrets(service)
            .iter()
            .map(|s| s.secret_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
        for id in ids {
            assert_eq!(
                follower.get_service_secret_by_id(service, id),
                leader.get_service_secret_by_id(service, id)
            );
        }
    }
}

#[test]
fn follower_continues_rotation_from_replicated_ids() {
    let leader = leader(2);
    let follower = server();
    let snapshot = leader.updated_rotating(0).unwrap().unwrap();
    follower.decode_rotating(&snapshot.payload).unwrap();

    // A follower promoted to authority keeps numbering where the leader stopped
    let report = follower.generate_all_rotating_secrets();
    assert_eq!(report.version, 3);
    assert_eq!(
        follower.get_service_secret(EntityType::Monitor).unwrap().secret_id,
        3
    );
}

/// Helper to encode a leader's state after editing its JSON form
fn forged(batches: usize, edit: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
    let mut json = serde_json::to_value(leader(batches).rotating_state()).unwrap();
    edit(&mut json);
    let state: RotatingState = serde_json::from_value(json).unwrap();
    keyserver::sync::encode(&state).unwrap()
}

#[test]
fn exhausted_counters_are_rejected_and_rotation_continues() {
    // GIVEN: A follower at version 1
    let follower = leader(1);
    let before = follower.rotating_state();

    // WHEN: Payloads with counters at their maximum are applied
    let version = forged(1, |json| json["version"] = u64::MAX.into());
    let secret_id = forged(1, |json| {
        json["secrets"]["metadata-node"][0]["secret_id"] = u64::MAX.into();
    });

    // THEN: Both are rejected and the follower still rotates
    assert!(matches!(
        follower.decode_rotating(&version).unwrap_err(),
        KeyServerError::Decode(DecodeError::VersionOutOfRange { .. })
    ));
    assert!(matches!(
        follower.decode_rotating(&secret_id).unwrap_err(),
        KeyServerError::Decode(DecodeError::SecretIdOutOfRange {
            service: EntityType::MetadataNode,
            ..
        })
    ));
    assert_eq!(follower.rotating_state(), before);

    let report = follower.generate_all_rotating_secrets();
    assert!(report.is_complete());
    assert_eq!(report.version, 2);
}

#[test]
fn replicated_secrets_for_non_rotating_classes_are_rejected() {
    // GIVEN: A payload that also carries an auth class
    let follower = server();
    let payload = forged(1, |json| {
        json["secrets"]["auth"] = json["secrets"]["monitor"].clone();
    });

    // WHEN: The follower applies it
    let err = follower.decode_rotating(&payload).unwrap_err();

    // THEN: Nothing is installed and auth still has no service secret
    assert!(matches!(
        err,
        KeyServerError::Decode(DecodeError::UnexpectedService {
            service: EntityType::Auth
        })
    ));
    assert_eq!(follower.rotating_version(), 0);
    assert!(follower.get_service_secret(EntityType::Auth).is_none());
}
