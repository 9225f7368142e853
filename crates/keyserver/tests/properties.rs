//! Property tests for version monotonicity and replication

use keyserver::prelude::*;
use keyserver::testing::{ManualTimer, SequenceKeyGenerator};
use proptest::prelude::*;
use std::sync::Arc;

fn server_with(generator: SequenceKeyGenerator) -> KeyServer {
    KeyServer::builder()
        .timer(Arc::new(ManualTimer::new()))
        .generator(Arc::new(generator))
        .build()
        .unwrap()
}

proptest! {
    /// Every batch bumps the version by exactly one, whatever fails inside it.
    #[test]
    fn version_increments_by_one_per_batch(
        batches in 1usize..20,
        failing in proptest::collection::hash_set(0u64..60, 0..20),
    ) {
        let server = server_with(SequenceKeyGenerator::new().failing_on(failing));

        let mut previous = server.rotating_version();
        prop_assert_eq!(previous, 0);
        for _ in 0..batches {
            let report = server.generate_all_rotating_secrets();
            prop_assert_eq!(report.version, previous + 1);
            prop_assert_eq!(server.rotating_version(), previous + 1);
            prop_assert_eq!(report.rotated.len() + report.failed.len(), ROTATING_SERVICES.len());
            previous = report.version;
        }
    }

    /// A snapshot exists iff the caller is behind, and then it is exactly
    /// the current state.
    #[test]
    fn snapshot_is_gated_on_version(batches in 0usize..6, since in 0u64..10) {
        let server = server_with(SequenceKeyGenerator::new());
        for _ in 0..batches {
            server.generate_all_rotating_secrets();
        }
        let current = server.rotating_version();

        match server.updated_rotating(since).unwrap() {
            None => prop_assert!(since >= current),
            Some(snapshot) => {
                prop_assert!(since < current);
                prop_assert_eq!(snapshot.version, current);
                let decoded = keyserver::sync::decode(&snapshot.payload).unwrap();
                prop_assert_eq!(decoded, server.rotating_state());
            }
        }
    }

    /// Applying a full snapshot on a fresh replica reproduces the source.
    #[test]
    fn apply_reproduces_source_state(
        batches in 1usize..8,
        retained in 1usize..5,
        failing in proptest::collection::hash_set(0u64..24, 0..6),
    ) {
        let leader = KeyServer::builder()
            .config(KeyServerConfig {
                retained_generations: retained,
                ..KeyServerConfig::default()
            })
            .timer(Arc::new(ManualTimer::new()))
            .generator(Arc::new(SequenceKeyGenerator::new().failing_on(failing)))
            .build()
            .unwrap();
        for _ in 0..batches {
            leader.generate_all_rotating_secrets();
        }
        let follower = server_with(SequenceKeyGenerator::new());

        let snapshot = leader.updated_rotating(0).unwrap().unwrap();
        follower.decode_rotating(&snapshot.payload).unwrap();

        prop_assert_eq!(follower.rotating_state(), leader.rotating_state());
    }
}
