//! # comprehensive topology tests
//!
//! why: verify the equality, chaining and dedup rules recovery depends on
//! relations: tests tlog-core crate
//! what: endpoint refs, group equality, generation chaining, shared log dedup, wire codec

use std::sync::Arc;

use tlog_core::codec::{decode, encode};
use tlog_core::{
    BestPolicy, ConfigError, CoreState, EndpointRef, GenerationRecord, Locality, LocalityTags,
    LogGroup, LogServerInterface, LogSystemConfig, LogSystemConfigBuilder, LogSystemType,
    NetworkAddress, ReplicationPolicy, Uid,
};

fn addr(s: &str) -> NetworkAddress {
    s.parse().unwrap()
}

fn tlog(address: &str) -> EndpointRef {
    LogServerInterface::new(Uid::new_v4(), Uid::new_v4(), addr(address)).into()
}

fn unresolved() -> EndpointRef {
    EndpointRef::unresolved(Uid::new_v4())
}

fn zone_policy(count: u32) -> Arc<ReplicationPolicy> {
    Arc::new(ReplicationPolicy::across(count, LocalityTags::ZONE_ID, ReplicationPolicy::One))
}

fn group_of(tlogs: Vec<EndpointRef>) -> LogGroup {
    let count = tlogs.len() as u32;
    LogGroup {
        policy: Some(zone_policy(count)),
        ..LogGroup::new(tlogs, count)
    }
}

fn config_with(groups: Vec<LogGroup>) -> LogSystemConfig {
    LogSystemConfig::builder(LogSystemType::TagPartitioned)
        .log_groups(groups)
        .build()
        .unwrap()
}

// =============================================================================
// SECTION 1: ENDPOINT REF TESTS
// =============================================================================

mod endpoint_ref {
    use super::*;

    #[test]
    fn id_only_ref_is_not_present() {
        let id = Uid::new_v4();
        let r = EndpointRef::unresolved(id);

        assert!(!r.present());
        assert_eq!(r.id(), id);
        match r.interf() {
            Err(ConfigError::PreconditionViolation(msg)) => assert!(msg.contains(&id.to_string())),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }

    #[test]
    fn resolved_ref_exposes_interface() {
        let iface = LogServerInterface::new(Uid::new_v4(), Uid::new_v4(), addr("10.1.0.1:4500"));
        let r = EndpointRef::resolved(iface.clone());

        assert!(r.present());
        assert_eq!(r.id(), iface.id());
        assert_eq!(r.interf().unwrap().address(), addr("10.1.0.1:4500"));
    }

    #[test]
    fn raw_id_comparison_ignores_resolution() {
        let iface = LogServerInterface::new(Uid::new_v4(), Uid::new_v4(), addr("10.1.0.1:4500"));
        let id = iface.id();

        assert!(EndpointRef::resolved(iface) == id);
        assert!(EndpointRef::unresolved(id) == id);
    }

    #[test]
    fn round_trips_both_variants() {
        for r in [tlog("10.1.0.1:4500"), unresolved()] {
            let decoded: EndpointRef = decode(&encode(&r).unwrap()).unwrap();
            assert_eq!(decoded.id(), r.id());
            assert_eq!(decoded.present(), r.present());
            if let (Ok(a), Ok(b)) = (decoded.interf(), r.interf()) {
                assert_eq!(a, b);
            }
        }
    }
}

// =============================================================================
// SECTION 2: LOG GROUP EQUALITY TESTS
// =============================================================================

mod group_equality {
    use super::*;

    #[test]
    fn digest_equal_policies_compare_full_equal() {
        let tlogs = vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1"), tlog("10.0.0.3:1")];
        let a = LogGroup {
            policy: Some(zone_policy(3)),
            ..LogGroup::new(tlogs.clone(), 3)
        };
        let b = LogGroup {
            policy: Some(zone_policy(3)),
            ..LogGroup::new(tlogs, 3)
        };

        assert!(!Arc::ptr_eq(a.policy.as_ref().unwrap(), b.policy.as_ref().unwrap()));
        assert!(a.full_eq(&b));
        assert!(a.identity_eq(&b));
    }

    #[test]
    fn different_policy_content_breaks_equality() {
        let a = group_of(vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")]);
        let mut b = a.clone();
        b.policy = Some(Arc::new(ReplicationPolicy::across(2, LocalityTags::DC_ID, ReplicationPolicy::One)));

        assert!(!a.full_eq(&b));
        assert!(!a.identity_eq(&b));
    }

    #[test]
    fn policies_with_same_description_are_not_equal() {
        let tlogs = vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")];
        let split = ReplicationPolicy::All(vec![
            ReplicationPolicy::across(3, LocalityTags::ZONE_ID, ReplicationPolicy::One),
            ReplicationPolicy::across(2, LocalityTags::DC_ID, ReplicationPolicy::One),
        ]);
        let smuggled = ReplicationPolicy::All(vec![ReplicationPolicy::across(
            2,
            "zoneid^3 x One & dcid",
            ReplicationPolicy::One,
        )]);
        assert_eq!(split.to_string(), smuggled.to_string());

        let a = LogGroup {
            policy: Some(Arc::new(split)),
            ..LogGroup::new(tlogs.clone(), 2)
        };
        let b = LogGroup {
            policy: Some(Arc::new(smuggled)),
            ..LogGroup::new(tlogs, 2)
        };

        assert!(!a.full_eq(&b));
        assert!(!a.identity_eq(&b));
    }

    #[test]
    fn missing_policy_on_one_side_breaks_equality() {
        let a = group_of(vec![tlog("10.0.0.1:1")]);
        let mut b = a.clone();
        b.policy = None;

        assert!(!a.identity_eq(&b));
    }

    #[test]
    fn equal_durability_margin_is_not_equality() {
        let tlogs = vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1"), tlog("10.0.0.3:1")];
        let a = LogGroup {
            write_anti_quorum: 1,
            ..LogGroup::new(tlogs.clone(), 3)
        };
        let b = LogGroup {
            write_anti_quorum: 0,
            ..LogGroup::new(tlogs, 2)
        };

        assert_eq!(a.durability_margin(), 2);
        assert_eq!(b.durability_margin(), 2);
        assert!(!a.full_eq(&b));
        assert!(!a.identity_eq(&b));
    }

    #[test]
    fn unscoped_locality_is_not_a_wildcard() {
        let a = group_of(vec![tlog("10.0.0.1:1")]);
        let mut b = a.clone();
        b.locality = Locality(0);

        assert!(a.locality.is_unscoped());
        assert!(!a.full_eq(&b));
        assert!(!a.identity_eq(&b));
    }

    #[test]
    fn scalar_flags_participate() {
        let a = group_of(vec![tlog("10.0.0.1:1")]);

        let mut remote = a.clone();
        remote.is_local = false;
        assert!(!a.identity_eq(&remote));

        let mut legacy = a.clone();
        legacy.best_policy = BestPolicy::Default;
        assert!(!a.identity_eq(&legacy));
    }

    #[test]
    fn identity_eq_survives_reresolution() {
        let a = group_of(vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")]);
        let mut b = a.clone();
        b.tlogs = a
            .tlogs
            .iter()
            .map(|t| {
                let old = t.interf().unwrap();
                EndpointRef::from(LogServerInterface::new(old.id(), old.shared_id(), addr("10.9.9.9:1")))
            })
            .collect();

        assert!(a.identity_eq(&b));
        assert!(!a.full_eq(&b));
    }

    #[test]
    fn different_tlog_count_is_unequal() {
        let a = group_of(vec![tlog("10.0.0.1:1")]);
        let mut b = a.clone();
        b.tlogs.push(unresolved());

        assert!(!a.identity_eq(&b));
        assert!(!a.full_eq(&b));
    }
}

// =============================================================================
// SECTION 3: CROSS-EPOCH QUERIES
// =============================================================================

mod cross_epoch {
    use super::*;

    #[test]
    fn is_equal_ids_is_existential() {
        let g1 = group_of(vec![tlog("10.0.0.1:1")]);
        let g2 = group_of(vec![tlog("10.0.0.2:1"), tlog("10.0.0.3:1")]);
        let mut g3 = g2.clone();
        g3.tlogs = g2.tlogs.iter().map(|t| EndpointRef::unresolved(t.id())).collect();

        let a = config_with(vec![g1, g2]);
        let b = config_with(vec![g3]);

        assert!(a.is_equal_ids(&b));
        assert!(b.is_equal_ids(&a));
        assert!(!a.full_eq(&b));
    }

    #[test]
    fn is_equal_ids_false_without_any_match() {
        let a = config_with(vec![group_of(vec![tlog("10.0.0.1:1")])]);
        let b = config_with(vec![group_of(vec![tlog("10.0.0.1:1")])]);

        assert!(!a.is_equal_ids(&b));
    }

    #[test]
    fn next_generation_matches_latest_sealed_generation() {
        let g1 = group_of(vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")]);
        let c1 = config_with(vec![g1.clone()]);
        let c2 = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .log_group(group_of(vec![tlog("10.0.1.1:1")]))
            .old_generation(GenerationRecord::new(vec![g1], 1000))
            .build()
            .unwrap();

        assert!(c2.is_next_generation_of(&c1));
        assert!(c2.ensure_next_generation_of(&c1).is_ok());
    }

    #[test]
    fn next_generation_false_without_history() {
        let g1 = group_of(vec![tlog("10.0.0.1:1")]);
        let c1 = config_with(vec![g1.clone()]);
        let c2 = config_with(vec![g1]);

        assert!(!c2.is_next_generation_of(&c1));
        assert!(matches!(
            c2.ensure_next_generation_of(&c1),
            Err(ConfigError::ChainDiscontinuity { .. })
        ));
    }

    #[test]
    fn next_generation_only_looks_at_most_recent_record() {
        let g1 = group_of(vec![tlog("10.0.0.1:1")]);
        let c1 = config_with(vec![g1.clone()]);
        let c3 = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .old_generation(GenerationRecord::new(vec![group_of(vec![unresolved()])], 2000))
            .old_generation(GenerationRecord::new(vec![g1], 1000))
            .build()
            .unwrap();

        assert!(!c3.is_next_generation_of(&c1));
    }

    #[test]
    fn successor_chain_over_three_epochs() {
        let first = config_with(vec![group_of(vec![tlog("10.0.0.1:1")])]);
        let second = LogSystemConfigBuilder::successor_of(&first, 100)
            .log_group(group_of(vec![tlog("10.0.0.2:1")]))
            .build()
            .unwrap();
        let third = LogSystemConfigBuilder::successor_of(&second, 200)
            .log_group(group_of(vec![tlog("10.0.0.3:1")]))
            .build()
            .unwrap();

        assert!(second.is_next_generation_of(&first));
        assert!(third.is_next_generation_of(&second));
        assert!(!third.is_next_generation_of(&first));
        let ends: Vec<i64> = third.old_generations().iter().map(|g| g.epoch_end).collect();
        assert_eq!(ends, vec![200, 100]);
    }

    #[test]
    fn all_present_logs_skips_unresolved() {
        let resolved = tlog("10.0.0.1:1");
        let config = config_with(vec![
            group_of(vec![resolved.clone(), unresolved()]),
            group_of(vec![unresolved()]),
        ]);

        let present = config.all_present_logs();
        assert_eq!(present.len(), 1);
        assert_eq!(present[0].id(), resolved.id());
    }

    #[test]
    fn all_present_logs_ignores_history() {
        let config = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .old_generation(GenerationRecord::new(vec![group_of(vec![tlog("10.0.0.1:1")])], 10))
            .build()
            .unwrap();

        assert!(config.all_present_logs().is_empty());
    }
}

// =============================================================================
// SECTION 4: SHARED LOG DEDUPLICATION
// =============================================================================

mod shared_logs {
    use super::*;

    fn sharing(shared: Uid, address: &str) -> EndpointRef {
        LogServerInterface::new(Uid::new_v4(), shared, addr(address)).into()
    }

    #[test]
    fn same_shared_id_across_epochs_appears_once() {
        let shared = Uid::new_v4();
        let config = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .log_group(group_of(vec![sharing(shared, "10.0.0.1:4500")]))
            .old_generation(GenerationRecord::new(
                vec![group_of(vec![sharing(shared, "10.0.0.1:4500")])],
                50,
            ))
            .build()
            .unwrap();

        let logs = config.all_shared_logs().unwrap();
        assert_eq!(logs, vec![(shared, addr("10.0.0.1:4500"))]);
    }

    #[test]
    fn results_are_sorted_by_id_then_address() {
        let low = Uid::from_u128(1);
        let high = Uid::from_u128(2);
        let config = config_with(vec![group_of(vec![
            sharing(high, "10.0.0.1:4500"),
            sharing(low, "10.0.0.2:4500"),
            unresolved(),
        ])]);

        let logs = config.all_shared_logs().unwrap();
        assert_eq!(
            logs,
            vec![(low, addr("10.0.0.2:4500")), (high, addr("10.0.0.1:4500"))]
        );
    }

    #[test]
    fn one_id_at_two_addresses_is_an_invariant_violation() {
        let shared = Uid::new_v4();
        let config = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .log_group(group_of(vec![sharing(shared, "10.0.0.1:4500")]))
            .old_generation(GenerationRecord::new(
                vec![group_of(vec![sharing(shared, "10.0.0.7:4500")])],
                50,
            ))
            .build()
            .unwrap();

        assert!(matches!(config.all_shared_logs(), Err(ConfigError::InvariantViolation(_))));
    }
}

// =============================================================================
// SECTION 5: SNAPSHOT EQUALITY AND BUILDING
// =============================================================================

mod snapshot {
    use super::*;

    fn sample() -> LogSystemConfig {
        let tags = LocalityTags::new().with(LocalityTags::ZONE_ID, "z1");
        let mut current = group_of(vec![tlog("10.0.0.1:4500"), unresolved()]);
        current.tlog_localities = vec![tags.clone(), tags];
        current.log_routers = vec![tlog("10.0.0.9:4500")];
        current.locality = Locality(1);

        LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .log_group(current)
            .old_generation(GenerationRecord::new(vec![group_of(vec![unresolved()])], 700))
            .expected_log_sets(1)
            .min_routers(1)
            .build()
            .unwrap()
    }

    #[test]
    fn full_eq_is_reflexive_and_sees_history() {
        let a = sample();
        assert!(a.full_eq(&a.clone()));

        let b = LogSystemConfigBuilder::successor_of(&a, 900).build().unwrap();
        assert!(!a.full_eq(&b));
    }

    #[test]
    fn misaligned_localities_are_rejected() {
        let mut group = group_of(vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")]);
        group.tlog_localities = vec![LocalityTags::new()];

        let result = LogSystemConfig::builder(LogSystemType::TagPartitioned)
            .log_group(group)
            .build();
        assert!(matches!(result, Err(ConfigError::InvariantViolation(_))));
    }

    #[test]
    fn config_round_trips_through_codec() {
        let config = sample();
        let decoded: LogSystemConfig = decode(&encode(&config).unwrap()).unwrap();

        assert!(decoded.full_eq(&config));
        assert_eq!(decoded.log_groups()[0].log_routers.len(), 1);
        assert_eq!(decoded.log_groups()[0].tlog_localities[0].zone_id(), Some("z1"));
    }

    #[test]
    fn truncated_payload_is_an_encoding_error() {
        let bytes = encode(&sample()).unwrap();
        let truncated = &bytes[..bytes.len() - 3];

        assert!(matches!(decode::<LogSystemConfig>(truncated), Err(ConfigError::Encoding(_))));
    }

    #[test]
    fn display_mentions_generation_count() {
        assert!(sample().to_string().starts_with("type: TagPartitioned oldGenerations: 1 ["));
    }
}

// =============================================================================
// SECTION 6: CORE STATE
// =============================================================================

mod core_state {
    use super::*;

    #[test]
    fn core_state_rebuilds_id_equal_config() {
        let first = config_with(vec![group_of(vec![tlog("10.0.0.1:1"), tlog("10.0.0.2:1")])]);
        let second = LogSystemConfigBuilder::successor_of(&first, 400)
            .log_group(group_of(vec![tlog("10.0.0.3:1")]))
            .build()
            .unwrap();

        let core = CoreState::from_config(&second, 7);
        let rebuilt = core.to_config().unwrap();

        assert!(rebuilt.is_equal_ids(&second));
        assert!(rebuilt.is_next_generation_of(&first));
        assert!(rebuilt.all_present_logs().is_empty());
        assert_eq!(core.prior_committed_log_servers().len(), 2);
    }

    #[test]
    fn core_state_round_trips_through_codec() {
        let config = config_with(vec![group_of(vec![tlog("10.0.0.1:1")])]);
        let core = CoreState::from_config(&config, 3);
        let decoded: CoreState = decode(&encode(&core).unwrap()).unwrap();

        assert!(decoded.full_eq(&core));
    }
}
