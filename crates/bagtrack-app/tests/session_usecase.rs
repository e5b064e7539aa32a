mod support;

use bagtrack_app::App;
use bagtrack_core::mutator::{MutationError, QueueAdjustment};
use bagtrack_core::persistence::{PersistenceError, STATE_KEY};
use bagtrack_core::prefs::PreferenceChange;
use bagtrack_core::probability::ProbabilityQuery;
use bagtrack_core::state::{BagState, SlotMark};
use bagtrack_core::store::{FileStore, KeyValueStore, MemoryStore};

use support::{FlakyStore, seed_state};

#[test]
fn empty_store_opens_with_default_grid() {
    let store = MemoryStore::new();
    let session = App::new(&store).open();

    assert_eq!(session.snapshot(), BagState::default());
    assert!(session.startup_notice().is_none());
    assert_eq!(session.derived_ratios().hit_ratio_label(), "16.0");
}

#[test]
fn every_accepted_action_is_saved_and_survives_reopen() {
    let temp = tempfile::tempdir().expect("temp dir");
    let store = FileStore::new(temp.path().join("store"));
    let app = App::new(&store);

    let mut session = app.open();
    session.change_queue(QueueAdjustment::Reserve);
    let applied = session.toggle_slot(12).expect("toggle");
    assert_eq!(applied.value, SlotMark::Sold);
    assert!(applied.save_warning.is_none());
    session.toggle_slot(12).expect("chase");
    session.change_bag_count(5).expect("more bags");
    let mut expected = session.snapshot();
    expected.clear_flash();

    let reopened = app.open();
    assert_eq!(reopened.snapshot(), expected);
    assert_eq!(reopened.state().bag_count(), 55);
    assert_eq!(reopened.derived_ratios().remaining_chases, 7);
}

#[test]
fn rejected_bag_decrease_is_typed_and_leaves_storage_alone() {
    let store = MemoryStore::new();
    seed_state(
        &store,
        r#"{"bagCount":10,"chaseCount":2,"selectedNumbers":[9,10],"chaseNumbers":[],"remainingChases":2}"#,
    );
    let stored_before = store.get(STATE_KEY).expect("get");

    let mut session = App::new(&store).open();
    let before = session.snapshot();
    let error = session.change_bag_count(-5).expect_err("orphaned slots");

    let typed = error
        .downcast_ref::<MutationError>()
        .expect("typed mutation error");
    assert!(matches!(
        typed,
        MutationError::WouldOrphanSelection { target: 5, .. }
    ));
    assert!(error.to_string().contains("9, 10"));
    assert_eq!(session.snapshot(), before);
    assert_eq!(store.get(STATE_KEY).expect("get"), stored_before);
}

#[test]
fn rejected_chase_decrease_reports_blocking_count() {
    let store = MemoryStore::new();
    seed_state(
        &store,
        r#"{"bagCount":10,"chaseCount":5,"selectedNumbers":[1,2,3],"chaseNumbers":[1,2,3],"remainingChases":2}"#,
    );

    let mut session = App::new(&store).open();
    let error = session.change_chase_count(-3).expect_err("orphaned chases");
    assert!(matches!(
        error.downcast_ref::<MutationError>(),
        Some(MutationError::WouldOrphanChases { marked: 3, .. })
    ));

    let applied = session.change_chase_count(-2).expect("down to marked");
    assert_eq!(applied.value, 3);
    assert_eq!(applied.ratios.remaining_chases, 0);
    assert!(applied.ratios.cooked);
}

#[test]
fn chase_count_changes_recompute_remaining_across_directions() {
    let store = MemoryStore::new();
    let mut session = App::new(&store).open();
    session.toggle_slot(1).expect("sold");
    session.toggle_slot(1).expect("chase");
    session.toggle_slot(2).expect("sold");
    session.toggle_slot(2).expect("chase");

    session.change_chase_count(-3).expect("fewer");
    session.change_chase_count(4).expect("more");
    session.change_chase_count(-1).expect("fewer again");

    assert_eq!(session.state().chase_count(), 8);
    assert_eq!(session.state().remaining_chases(), 6);
    assert_eq!(session.state().marked_chases(), 2);
}

#[test]
fn invalid_slot_is_rejected_without_saving() {
    let store = FlakyStore::new();
    let mut session = App::new(&store).open();

    let error = session.toggle_slot(51).expect_err("out of range");
    assert!(matches!(
        error.downcast_ref::<MutationError>(),
        Some(MutationError::InvalidSlot { slot: 51, .. })
    ));
    assert!(store.writes().is_empty());
}

#[test]
fn failed_write_keeps_the_in_memory_change() {
    let store = FlakyStore::new();
    let mut session = App::new(&store).open();
    store.fail_writes(true);

    let applied = session.toggle_slot(4).expect("toggle still applies");
    assert!(matches!(
        applied.save_warning,
        Some(PersistenceError::Write(_))
    ));
    assert!(session.state().selected_slots().contains(&4));
    assert_eq!(applied.ratios.remaining_bags, 49);

    store.fail_writes(false);
    let applied = session.toggle_slot(5).expect("toggle");
    assert!(applied.save_warning.is_none());

    let reopened = App::new(&store).open();
    assert_eq!(reopened.state().sold_count(), 2);
}

#[test]
fn corrupt_record_falls_back_to_defaults_with_notice() {
    let store = MemoryStore::new();
    seed_state(&store, r#"{"bagCount":"fifty"}"#);

    let session = App::new(&store).open();
    assert_eq!(session.snapshot(), BagState::default());
    assert!(matches!(
        session.startup_notice(),
        Some(PersistenceError::Corrupt { .. })
    ));
}

#[test]
fn queue_and_preferences_persist() {
    let store = MemoryStore::new();
    let app = App::new(&store);
    let mut session = app.open();

    session.change_queue(QueueAdjustment::Reserve);
    session.change_queue(QueueAdjustment::Reserve);
    let applied = session.change_queue(QueueAdjustment::Release);
    assert_eq!(applied.value, 1);
    assert_eq!(applied.ratios.remaining_bags, 49);

    let applied = session.change_preferences(PreferenceChange {
        font_size_level: Some(1),
        shimmer_level: Some(2),
        ..PreferenceChange::default()
    });
    assert_eq!(applied.value.font_size_level, 3);

    let reopened = app.open();
    assert_eq!(reopened.state().queue_count(), 1);
    assert_eq!(reopened.state().preferences().shimmer_level, 2);
}

#[test]
fn odds_use_the_current_grid() {
    let store = MemoryStore::new();
    seed_state(
        &store,
        r#"{"bagCount":13,"chaseCount":4,"selectedNumbers":[1,2,3],"chaseNumbers":[3],"remainingChases":3}"#,
    );
    let session = App::new(&store).open();

    let row = session.odds(ProbabilityQuery::new(3, 0));
    assert_eq!(row.label, "29.17");

    let canonical = session.canonical_odds();
    assert_eq!(canonical.len(), 5);
    assert_eq!(canonical[1].label, "29.17");
    assert_eq!(session.odds(ProbabilityQuery::new(11, 0)).label, "0.00");
}

#[test]
fn flash_follows_the_latest_toggle() {
    let store = MemoryStore::new();
    let mut session = App::new(&store).open();

    session.toggle_slot(3).expect("first");
    session.toggle_slot(8).expect("second");
    assert_eq!(session.active_flash(), Some(8));
}

mod reopen {
    use bagtrack_app::App;
    use bagtrack_core::mutator::QueueAdjustment;
    use bagtrack_core::store::MemoryStore;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn reopened_session_matches_the_last_accepted_state(
            slots in prop::collection::vec(1u32..=60, 0..40),
            reserve in 0u32..5,
            chase_delta in -8i32..=8,
        ) {
            let store = MemoryStore::new();
            let app = App::new(&store);
            let mut session = app.open();

            for _ in 0..reserve {
                session.change_queue(QueueAdjustment::Reserve);
            }
            for slot in slots {
                let _ = session.toggle_slot(slot);
            }
            let _ = session.change_chase_count(chase_delta);

            let mut expected = session.snapshot();
            expected.clear_flash();
            prop_assert_eq!(app.open().snapshot(), expected);
        }
    }
}
