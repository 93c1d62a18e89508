use pursuit_game::{
    EpisodeOutcome, FileRecordStorage, MemoryRecordStorage, RecordStorage, RotationSettings,
    SceneProgressionStore, SceneRotationRecord, SharedProgression,
};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("pursuit-{tag}-{nanos}"))
}

#[test]
fn progressive_rotation_switches_every_200_episodes() {
    let shared = SharedProgression::open(MemoryRecordStorage::new(), RotationSettings::progressive(6))
        .unwrap();
    let mut switches = Vec::new();
    for _ in 0..1_200 {
        let advance = shared.record_episode_end(EpisodeOutcome::ChaserCaughtEvader);
        if advance.scene_changed {
            switches.push((advance.record.total_episodes, advance.new_scene_index));
        }
        assert!(advance.new_scene_index < 6);
    }
    assert_eq!(
        switches,
        [(200, 1), (400, 2), (600, 3), (800, 4), (1_000, 5)]
    );
    assert_eq!(shared.current_scene_index(), 5);
}

#[test]
fn eleven_scene_rotation_flips_on_episode_2000() {
    let shared =
        SharedProgression::open(MemoryRecordStorage::new(), RotationSettings::progressive(11))
            .unwrap();
    for _ in 0..1_998 {
        shared.record_episode_end(EpisodeOutcome::EvaderSurvivedTimeout);
    }
    let at_1999 = shared.record_episode_end(EpisodeOutcome::EvaderSurvivedTimeout);
    assert_eq!(at_1999.record.total_episodes, 1_999);
    assert_eq!(at_1999.new_scene_index, 9);
    assert!(!at_1999.scene_changed);

    let at_2000 = shared.record_episode_end(EpisodeOutcome::EvaderSurvivedTimeout);
    assert_eq!(at_2000.new_scene_index, 10);
    assert!(at_2000.scene_changed);
}

#[test]
fn counters_survive_restart_through_file() {
    let dir = temp_dir("restart");
    let storage = FileRecordStorage::in_dir(&dir);
    {
        let mut store =
            SceneProgressionStore::open(storage.clone(), RotationSettings::progressive(6)).unwrap();
        for i in 0..250 {
            let outcome = if i % 5 == 0 {
                EpisodeOutcome::EvaderSurvivedTimeout
            } else {
                EpisodeOutcome::ChaserCaughtEvader
            };
            store.record_episode_end(outcome);
        }
    }

    let reopened =
        SceneProgressionStore::open(storage.clone(), RotationSettings::progressive(6)).unwrap();
    let record = reopened.record();
    assert_eq!(record.total_episodes, 250);
    assert_eq!(record.chaser_wins, 200);
    assert_eq!(record.evader_wins, 50);
    assert_eq!(record.current_scene_index, 1);

    let text = std::fs::read_to_string(storage.path()).unwrap();
    assert!(text.contains("\"totalEpisodes\": 250"));
    assert!(text.contains("\"currentSceneIndex\": 1"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn corrupt_file_is_replaced_on_next_save() {
    let dir = temp_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let storage = FileRecordStorage::in_dir(&dir);
    std::fs::write(storage.path(), "{\"totalEpisodes\": \"many\"").unwrap();

    let mut store =
        SceneProgressionStore::open(storage.clone(), RotationSettings::progressive(6)).unwrap();
    assert_eq!(store.record(), SceneRotationRecord::default());
    store.record_episode_end(EpisodeOutcome::ChaserTimedOut);

    let reloaded = storage.load_record().unwrap().unwrap();
    assert_eq!(reloaded.total_episodes, 1);
    assert_eq!(reloaded.chaser_wins + reloaded.evader_wins, 0);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn out_of_range_index_on_disk_is_clamped() {
    let storage = MemoryRecordStorage::with_text(
        r#"{"totalEpisodes":10,"currentSceneIndex":42,"chaserWins":4,"evaderWins":6}"#,
    );
    let fixed = SceneProgressionStore::open(storage.clone(), RotationSettings::fixed(6, 3)).unwrap();
    assert_eq!(fixed.current_scene_index(), 3);
    let progressive =
        SceneProgressionStore::open(storage, RotationSettings::progressive(6)).unwrap();
    assert_eq!(progressive.current_scene_index(), 0);
}

#[test]
fn parallel_sessions_share_one_ordered_record() {
    let shared = SharedProgression::open(MemoryRecordStorage::new(), RotationSettings::progressive(6))
        .unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    shared.record_episode_end(EpisodeOutcome::ChaserCaughtEvader);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let record = shared.record();
    assert_eq!(record.total_episodes, 400);
    assert_eq!(record.chaser_wins, 400);
    assert_eq!(record.current_scene_index, 2);

    let saved = shared
        .with_store(|store| store.storage().load_record())
        .unwrap()
        .unwrap();
    assert_eq!(saved, record);
}
