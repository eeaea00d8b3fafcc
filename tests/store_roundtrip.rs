use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use questbox::catalog::{parse_generated_task, Catalog};
use questbox::clock::{parse_day, FixedClock};
use questbox::config::Config;
use questbox::policy::process_task_completion;
use questbox::profile::Profile;
use questbox::quests::available_quests;
use questbox::shop::purchase_reward;
use questbox::store::{FileStore, KeyValueStore, ProgressStore, CATALOG_KEY, PROGRESS_KEY};
use questbox::timer::start_timer;

fn day(s: &str) -> NaiveDate {
    parse_day(s).unwrap()
}

fn profiles() -> Vec<Profile> {
    vec![
        Profile { id: "ana".into(), name: "Ana".into(), pin: "1234".into() },
        Profile { id: "ben".into(), name: "Ben".into(), pin: "4321".into() },
    ]
}

#[test]
fn progress_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let config = Config::bundled().unwrap();
    let clock = FixedClock::on_day(day("2024-05-10"));

    let mut store = ProgressStore::new(FileStore::new(dir.path()));
    let mut all = store.load(&profiles());
    let bed = config.tasks.iter().find(|t| t.id == "make_bed").unwrap();
    let next = process_task_completion(bed, &all["ana"], &config.xp_policy, &config.tasks, &clock);
    all.insert("ana".into(), next);
    store.save(&all).unwrap();
    assert!(dir.path().join(format!("{PROGRESS_KEY}.json")).exists());

    let reopened = ProgressStore::new(FileStore::new(dir.path()));
    let loaded = reopened.load(&profiles());
    assert_eq!(loaded, all);
    assert_eq!(loaded["ana"].xp, bed.xp);
    let today = available_quests(&config.tasks, &loaded["ana"], day("2024-05-10"));
    assert!(today.iter().all(|t| t.id != "make_bed"));
}

#[test]
fn legacy_timer_blob_is_migrated_and_stable() {
    let dir = TempDir::new().unwrap();
    let legacy = r#"{
        "ana": {
            "xp": 40, "streak": 1, "lastCompletionDate": "2024-05-09",
            "dailyCompletions": {"2024-05-09": ["make_bed"]},
            "purchasedRewards": {},
            "activeTimers": {"homework": "2024-05-10T16:00:00Z"}
        }
    }"#;
    let mut backend = FileStore::new(dir.path());
    backend.set(PROGRESS_KEY, legacy).unwrap();

    let mut store = ProgressStore::new(backend);
    let all = store.load(&profiles());
    let timer = all["ana"].active_timers["homework"];
    assert_eq!(timer.elapsed_before_pause, 0);
    assert!(!timer.is_paused());
    assert!(all["ana"].completion_history.is_empty());
    assert_eq!(all["ana"].streak_savers, 0);

    store.save(&all).unwrap();
    let first = store.backend().get(PROGRESS_KEY).unwrap().unwrap();
    let again = store.load(&profiles());
    store.save(&again).unwrap();
    let second = store.backend().get(PROGRESS_KEY).unwrap().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("elapsedBeforePause"));
}

#[test]
fn late_timed_quest_and_purchase_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = Config::bundled().unwrap();
    let start = FixedClock::on_day(day("2024-05-10"));
    let homework = config.tasks.iter().find(|t| t.id == "homework").unwrap();
    let mut store = ProgressStore::new(FileStore::new(dir.path()));
    let mut all = store.load(&profiles());

    let running = start_timer(homework, &all["ben"], start.now).unwrap();
    all.insert("ben".into(), running);
    store.save(&all).unwrap();

    let all_later = store.load(&profiles());
    let late = start.advanced(Duration::minutes(46));
    let done = process_task_completion(homework, &all_later["ben"], &config.xp_policy, &config.tasks, &late);
    assert_eq!(done.xp, 25);
    assert!(done.active_timers.is_empty());

    let sticker = config.rewards.iter().find(|r| r.id == "sticker").unwrap();
    let bought = purchase_reward(sticker, &done, day("2024-05-10")).unwrap();
    assert_eq!(bought.xp, 5);
    let mut all = all_later;
    all.insert("ben".into(), bought);
    store.save(&all).unwrap();
    let reloaded = store.load(&profiles());
    assert_eq!(reloaded["ben"].purchases_of("sticker"), &[day("2024-05-10")]);
}

#[test]
fn catalog_overlay_persists_next_to_progress() {
    let dir = TempDir::new().unwrap();
    let config = Config::bundled().unwrap();
    let mut backend = FileStore::new(dir.path());

    let mut catalog = Catalog::load(&backend, config.tasks.clone(), config.rewards.clone());
    let generated = parse_generated_task(
        r#"{"name": "Sock Safari", "description": "Pair every lost sock.",
            "xp": 500, "repeatable": "weekly", "difficulty": "medium"}"#,
    )
    .unwrap();
    let id = catalog.add_task(generated);
    catalog.save_overlay(&mut backend).unwrap();
    assert!(dir.path().join(format!("{CATALOG_KEY}.json")).exists());

    let reloaded = Catalog::load(&backend, config.tasks.clone(), config.rewards.clone());
    assert_eq!(reloaded.tasks.len(), config.tasks.len() + 1);
    assert_eq!(reloaded.tasks[0].id, id);
    assert_eq!(reloaded.tasks[0].xp, 100);
    assert!(reloaded.resolve_task("sock safari").is_ok());
}

#[test]
fn backup_copies_stored_progress() {
    let dir = TempDir::new().unwrap();
    let mut store = ProgressStore::new(FileStore::new(dir.path()));
    let all = store.load(&profiles());
    store.save(&all).unwrap();

    let backup = store.backend().backup(PROGRESS_KEY).unwrap();
    assert!(backup.starts_with(dir.path().join("backup")));
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        store.backend().get(PROGRESS_KEY).unwrap().unwrap()
    );
    assert!(store.backend().backup(CATALOG_KEY).is_err());
}
