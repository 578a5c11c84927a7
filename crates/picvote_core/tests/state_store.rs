use picvote_core::model::seed::seed_candidates;
use picvote_core::repo::state_repo::{CANDIDATES_KEY, CURRENT_USER_KEY, VOTE_STATE_KEY};
use picvote_core::{MockIdentityProvider, RepoError, SqliteStateStore, StateStore, VoteLedger};
use rusqlite::Connection;
use serde_json::{json, Value};

#[test]
fn missing_records_load_as_none() {
    let store = SqliteStateStore::open_in_memory().unwrap();

    assert!(store.load_candidates().unwrap().is_none());
    assert!(store.load_vote_ledger().unwrap().is_none());
    assert!(store.load_current_user().unwrap().is_none());
}

#[test]
fn saved_records_load_back() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    let candidates = seed_candidates(9_000_000);
    let ledger = VoteLedger::from_ids(["3".to_string(), "1".to_string()]);
    let user = MockIdentityProvider::fixed_user();

    store.save_candidates(&candidates).unwrap();
    store.save_vote_ledger(&ledger).unwrap();
    store.save_current_user(Some(&user)).unwrap();

    assert_eq!(store.load_candidates().unwrap(), Some(candidates));
    assert_eq!(store.load_vote_ledger().unwrap(), Some(ledger));
    assert_eq!(store.load_current_user().unwrap(), Some(user));
}

#[test]
fn records_use_camel_case_json_shapes() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    store.save_candidates(&seed_candidates(9_000_000)).unwrap();
    store
        .save_vote_ledger(&VoteLedger::from_ids(["2".to_string()]))
        .unwrap();
    store.save_current_user(None).unwrap();

    let candidates = store.get_raw(CANDIDATES_KEY).unwrap().unwrap();
    assert!(candidates.contains("\"imageUrl\""));
    assert!(candidates.contains("\"vibeScore\":92"));
    assert!(candidates.contains("\"aiCritique\""));
    assert_eq!(
        store.get_raw(VOTE_STATE_KEY).unwrap().as_deref(),
        Some(r#"{"hasVotedFor":["2"]}"#)
    );
    assert_eq!(
        store.get_raw(CURRENT_USER_KEY).unwrap().as_deref(),
        Some("null")
    );
    assert!(store.load_current_user().unwrap().is_none());
}

#[test]
fn save_overwrites_whole_record() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    store
        .save_vote_ledger(&VoteLedger::from_ids(["1".to_string()]))
        .unwrap();
    store
        .save_vote_ledger(&VoteLedger::from_ids(["2".to_string()]))
        .unwrap();

    let loaded = store.load_vote_ledger().unwrap().unwrap();
    assert_eq!(loaded.voted_ids(), ["2".to_string()]);
}

#[test]
fn undecodable_records_are_invalid_data() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    store.put_raw(CANDIDATES_KEY, "{not json").unwrap();
    store.put_raw(VOTE_STATE_KEY, r#"{"hasVotedFor":"1"}"#).unwrap();
    store.put_raw(CURRENT_USER_KEY, r#"{"id":7}"#).unwrap();

    assert!(matches!(
        store.load_candidates().unwrap_err(),
        RepoError::InvalidData { key: "candidates", .. }
    ));
    assert!(matches!(
        store.load_vote_ledger().unwrap_err(),
        RepoError::InvalidData { key: "voteState", .. }
    ));
    assert!(matches!(
        store.load_current_user().unwrap_err(),
        RepoError::InvalidData { key: "currentUser", .. }
    ));
}

#[test]
fn candidates_with_negative_votes_or_duplicate_ids_are_rejected() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    let negative = json!([stored_candidate("1", "a", -1, 1)]);
    store.put_raw(CANDIDATES_KEY, &negative.to_string()).unwrap();
    assert!(store.load_candidates().is_err());

    let duplicated = json!([
        stored_candidate("1", "a", 1, 1),
        stored_candidate("1", "b", 2, 2),
    ]);
    store.put_raw(CANDIDATES_KEY, &duplicated.to_string()).unwrap();
    let err = store.load_candidates().unwrap_err();
    assert!(err.to_string().contains("duplicate candidate id"));
}

fn stored_candidate(id: &str, name: &str, votes: i64, timestamp: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "imageUrl": "x",
        "votes": votes,
        "description": "",
        "tags": [],
        "timestamp": timestamp,
    })
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteStateStore::try_new(conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("kv_records")));
}
