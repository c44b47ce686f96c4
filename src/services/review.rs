//! Review submission and session queues.
//!
//! Ties the pure scheduling rules in [`crate::srs`] to the store. Every
//! function takes the current instant from its caller.

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{self, CardFilter};
use crate::domain::{Card, CardSummary, ReviewLog, ReviewMode};
use crate::error::{ServiceError, ServiceResult};
use crate::srs::{self, DayWindow, ReviewCard, SessionProgress, Shuffler};

/// Cards for one review pass plus today's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueQueue {
    pub cards: Vec<ReviewCard>,
    pub progress: SessionProgress,
}

/// Parse a `mode` query value. Absent means [`ReviewMode::All`].
pub fn parse_mode(raw: Option<&str>) -> ServiceResult<ReviewMode> {
    match raw {
        None => Ok(ReviewMode::default()),
        Some(s) => ReviewMode::from_str(s)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("Unknown review mode '{}'", s))),
    }
}

/// Apply one answer to a card and persist it with its log entry.
///
/// The write is a compare-and-swap on `review_count`: against
/// `expected_review_count` when the client sent one, otherwise against the
/// count just read. Losing the swap leaves nothing written.
pub fn submit_review(
    conn: &mut Connection,
    owner_id: &str,
    card_id: i64,
    is_correct: bool,
    expected_review_count: Option<i64>,
    now: DateTime<Utc>,
) -> ServiceResult<CardSummary> {
    let tx = conn.transaction()?;

    let card = db::get_card(&tx, card_id, owner_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Card {} not found", card_id)))?;

    let expected = expected_review_count.unwrap_or(card.review_count);
    if expected != card.review_count {
        tracing::info!(
            "Stale review for card {}: expected count {}, found {}",
            card_id,
            expected,
            card.review_count
        );
        return Err(ServiceError::Conflict(format!(
            "Card {} was reviewed since count {}",
            card_id, expected
        )));
    }

    let updated = srs::apply_outcome(&card, is_correct, now)?;

    if !db::update_card_after_review(&tx, &updated, expected)? {
        return Err(ServiceError::Conflict(format!(
            "Card {} was updated concurrently",
            card_id
        )));
    }
    db::insert_review_log(
        &tx,
        &ReviewLog::new(card_id, owner_id.to_string(), is_correct, updated.level, now),
    )?;
    tx.commit()?;

    tracing::debug!(
        "Card {} reviewed ({}): level {} -> {}",
        card_id,
        if is_correct { "correct" } else { "incorrect" },
        card.level,
        updated.level
    );
    Ok(updated.summary())
}

/// Select, order and enrich the cards of a review session.
pub fn get_due_queue<S: Shuffler>(
    conn: &Connection,
    owner_id: &str,
    deck_id: i64,
    mode: ReviewMode,
    now: DateTime<Utc>,
    day_offset: FixedOffset,
    shuffler: &mut S,
) -> ServiceResult<DueQueue> {
    ensure_deck(conn, owner_id, deck_id)?;
    let today = DayWindow::containing(now, day_offset);

    let selected = db::find_cards(conn, &srs::selection_filter(owner_id, deck_id, mode, today))?;
    let ordered = srs::order_session(selected, mode, shuffler);

    let materials = db::find_materials_by_ids(conn, owner_id, &srs::queue::material_ids(&ordered))?;
    let cards = srs::attach_materials(ordered, &materials);

    let filters = srs::progress_filters(owner_id, deck_id, now, today);
    let due = db::count_cards(conn, &filters.due)?;
    let due_and_remembered = db::count_cards(conn, &filters.due_and_remembered)?;
    let remembered = db::count_cards(conn, &filters.remembered)?;
    let progress = SessionProgress::from_counts(due - due_and_remembered, remembered);

    tracing::debug!(
        "Deck {} queue ({}): {} cards, {}/{} remembered",
        deck_id,
        mode.as_str(),
        cards.len(),
        progress.remembered_today,
        progress.total_for_today
    );
    Ok(DueQueue { cards, progress })
}

/// Every due card the owner has, across decks, most overdue first.
/// Mastered cards are never due.
pub fn list_due_cards(conn: &Connection, owner_id: &str, now: DateTime<Utc>) -> ServiceResult<Vec<Card>> {
    let filter = CardFilter::owned_by(owner_id).due_by(now);
    Ok(db::find_cards_by_next_review(conn, &filter)?)
}

/// Send every card of a deck back to level 0, due now.
pub fn reset_deck_proficiency(
    conn: &Connection,
    owner_id: &str,
    deck_id: i64,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    ensure_deck(conn, owner_id, deck_id)?;
    let modified = db::reset_deck_levels(conn, deck_id, owner_id, now)?;
    tracing::info!("Reset {} cards in deck {}", modified, deck_id);
    Ok(modified)
}

fn ensure_deck(conn: &Connection, owner_id: &str, deck_id: i64) -> ServiceResult<()> {
    match db::get_deck(conn, deck_id, owner_id)? {
        Some(_) => Ok(()),
        None => Err(ServiceError::NotFound(format!("Deck {} not found", deck_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{utc, MAX_LEVEL};
    use crate::domain::Material;
    use crate::srs::{KeepOrder, RngShuffler};
    use crate::testing::TestEnv;
    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 15, 0, 0).unwrap()
    }

    fn queue(env: &TestEnv, deck_id: i64, mode: ReviewMode, at: DateTime<Utc>) -> DueQueue {
        get_due_queue(&env.conn, "alice", deck_id, mode, at, utc(), &mut KeepOrder).unwrap()
    }

    fn queue_ids(env: &TestEnv, deck_id: i64, mode: ReviewMode, at: DateTime<Utc>) -> Vec<i64> {
        queue(env, deck_id, mode, at).cards.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(None).unwrap(), ReviewMode::All);
        assert_eq!(parse_mode(Some("all")).unwrap(), ReviewMode::All);
        assert_eq!(parse_mode(Some("mistakes")).unwrap(), ReviewMode::Mistakes);
        assert!(matches!(parse_mode(Some("soon")), Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_correct_review_at_level_two() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 2, Some(now()), now());

        let summary = submit_review(&mut env.conn, "alice", card.id, true, None, now()).unwrap();
        assert_eq!(summary.level, 3);
        assert_eq!(summary.review_count, 1);
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.next_review, Some(now() + Duration::days(7)));

        let logs = db::get_review_logs(&env.conn, card.id, "alice").unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_correct);
        assert_eq!(logs[0].level_after, 3);
        let stored = db::get_card(&env.conn, card.id, "alice").unwrap().unwrap();
        assert_eq!(stored.last_reviewed_at, Some(now()));
    }

    #[test]
    fn test_mastered_card_leaves_all_mode() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 4, Some(now()), now());
        assert_eq!(queue_ids(&env, deck.id, ReviewMode::All, now()), vec![card.id]);

        let summary = submit_review(&mut env.conn, "alice", card.id, true, None, now()).unwrap();
        assert_eq!(summary.level, MAX_LEVEL);
        assert!(summary.next_review.is_none());

        for days in [0, 1, 30, 3650] {
            let later = now() + Duration::days(days);
            assert!(queue_ids(&env, deck.id, ReviewMode::All, later).is_empty());
        }
    }

    #[test]
    fn test_wrong_answer_enters_both_pools() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 3, Some(now() + Duration::days(4)), now());
        assert!(queue_ids(&env, deck.id, ReviewMode::All, now()).is_empty());

        let summary = submit_review(&mut env.conn, "alice", card.id, false, None, now()).unwrap();
        assert_eq!(summary.level, 0);
        assert_eq!(summary.next_review, Some(now()));
        assert_eq!(summary.incorrect_count, 1);

        let later = now() + Duration::minutes(1);
        assert_eq!(queue_ids(&env, deck.id, ReviewMode::All, later), vec![card.id]);
        assert_eq!(queue_ids(&env, deck.id, ReviewMode::Mistakes, later), vec![card.id]);
    }

    #[test]
    fn test_mistakes_ordered_by_review_count() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let mut expected = Vec::new();
        for reviews in [1, 4, 0, 3, 2] {
            let mut card = Card::new("alice".into(), deck.id, "q".into(), "a".into(), None, now());
            card.review_count = reviews;
            card.incorrect_count = reviews;
            card.id = db::insert_card(&env.conn, &card).unwrap();
            expected.push((reviews, card.id));
        }
        expected.sort_by(|a, b| b.0.cmp(&a.0));
        let expected: Vec<i64> = expected.into_iter().map(|(_, id)| id).collect();

        assert_eq!(queue_ids(&env, deck.id, ReviewMode::Mistakes, now()), expected);
    }

    #[test]
    fn test_all_mode_is_today_only_and_weakest_first() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let later_today = now() + Duration::hours(3);
        let strong = env.seed_card("alice", deck.id, 3, Some(later_today), now());
        let weak = env.seed_card("alice", deck.id, 1, Some(now()), now());
        env.seed_card("alice", deck.id, 1, Some(now() + Duration::days(1)), now());
        env.seed_card("alice", deck.id, 1, Some(now() - Duration::days(1)), now());
        env.seed_card("bob", deck.id, 0, Some(now()), now());

        assert_eq!(queue_ids(&env, deck.id, ReviewMode::All, now()), vec![weak.id, strong.id]);
    }

    #[test]
    fn test_shuffle_keeps_the_selected_set() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let expected: HashSet<i64> = (0..8)
            .map(|i| env.seed_card("alice", deck.id, i % MAX_LEVEL, Some(now()), now()).id)
            .collect();

        let mut shuffler = RngShuffler(StdRng::seed_from_u64(7));
        for _ in 0..3 {
            let queue = get_due_queue(
                &env.conn,
                "alice",
                deck.id,
                ReviewMode::All,
                now(),
                utc(),
                &mut shuffler,
            )
            .unwrap();
            let ids: HashSet<i64> = queue.cards.iter().map(|c| c.id).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_queue_attaches_materials() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let material = Material {
            id: 0,
            owner_id: "alice".into(),
            content: "source text".into(),
            tag: None,
            created_at: now(),
        };
        let material_id = db::insert_material(&env.conn, &material).unwrap();

        let mut with_material =
            Card::new("alice".into(), deck.id, "q".into(), "a".into(), Some(material_id), now());
        with_material.id = db::insert_card(&env.conn, &with_material).unwrap();
        let mut dangling = Card::new("alice".into(), deck.id, "q".into(), "a".into(), Some(999), now());
        dangling.id = db::insert_card(&env.conn, &dangling).unwrap();

        let cards = queue(&env, deck.id, ReviewMode::All, now()).cards;
        let content = |id: i64| cards.iter().find(|c| c.id == id).unwrap().material_content.clone();
        assert_eq!(content(with_material.id).as_deref(), Some("source text"));
        assert_eq!(content(dangling.id), None);

        crate::services::materials::delete_material(&env.conn, "alice", material_id).unwrap();
        let cards = queue(&env, deck.id, ReviewMode::All, now()).cards;
        assert!(cards.iter().all(|c| c.material_content.is_none()));
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn test_list_due_cards_across_decks() {
        let env = TestEnv::new().unwrap();
        let verbs = env.seed_deck("alice", "verbs", now());
        let nouns = env.seed_deck("alice", "nouns", now());
        let late = env.seed_card("alice", verbs.id, 1, Some(now() - Duration::hours(1)), now());
        let later = env.seed_card("alice", nouns.id, 2, Some(now() - Duration::days(3)), now());
        let exact = env.seed_card("alice", nouns.id, 0, Some(now()), now());
        env.seed_card("alice", verbs.id, 3, Some(now() + Duration::minutes(1)), now());
        env.seed_card("alice", verbs.id, MAX_LEVEL, None, now());
        env.seed_card("bob", verbs.id, 0, Some(now() - Duration::days(1)), now());

        let due: Vec<i64> = list_due_cards(&env.conn, "alice", now())
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(due, vec![later.id, late.id, exact.id]);
        assert!(list_due_cards(&env.conn, "carol", now()).unwrap().is_empty());
    }

    #[test]
    fn test_progress_total_is_stable_through_answers() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let overdue = now() - Duration::hours(2);
        let cards: Vec<Card> = (0..3)
            .map(|_| env.seed_card("alice", deck.id, 0, Some(overdue), overdue))
            .collect();

        let start = queue(&env, deck.id, ReviewMode::All, now()).progress;
        assert_eq!(start, SessionProgress { remembered_today: 0, total_for_today: 3 });

        let mut at = now();
        let mut last_total = start.total_for_today;
        for (card, correct) in cards.iter().zip([true, false, true]) {
            at += Duration::minutes(1);
            submit_review(&mut env.conn, "alice", card.id, correct, None, at).unwrap();
            let progress = queue(&env, deck.id, ReviewMode::All, at + Duration::seconds(1)).progress;
            assert!(progress.total_for_today >= last_total);
            last_total = progress.total_for_today;
        }

        let end = queue(&env, deck.id, ReviewMode::All, at + Duration::seconds(1)).progress;
        assert_eq!(end, SessionProgress { remembered_today: 2, total_for_today: 3 });
        assert!(!end.is_complete());
    }

    #[test]
    fn test_empty_deck_is_complete() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let queue = queue(&env, deck.id, ReviewMode::Mistakes, now());
        assert!(queue.cards.is_empty());
        assert_eq!(queue.progress.total_for_today, queue.progress.remembered_today);
    }

    #[test]
    fn test_queue_for_foreign_or_missing_deck() {
        let env = TestEnv::new().unwrap();
        let deck = env.seed_deck("bob", "theirs", now());
        for deck_id in [deck.id, deck.id + 50] {
            let result =
                get_due_queue(&env.conn, "alice", deck_id, ReviewMode::All, now(), utc(), &mut KeepOrder);
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
    }

    #[test]
    fn test_submit_review_scoped_to_owner() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 1, Some(now()), now());

        let result = submit_review(&mut env.conn, "bob", card.id, true, None, now());
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(db::get_card(&env.conn, card.id, "alice").unwrap().unwrap().review_count, 0);
    }

    #[test]
    fn test_replayed_submission_conflicts() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 1, Some(now()), now());

        submit_review(&mut env.conn, "alice", card.id, true, Some(0), now()).unwrap();
        let replay = submit_review(&mut env.conn, "alice", card.id, true, Some(0), now());
        assert!(matches!(replay, Err(ServiceError::Conflict(_))));

        let stored = db::get_card(&env.conn, card.id, "alice").unwrap().unwrap();
        assert_eq!(stored.level, 2);
        assert_eq!(stored.review_count, 1);
        assert_eq!(db::get_review_logs(&env.conn, card.id, "alice").unwrap().len(), 1);
    }

    #[test]
    fn test_counters_stay_consistent() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 0, Some(now()), now());

        let outcomes = [true, true, false, true, false, false, true];
        let mut summary = None;
        for (i, correct) in outcomes.iter().enumerate() {
            let at = now() + Duration::days(i as i64);
            summary = Some(submit_review(&mut env.conn, "alice", card.id, *correct, None, at).unwrap());
        }
        let summary = summary.unwrap();
        assert_eq!(summary.review_count, outcomes.len() as i64);
        assert_eq!(summary.correct_count + summary.incorrect_count, summary.review_count);
        assert_eq!(summary.level, 1);
    }

    #[test]
    fn test_corrupt_level_is_rejected_without_writing() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let card = env.seed_card("alice", deck.id, 9, Some(now()), now());

        let result = submit_review(&mut env.conn, "alice", card.id, true, None, now());
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        assert_eq!(db::get_card(&env.conn, card.id, "alice").unwrap().unwrap().review_count, 0);
        assert!(db::get_review_logs(&env.conn, card.id, "alice").unwrap().is_empty());
    }

    #[test]
    fn test_reset_deck_proficiency() {
        let mut env = TestEnv::new().unwrap();
        let deck = env.seed_deck("alice", "d", now());
        let mastered = env.seed_card("alice", deck.id, MAX_LEVEL, None, now());
        env.seed_card("alice", deck.id, 2, Some(now() + Duration::days(3)), now());

        let later = now() + Duration::hours(1);
        assert_eq!(reset_deck_proficiency(&env.conn, "alice", deck.id, later).unwrap(), 2);
        assert_eq!(queue_ids(&env, deck.id, ReviewMode::Mistakes, later).len(), 2);
        assert_eq!(queue_ids(&env, deck.id, ReviewMode::All, later).len(), 2);

        let summary = submit_review(&mut env.conn, "alice", mastered.id, true, None, later).unwrap();
        assert_eq!(summary.level, 1);

        let missing = reset_deck_proficiency(&env.conn, "bob", deck.id, later);
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}
