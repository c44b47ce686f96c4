//! Deck and card management.
//!
//! Keeps `decks.card_count` in step with card inserts and deletes; the
//! count is never recomputed from the cards table.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{self, CardFilter};
use crate::domain::{Card, Deck, NewCard};
use crate::error::{ServiceError, ServiceResult};

fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!("{} must not be blank", field)));
    }
    Ok(())
}

fn find_deck(conn: &Connection, owner_id: &str, deck_id: i64) -> ServiceResult<Deck> {
    db::get_deck(conn, deck_id, owner_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Deck {} not found", deck_id)))
}

pub fn create_deck(
    conn: &Connection,
    owner_id: &str,
    name: &str,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> ServiceResult<Deck> {
    require_text("name", name)?;

    let mut deck = Deck {
        id: 0,
        owner_id: owner_id.to_string(),
        name: name.trim().to_string(),
        description: description.unwrap_or_default().to_string(),
        card_count: 0,
        created_at: now,
        updated_at: now,
    };
    deck.id = db::insert_deck(conn, &deck)?;
    tracing::info!("Created deck {} for {}", deck.id, owner_id);
    Ok(deck)
}

pub fn list_decks(conn: &Connection, owner_id: &str) -> ServiceResult<Vec<Deck>> {
    Ok(db::list_decks(conn, owner_id)?)
}

pub fn get_deck(conn: &Connection, owner_id: &str, deck_id: i64) -> ServiceResult<Deck> {
    find_deck(conn, owner_id, deck_id)
}

/// Delete a deck together with its cards and their review history.
pub fn delete_deck(conn: &mut Connection, owner_id: &str, deck_id: i64) -> ServiceResult<()> {
    let tx = conn.transaction()?;
    find_deck(&tx, owner_id, deck_id)?;

    let cards = db::delete_deck_cards(&tx, deck_id, owner_id)?;
    db::delete_deck(&tx, deck_id, owner_id)?;
    tx.commit()?;

    tracing::info!("Deleted deck {} with {} cards", deck_id, cards);
    Ok(())
}

/// Bulk-create fresh cards in a deck: level 0, no reviews, due now.
pub fn add_cards(
    conn: &mut Connection,
    owner_id: &str,
    deck_id: i64,
    new_cards: Vec<NewCard>,
    now: DateTime<Utc>,
) -> ServiceResult<Vec<Card>> {
    if new_cards.is_empty() {
        return Err(ServiceError::InvalidArgument("No cards to add".to_string()));
    }
    for card in &new_cards {
        require_text("front", &card.front)?;
        require_text("back", &card.back)?;
    }
    find_deck(conn, owner_id, deck_id)?;

    let mut cards: Vec<Card> = new_cards
        .into_iter()
        .map(|c| Card::new(owner_id.to_string(), deck_id, c.front, c.back, c.material_id, now))
        .collect();

    let ids = db::insert_cards(conn, deck_id, owner_id, &cards, now)?;
    for (card, id) in cards.iter_mut().zip(ids) {
        card.id = id;
    }

    tracing::debug!("Added {} cards to deck {}", cards.len(), deck_id);
    Ok(cards)
}

pub fn list_cards(conn: &Connection, owner_id: &str, deck_id: i64) -> ServiceResult<Vec<Card>> {
    find_deck(conn, owner_id, deck_id)?;
    Ok(db::find_cards(conn, &CardFilter::owned_by(owner_id).in_deck(deck_id))?)
}

/// Change a card's text. Scheduling state is kept.
pub fn update_card_text(
    conn: &Connection,
    owner_id: &str,
    card_id: i64,
    front: &str,
    back: &str,
    now: DateTime<Utc>,
) -> ServiceResult<Card> {
    require_text("front", front)?;
    require_text("back", back)?;

    if !db::update_card_text(conn, card_id, owner_id, front, back, now)? {
        return Err(ServiceError::NotFound(format!("Card {} not found", card_id)));
    }
    db::get_card(conn, card_id, owner_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Card {} not found", card_id)))
}

/// Delete the listed cards of a deck. Ids outside the deck are ignored;
/// deleting nothing at all is NotFound.
pub fn delete_cards(
    conn: &mut Connection,
    owner_id: &str,
    deck_id: i64,
    card_ids: &[i64],
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    if card_ids.is_empty() {
        return Err(ServiceError::InvalidArgument("No card ids given".to_string()));
    }

    let tx = conn.transaction()?;
    find_deck(&tx, owner_id, deck_id)?;

    let deleted = db::delete_cards(&tx, deck_id, owner_id, card_ids)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!(
            "None of the cards are in deck {}",
            deck_id
        )));
    }
    db::adjust_card_count(&tx, deck_id, owner_id, -(deleted as i64), now)?;
    tx.commit()?;

    tracing::debug!("Deleted {} cards from deck {}", deleted, deck_id);
    Ok(deleted)
}

/// Delete one card with its review history and shrink its deck's count.
pub fn delete_card(
    conn: &mut Connection,
    owner_id: &str,
    card_id: i64,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let tx = conn.transaction()?;
    let card = db::get_card(&tx, card_id, owner_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Card {} not found", card_id)))?;

    db::delete_cards(&tx, card.deck_id, owner_id, &[card_id])?;
    db::adjust_card_count(&tx, card.deck_id, owner_id, -1, now)?;
    tx.commit()?;

    tracing::debug!("Deleted card {} from deck {}", card_id, card.deck_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn new_card(front: &str, back: &str) -> NewCard {
        NewCard {
            front: front.to_string(),
            back: back.to_string(),
            material_id: None,
        }
    }

    #[test]
    fn test_create_deck_requires_name() {
        let env = TestEnv::new().unwrap();
        let result = create_deck(&env.conn, "alice", "   ", None, now());
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

        let deck = create_deck(&env.conn, "alice", " Verbs ", Some("irregular"), now()).unwrap();
        assert_eq!(deck.name, "Verbs");
        assert_eq!(deck.description, "irregular");
        assert_eq!(deck.card_count, 0);
        assert_eq!(get_deck(&env.conn, "alice", deck.id).unwrap(), deck);
    }

    #[test]
    fn test_get_deck_of_another_user() {
        let env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "Mine", None, now()).unwrap();
        assert!(matches!(get_deck(&env.conn, "bob", deck.id), Err(ServiceError::NotFound(_))));
        assert!(list_decks(&env.conn, "bob").unwrap().is_empty());
    }

    #[test]
    fn test_add_cards_creates_fresh_cards() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();

        let cards = add_cards(
            &mut env.conn,
            "alice",
            deck.id,
            vec![new_card("one", "1"), new_card("two", "2")],
            now(),
        )
        .unwrap();
        assert_eq!(cards.len(), 2);
        for card in &cards {
            assert!(card.id > 0);
            assert_eq!(card.level, 0);
            assert_eq!(card.review_count, 0);
            assert_eq!(card.next_review, Some(now()));
        }

        assert_eq!(list_cards(&env.conn, "alice", deck.id).unwrap(), cards);
        assert_eq!(get_deck(&env.conn, "alice", deck.id).unwrap().card_count, 2);
    }

    #[test]
    fn test_add_cards_rejects_blank_text_atomically() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();

        let result = add_cards(
            &mut env.conn,
            "alice",
            deck.id,
            vec![new_card("ok", "fine"), new_card("", "missing front")],
            now(),
        );
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        assert!(list_cards(&env.conn, "alice", deck.id).unwrap().is_empty());

        let empty = add_cards(&mut env.conn, "alice", deck.id, Vec::new(), now());
        assert!(matches!(empty, Err(ServiceError::InvalidArgument(_))));

        let foreign = add_cards(&mut env.conn, "bob", deck.id, vec![new_card("q", "a")], now());
        assert!(matches!(foreign, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_update_card_text_keeps_schedule() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();
        let card = add_cards(&mut env.conn, "alice", deck.id, vec![new_card("q", "a")], now())
            .unwrap()
            .remove(0);

        let later = now() + Duration::hours(1);
        let updated = update_card_text(&env.conn, "alice", card.id, "q2", "a2", later).unwrap();
        assert_eq!(updated.front, "q2");
        assert_eq!(updated.back, "a2");
        assert_eq!(updated.next_review, card.next_review);
        assert_eq!(updated.updated_at, later);

        let blank = update_card_text(&env.conn, "alice", card.id, "q3", " ", later);
        assert!(matches!(blank, Err(ServiceError::InvalidArgument(_))));
        let foreign = update_card_text(&env.conn, "bob", card.id, "x", "y", later);
        assert!(matches!(foreign, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_delete_cards_maintains_count() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();
        let cards = add_cards(
            &mut env.conn,
            "alice",
            deck.id,
            vec![new_card("a", "1"), new_card("b", "2"), new_card("c", "3")],
            now(),
        )
        .unwrap();

        let deleted = delete_cards(&mut env.conn, "alice", deck.id, &[cards[0].id, 9999], now()).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(get_deck(&env.conn, "alice", deck.id).unwrap().card_count, 2);

        let none = delete_cards(&mut env.conn, "alice", deck.id, &[cards[0].id], now());
        assert!(matches!(none, Err(ServiceError::NotFound(_))));
        let empty = delete_cards(&mut env.conn, "alice", deck.id, &[], now());
        assert!(matches!(empty, Err(ServiceError::InvalidArgument(_))));
        assert_eq!(get_deck(&env.conn, "alice", deck.id).unwrap().card_count, 2);
    }

    #[test]
    fn test_delete_single_card() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();
        let cards = add_cards(
            &mut env.conn,
            "alice",
            deck.id,
            vec![new_card("a", "1"), new_card("b", "2")],
            now(),
        )
        .unwrap();
        crate::services::review::submit_review(&mut env.conn, "alice", cards[0].id, false, None, now())
            .unwrap();

        let foreign = delete_card(&mut env.conn, "bob", cards[0].id, now());
        assert!(matches!(foreign, Err(ServiceError::NotFound(_))));

        let later = now() + Duration::minutes(5);
        delete_card(&mut env.conn, "alice", cards[0].id, later).unwrap();
        let deck = get_deck(&env.conn, "alice", deck.id).unwrap();
        assert_eq!(deck.card_count, 1);
        assert_eq!(deck.updated_at, later);
        assert!(db::get_review_logs(&env.conn, cards[0].id, "alice").unwrap().is_empty());
        assert_eq!(list_cards(&env.conn, "alice", deck.id).unwrap(), vec![cards[1].clone()]);

        let again = delete_card(&mut env.conn, "alice", cards[0].id, later);
        assert!(matches!(again, Err(ServiceError::NotFound(_))));
        assert_eq!(get_deck(&env.conn, "alice", deck.id).unwrap().card_count, 1);
    }

    #[test]
    fn test_delete_deck_removes_cards_and_logs() {
        let mut env = TestEnv::new().unwrap();
        let deck = create_deck(&env.conn, "alice", "d", None, now()).unwrap();
        let card = add_cards(&mut env.conn, "alice", deck.id, vec![new_card("q", "a")], now())
            .unwrap()
            .remove(0);
        crate::services::review::submit_review(&mut env.conn, "alice", card.id, true, None, now())
            .unwrap();

        assert!(matches!(
            delete_deck(&mut env.conn, "bob", deck.id),
            Err(ServiceError::NotFound(_))
        ));
        delete_deck(&mut env.conn, "alice", deck.id).unwrap();

        assert!(matches!(get_deck(&env.conn, "alice", deck.id), Err(ServiceError::NotFound(_))));
        assert!(db::get_card(&env.conn, card.id, "alice").unwrap().is_none());
        assert!(db::get_review_logs(&env.conn, card.id, "alice").unwrap().is_empty());
    }
}
