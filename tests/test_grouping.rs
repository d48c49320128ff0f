//! Display grouping tests: section boundaries, labels, row packing, render errors.

mod common;

use eras_viewer::config::PLACEHOLDER_IMAGE_URL;
use eras_viewer::grouping::{card_code, group, render_card};
use eras_viewer::queries::CardQuery;
use eras_viewer::{
    CardFace, CardRecord, Deck, DeckId, FilterCriteria, GroupingOptions, RenderError, Section,
};

fn section_ids(section: &Section) -> Vec<i64> {
    section
        .entries()
        .map(|e| match e {
            Ok(card) => card.id,
            Err(err) => err.card_id(),
        })
        .collect()
}

fn labels(sections: &[Section]) -> Vec<String> {
    sections
        .iter()
        .map(|s| s.label.as_ref().map(ToString::to_string).unwrap_or_default())
        .collect()
}

fn numbered(id: i64, era: i64, subera: i64, class: &str, number: i64) -> CardRecord {
    let mut card = common::record(id, era, subera, class, None);
    card.number = Some(number);
    card
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[test]
fn sections_break_on_era_subera_and_first_class() {
    let (catalog, _fx) = common::setup_sample_catalog();
    let visible = CardQuery::new(&catalog).apply(&FilterCriteria::default(), &Deck::new());

    let sections = group(&visible, &Deck::new(), &GroupingOptions::default());
    let ids: Vec<Vec<i64>> = sections.iter().map(section_ids).collect();
    assert_eq!(ids, vec![vec![1, 2], vec![4], vec![5], vec![6, 7]]);
    assert_eq!(
        labels(&sections),
        vec![
            "Era 1 - Bosquemago",
            "Era 1 - Disrupción",
            "Era 1.1 - Pesadilla",
            "Era 2 - Guerrero",
        ]
    );
}

#[test]
fn class_suffix_only_when_class_changes() {
    let b1 = numbered(1, 1, 0, "B", 1);
    let b2 = numbered(2, 2, 0, "B", 1);
    let d2 = numbered(3, 2, 0, "D", 2);
    let b3 = numbered(4, 3, 0, "B", 1);
    let cards = vec![&b1, &b2, &d2, &b3];

    let sections = group(&cards, &Deck::new(), &GroupingOptions::default());
    assert_eq!(
        labels(&sections),
        vec!["Era 1 - Bosquemago", "Era 2", "Era 2 - Disrupción", "Era 3 - Bosquemago"]
    );
}

#[test]
fn unknown_class_labels_with_raw_token() {
    let x = numbered(1, 4, 2, "X", 1);
    let sections = group(&[&x], &Deck::new(), &GroupingOptions::default());
    assert_eq!(labels(&sections), vec!["Era 4.2 - X"]);
}

#[test]
fn titles_off_gives_one_unlabelled_section() {
    let (catalog, _fx) = common::setup_sample_catalog();
    let visible = CardQuery::new(&catalog).apply(&FilterCriteria::default(), &Deck::new());
    let options = GroupingOptions {
        section_titles: false,
        page_width: 1000,
        item_width: 250,
    };

    let sections = group(&visible, &Deck::new(), &options);
    assert_eq!(sections.len(), 1);
    assert!(sections[0].label.is_none());
    let sizes: Vec<usize> = sections[0].rows.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![4, 2]);
}

#[test]
fn empty_sequence_has_no_sections() {
    let sections = group(&[], &Deck::new(), &GroupingOptions::default());
    assert!(sections.is_empty());
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[test]
fn rows_pack_to_capacity_and_restart_per_section() {
    let records: Vec<CardRecord> = (1..=5)
        .map(|n| numbered(n, 1, 0, "B", n))
        .chain((6..=8).map(|n| numbered(n, 2, 0, "B", n)))
        .collect();
    let cards: Vec<&CardRecord> = records.iter().collect();
    let options = GroupingOptions {
        section_titles: true,
        page_width: 1000,
        item_width: 400,
    };
    assert_eq!(options.row_capacity(), 2);

    let sections = group(&cards, &Deck::new(), &options);
    let shape: Vec<Vec<usize>> = sections
        .iter()
        .map(|s| s.rows.iter().map(Vec::len).collect())
        .collect();
    assert_eq!(shape, vec![vec![2, 2, 1], vec![2, 1]]);
    assert_eq!(sections[0].len(), 5);
}

#[test]
fn row_capacity_is_at_least_one() {
    let wide = GroupingOptions {
        section_titles: true,
        page_width: 100,
        item_width: 550,
    };
    assert_eq!(wide.row_capacity(), 1);

    let zero = GroupingOptions {
        section_titles: true,
        page_width: 1000,
        item_width: 0,
    };
    assert_eq!(zero.row_capacity(), 1000);
    assert_eq!(GroupingOptions::default().row_capacity(), 6);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn card_codes_include_subera_when_set() {
    assert_eq!(card_code(&numbered(1, 1, 0, "B", 7)).unwrap(), "E1-B07");
    assert_eq!(card_code(&numbered(2, 2, 1, "B-D", 12)).unwrap(), "E2.1-B-D12");
}

#[test]
fn render_uses_image_placeholder_or_code() {
    let (catalog, _fx) = common::setup_sample_catalog();
    let deck = Deck::new();

    let with_image = render_card(catalog.by_id(1).unwrap(), &deck).unwrap();
    assert_eq!(
        with_image.face,
        CardFace::Image {
            url: "https://img.example/E1/B01.png".into()
        }
    );

    let slot = render_card(catalog.by_id(3).unwrap(), &deck).unwrap();
    assert_eq!(
        slot.face,
        CardFace::Image {
            url: PLACEHOLDER_IMAGE_URL.into()
        }
    );

    let missing = render_card(catalog.by_id(6).unwrap(), &deck).unwrap();
    assert_eq!(
        missing.face,
        CardFace::Missing {
            code: "E2-G01".into()
        }
    );
}

#[test]
fn render_reports_deck_copies() {
    let (catalog, _fx) = common::setup_sample_catalog();
    let deck = Deck::from_list(vec![DeckId::Card(1); 4]);

    let full = render_card(catalog.by_id(1).unwrap(), &deck).unwrap();
    assert_eq!(full.copies, 4);
    assert!(!full.can_add);

    let none = render_card(catalog.by_id(2).unwrap(), &deck).unwrap();
    assert_eq!(none.copies, 0);
    assert!(none.can_add);
}

#[test]
fn unrenderable_card_does_not_abort_grid() {
    let good = numbered(1, 1, 0, "B", 1);
    let no_number = common::record(2, 1, 0, "B", None);
    let also_good = numbered(3, 1, 0, "B", 3);
    let cards = vec![&good, &no_number, &also_good];

    let sections = group(&cards, &Deck::new(), &GroupingOptions::default());
    assert_eq!(sections.len(), 1);
    let entries: Vec<_> = sections[0].entries().collect();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].is_ok());
    assert_eq!(
        entries[1].as_ref().unwrap_err(),
        &RenderError::MissingNumber {
            id: 2,
            name: "Card 2".into()
        }
    );
    assert!(entries[2].is_ok());
}

#[test]
fn classless_card_falls_back_to_bare_code() {
    let mut card = common::record(5, 1, 0, "", None);
    card.number = Some(1);

    let rendered = render_card(&card, &Deck::new()).unwrap();
    assert_eq!(
        rendered.face,
        CardFace::Missing {
            code: "E1-01".into()
        }
    );

    // The number is still required
    card.number = None;
    let err = render_card(&card, &Deck::new()).unwrap_err();
    assert_eq!(err.card_id(), 5);
    assert_eq!(err.card_name(), "Card 5");
}
