use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use transfer_odds::fetch::{extract_last_table, extract_links, has_marker};
use transfer_odds::links::LinkSelector;
use transfer_odds::table::normalize;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|a| (a - expected).abs() < 1e-12)
}

#[test]
fn listing_fixture_yields_market_links() {
    let raw = read_fixture("player_specials.html");
    let links = extract_links(&raw, "https://www.oddschecker.com").expect("fixture should parse");
    assert_eq!(links.len(), 8);

    let selected = LinkSelector::default().select(&links).expect("markets present");
    let players: Vec<String> = selected.iter().map(|l| l.player_name()).collect();
    assert_eq!(
        players,
        vec!["Harry Kane", "Declan Rice", "Missing Page", "Jack Grealish"]
    );
    assert!(selected.iter().all(|l| l.url().starts_with("https://www.oddschecker.com/football/")));
}

#[test]
fn market_fixture_reduces_to_best_probabilities() {
    let raw = read_fixture("harry_kane.html");
    assert!(has_marker(&raw, "#t1").expect("selector"));

    let table = extract_last_table(&raw)
        .expect("fixture should parse")
        .expect("odds table present");
    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let rows = normalize(&table, "Harry Kane", date);

    let destinations: Vec<&str> = rows.iter().map(|r| r.destination.as_str()).collect();
    assert_eq!(
        destinations,
        vec!["Bayern Munich", "Manchester United", "To Stay at Tottenham", "Real Madrid"]
    );
    // 1/5 is the shortest Bayern price, 9/2 beats 5/1, SUSP is ignored.
    assert!(approx(rows[0].probability, 5.0 / 6.0));
    assert!(approx(rows[1].probability, 2.0 / 11.0));
    assert!(approx(rows[2].probability, 4.0 / 15.0));
    assert_eq!(rows[3].probability, None);
}

#[test]
fn evens_quote_wins_when_shortest() {
    let raw = read_fixture("declan_rice.html");
    let table = extract_last_table(&raw).expect("parse").expect("table");
    let rows = normalize(&table, "Declan Rice", NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
    assert_eq!(rows.len(), 3);
    assert!(approx(rows[0].probability, 12.0 / 13.0));
    assert!(approx(rows[1].probability, 0.125));
    assert_eq!(rows[2].probability, Some(0.5));
}
