use uuid::Uuid;

use provider_cell::models::Provider;
use provider_cell::services::resolver::{
    match_name, match_specialty, MATCH_CONFIDENCE_THRESHOLD,
};

fn provider(full_name: &str, specialty: &str) -> Provider {
    Provider {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        full_name: full_name.to_string(),
        specialty: specialty.to_string(),
        created_at: None,
    }
}

/// Roster sorted the way the service fetches it: (full_name, id).
fn roster() -> Vec<Provider> {
    vec![
        provider("Amara Okafor", "Dermatology"),
        provider("Maya Chen", "Cardiology"),
        provider("Samuel Ruiz", "Pediatrics"),
    ]
}

#[test]
fn specialty_matches_case_insensitively() {
    let roster = roster();
    let matched = match_specialty(&roster, "CARDIOLOGY").unwrap();
    assert_eq!(matched.full_name, "Maya Chen");
}

#[test]
fn specialty_substring_matches_both_ways() {
    let roster = roster();
    assert_eq!(match_specialty(&roster, "derm").unwrap().full_name, "Amara Okafor");
    assert_eq!(
        match_specialty(&roster, "pediatrics department").unwrap().full_name,
        "Samuel Ruiz"
    );
}

#[test]
fn short_specialty_label_only_matches_as_a_whole_word() {
    let roster = vec![provider("Noor Haddad", "ENT")];

    // "ent" is buried inside the word, not named by it.
    assert!(match_specialty(&roster, "appointment").is_none());
    assert!(match_specialty(&roster, "appointment tomorrow").is_none());

    assert_eq!(match_specialty(&roster, "ent").unwrap().full_name, "Noor Haddad");
    assert_eq!(match_specialty(&roster, "the ent clinic").unwrap().full_name, "Noor Haddad");
}

#[test]
fn multi_word_specialty_matches_as_a_phrase() {
    let roster = vec![provider("Iris Novak", "General Practice")];
    assert_eq!(
        match_specialty(&roster, "a general practice doctor").unwrap().full_name,
        "Iris Novak"
    );
}

#[test]
fn unknown_specialty_matches_nothing() {
    let roster = roster();
    assert!(match_specialty(&roster, "neurosurgery").is_none());
    assert!(match_specialty(&roster, "  ").is_none());
}

#[test]
fn honorifics_are_ignored() {
    let roster = roster();
    for query in ["Dr. Maya Chen", "Doctor Maya Chen", "maya chen"] {
        let resolved = match_name(&roster, query).unwrap();
        assert_eq!(resolved.provider.full_name, "Maya Chen");
        assert!(resolved.confidence >= MATCH_CONFIDENCE_THRESHOLD);
    }
}

#[test]
fn single_character_misspelling_still_resolves() {
    let roster = roster();
    let resolved = match_name(&roster, "Dr. Maya Chan").unwrap();
    assert_eq!(resolved.provider.full_name, "Maya Chen");
}

#[test]
fn partial_first_name_resolves() {
    let roster = roster();
    let resolved = match_name(&roster, "Sam Ruiz").unwrap();
    assert_eq!(resolved.provider.full_name, "Samuel Ruiz");
}

#[test]
fn last_name_alone_is_confident_enough() {
    let roster = roster();
    let resolved = match_name(&roster, "Okafor").unwrap();
    assert_eq!(resolved.provider.full_name, "Amara Okafor");
    assert_eq!(resolved.confidence, 1.0);
}

#[test]
fn unrelated_name_falls_below_the_threshold() {
    let roster = roster();
    assert!(match_name(&roster, "Gregory House").is_none());
    assert!(match_name(&roster, "").is_none());
    assert!(match_name(&roster, "Dr.").is_none());
}

#[test]
fn equal_scores_resolve_to_the_first_roster_entry() {
    let twins = vec![
        provider("Alex Chen", "Cardiology"),
        provider("Alex Cheng", "Dermatology"),
    ];

    // "Alex" hits both entries with the same score; roster order decides.
    let resolved = match_name(&twins, "Alex").unwrap();
    assert_eq!(resolved.provider.full_name, "Alex Chen");
}
