use super::{RemoteApi, RemoteShow};
use chrono::NaiveDate;
use showcal_core::common::error::Result;
use showcal_core::export::{ExportedShow, MatchClass, ShowMatch};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Page size for the bulk listing used as the reconciliation snapshot.
const LISTING_PAGE_SIZE: u32 = 500;

/// Composite natural key for show matching. Unimported data has no
/// remote-assigned identifier, so `(title, event date)` is the best
/// available identity. It is a heuristic: two distinct real shows sharing
/// a title and date will collide, and the operator's confirmation step is
/// the safety net for that.
pub fn show_key(title: &str, day: NaiveDate) -> String {
    format!("{}|{}", title.trim().to_lowercase(), day)
}

/// Classify candidates against one target's existing inventory.
pub fn classify_shows(candidates: &[ExportedShow], existing: &[RemoteShow]) -> Vec<ShowMatch> {
    let by_key: HashMap<String, &RemoteShow> = existing
        .iter()
        .map(|show| (show_key(&show.title, show.event_day), show))
        .collect();

    candidates
        .iter()
        .map(|candidate| {
            match by_key.get(&show_key(&candidate.title, candidate.event_day)) {
                Some(remote) => ShowMatch {
                    candidate: candidate.clone(),
                    existing_id: Some(remote.id),
                    class: if candidate_adds_data(candidate, remote) {
                        MatchClass::ExistingUpdatable
                    } else {
                        MatchClass::ExistingUnchanged
                    },
                },
                None => ShowMatch {
                    candidate: candidate.clone(),
                    existing_id: None,
                    class: MatchClass::New,
                },
            }
        })
        .collect()
}

/// A matched candidate is worth updating only when it carries a field the
/// remote copy lacks.
fn candidate_adds_data(candidate: &ExportedShow, remote: &RemoteShow) -> bool {
    (candidate.price.is_some() && remote.price.is_none())
        || (candidate.age_requirement.is_some() && remote.age_requirement.is_none())
}

/// Fetch one target's inventory and classify the candidates against it.
#[instrument(skip(api, candidates))]
pub async fn reconcile_target(
    api: &dyn RemoteApi,
    candidates: &[ExportedShow],
) -> Result<Vec<ShowMatch>> {
    let existing = api.list_shows("all", LISTING_PAGE_SIZE).await?;
    let matches = classify_shows(candidates, &existing);
    let new = matches
        .iter()
        .filter(|m| m.class == MatchClass::New)
        .count();
    info!(
        candidates = candidates.len(),
        existing = existing.len(),
        new,
        "reconciliation complete"
    );
    Ok(matches)
}

/// Reconcile independently against several targets; one target's listing
/// failure becomes that target's error entry and never blocks the others.
/// A show may well be new on one target and existing on another.
pub async fn reconcile_targets(
    targets: &[&super::ImportTarget],
    candidates: &[ExportedShow],
) -> HashMap<String, Result<Vec<ShowMatch>>> {
    let calls = targets.iter().map(|target| async move {
        (
            target.name.clone(),
            reconcile_target(target.api.as_ref(), candidates).await,
        )
    });
    futures::future::join_all(calls).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use showcal_core::export::ExportedShow;
    use uuid::Uuid;

    fn candidate(title: &str, day: (i32, u32, u32)) -> ExportedShow {
        ExportedShow {
            title: title.to_string(),
            event_day: NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap(),
            city: "Seattle".to_string(),
            state: "WA".to_string(),
            price: None,
            age_requirement: None,
            status: "confirmed".to_string(),
            sold_out: false,
            cancelled: false,
            venues: vec![],
            artists: vec![],
        }
    }

    fn remote(title: &str, day: (i32, u32, u32)) -> RemoteShow {
        RemoteShow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            event_day: NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap(),
            price: None,
            age_requirement: None,
        }
    }

    #[test]
    fn identical_title_and_date_classifies_as_existing() {
        let existing = vec![remote("Band X", (2025, 6, 1))];
        let matches = classify_shows(&[candidate("Band X", (2025, 6, 1))], &existing);
        assert_eq!(matches[0].class, MatchClass::ExistingUnchanged);
        assert_eq!(matches[0].existing_id, Some(existing[0].id));
    }

    #[test]
    fn one_day_shift_classifies_as_new() {
        let existing = vec![remote("Band X", (2025, 6, 1))];
        let matches = classify_shows(&[candidate("Band X", (2025, 6, 2))], &existing);
        assert_eq!(matches[0].class, MatchClass::New);
        assert_eq!(matches[0].existing_id, None);
    }

    #[test]
    fn key_is_case_and_whitespace_insensitive() {
        let existing = vec![remote("band x", (2025, 6, 1))];
        let matches = classify_shows(&[candidate("  Band X ", (2025, 6, 1))], &existing);
        assert_eq!(matches[0].class, MatchClass::ExistingUnchanged);
    }

    #[test]
    fn extra_candidate_data_marks_match_updatable() {
        let existing = vec![remote("Band X", (2025, 6, 1))];
        let mut with_price = candidate("Band X", (2025, 6, 1));
        with_price.price = Some("$20".to_string());
        let matches = classify_shows(&[with_price], &existing);
        assert_eq!(matches[0].class, MatchClass::ExistingUpdatable);
    }
}
