//! Composite visitor query with a client-side fallback.

use visitdesk_core::result::AppResult;
use visitdesk_database::VisitorStore;
use visitdesk_entity::visitor::filter::sort_newest_first;
use visitdesk_entity::visitor::{Visitor, VisitorFilter};

use tracing::warn;

/// Run `filter` against the store, newest check-in first.
///
/// When the store cannot serve the combined query (no composite index),
/// fetch by the narrowest single field the store can answer, then filter,
/// and sort locally. Any other error is returned unchanged.
pub async fn query_with_fallback(
    store: &dyn VisitorStore,
    filter: &VisitorFilter,
) -> AppResult<Vec<Visitor>> {
    match store.query(filter).await {
        Ok(visitors) => Ok(visitors),
        Err(e) if e.is_query_unsupported() => {
            warn!(error = %e, "Composite visitor query unsupported; filtering client-side");
            let mut visitors = if let Some(range) = &filter.range {
                store.find_checked_in_between(range).await?
            } else if let Some(status) = filter.status {
                store.find_by_status(status).await?
            } else {
                store.find_all().await?
            };
            visitors.retain(|v| filter.matches(v));
            sort_newest_first(&mut visitors);
            Ok(visitors)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use visitdesk_core::types::DateRange;
    use visitdesk_database::memory::MemoryVisitorStore;
    use visitdesk_entity::visitor::{NewVisitor, VisitorStatus};

    async fn seed(store: &MemoryVisitorStore) -> Vec<Visitor> {
        let now = Utc::now();
        let mut out = Vec::new();
        for (i, (first, days_ago, checked_out)) in [
            ("Ann", 0, false),
            ("Ben", 0, true),
            ("Cat", 3, false),
            ("Dan", 10, false),
        ]
        .into_iter()
        .enumerate()
        {
            let at = now - Duration::days(days_ago) - Duration::minutes(i as i64);
            let mut v = Visitor::check_in(
                NewVisitor {
                    first_name: first.into(),
                    last_name: "Smith".into(),
                    purpose: "Visit".into(),
                    ..Default::default()
                },
                None,
                at,
            );
            v.id = format!("VIS-{i}");
            if checked_out {
                v.mark_checked_out(None, at + Duration::minutes(30)).unwrap();
            }
            store.insert(&v).await.unwrap();
            out.push(v);
        }
        out
    }

    #[tokio::test]
    async fn fallback_matches_indexed_results() {
        let indexed = MemoryVisitorStore::new();
        let bare = MemoryVisitorStore::without_composite_index();
        seed(&indexed).await;
        seed(&bare).await;

        let filter = VisitorFilter {
            status: Some(VisitorStatus::CheckedIn),
            range: Some(DateRange::last_days(7)),
            search: None,
        };
        assert!(bare.query(&filter).await.unwrap_err().is_query_unsupported());

        let a = query_with_fallback(&indexed, &filter).await.unwrap();
        let b = query_with_fallback(&bare, &filter).await.unwrap();
        let ids = |vs: &[Visitor]| vs.iter().map(|v| v.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), vec!["VIS-0", "VIS-2"]);
        assert_eq!(ids(&a), ids(&b));
    }

    #[tokio::test]
    async fn fallback_applies_search_text() {
        let bare = MemoryVisitorStore::without_composite_index();
        seed(&bare).await;
        let filter = VisitorFilter {
            status: Some(VisitorStatus::CheckedIn),
            range: Some(DateRange::last_days(30)),
            search: Some("dan".into()),
        };
        let found = query_with_fallback(&bare, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Dan");
    }
}
