// ── Object snapshot cache ──
//
// The object list has no delta query, so every poll replaces the whole
// snapshot. Search and status filters are computed on read.

use std::sync::Arc;

use strum::{Display, EnumIter};
use tokio::sync::watch;
use tracing::debug;

use firedesk_store::ObjectProvider;

use crate::classify::ObjectStatus;
use crate::error::CoreError;
use crate::model::{Object, ObjectId};
use crate::refresh::{Refresh, SingleFlight};

/// Status filter of the object list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ObjectFilter {
    #[default]
    All,
    WithAlarms,
    NoLink,
    Disarmed,
}

impl ObjectFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "Всі",
            Self::WithAlarms => "Є тривоги",
            Self::NoLink => "Нема зв'язку",
            Self::Disarmed => "Знято з охорони",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::WithAlarms,
            Self::WithAlarms => Self::NoLink,
            Self::NoLink => Self::Disarmed,
            Self::Disarmed => Self::All,
        }
    }

    pub fn matches(self, object: &Object) -> bool {
        match self {
            Self::All => true,
            Self::WithAlarms => matches!(object.status(), ObjectStatus::Fire | ObjectStatus::Fault),
            Self::NoLink => !object.flags.is_connected() && object.flags.is_armed(),
            Self::Disarmed => !object.flags.is_armed(),
        }
    }
}

/// Search text plus status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    pub search: String,
    pub filter: ObjectFilter,
}

impl ObjectQuery {
    /// Case-insensitive substring match over the identifying fields.
    pub fn matches_search(&self, object: &Object) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let id = object.id.to_string();
        [
            id.as_str(),
            object.name.as_str(),
            object.address.as_str(),
            object.contract.as_str(),
            object.sim1.as_str(),
            object.sim2.as_str(),
            object.phone(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Per-filter counts over the search-matched objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: usize,
    pub with_alarms: usize,
    pub no_link: usize,
    pub disarmed: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: ObjectFilter) -> usize {
        match filter {
            ObjectFilter::All => self.all,
            ObjectFilter::WithAlarms => self.with_alarms,
            ObjectFilter::NoLink => self.no_link,
            ObjectFilter::Disarmed => self.disarmed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectView {
    pub objects: Vec<Arc<Object>>,
    pub counts: FilterCounts,
}

impl ObjectView {
    /// Counts follow the search only; the list follows search and filter.
    pub fn build(objects: &[Arc<Object>], query: &ObjectQuery) -> Self {
        let mut view = Self::default();
        for object in objects {
            if !query.matches_search(object) {
                continue;
            }
            view.counts.all += 1;
            if ObjectFilter::WithAlarms.matches(object) {
                view.counts.with_alarms += 1;
            }
            if ObjectFilter::NoLink.matches(object) {
                view.counts.no_link += 1;
            }
            if ObjectFilter::Disarmed.matches(object) {
                view.counts.disarmed += 1;
            }
            if query.filter.matches(object) {
                view.objects.push(Arc::clone(object));
            }
        }
        view
    }
}

pub struct ObjectCache {
    objects: watch::Sender<Arc<Vec<Arc<Object>>>>,
    flight: SingleFlight,
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectCache {
    pub fn new() -> Self {
        let (objects, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            objects,
            flight: SingleFlight::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Object>>> {
        Arc::clone(&self.objects.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Object>>>> {
        self.objects.subscribe()
    }

    pub fn get(&self, id: ObjectId) -> Option<Arc<Object>> {
        self.objects.borrow().iter().find(|o| o.id == id).cloned()
    }

    /// Replace the snapshot with a fresh full list.
    pub async fn poll(&self, store: &dyn ObjectProvider) -> Result<Refresh<usize>, CoreError> {
        let Some(_guard) = self.flight.try_begin() else {
            debug!("object poll already in flight");
            return Ok(Refresh::Skipped);
        };

        let rows = store.list_objects().await?;
        let objects: Vec<Arc<Object>> = rows.into_iter().map(|r| Arc::new(Object::from(r))).collect();
        let count = objects.len();
        self.objects.send_replace(Arc::new(objects));
        debug!(count, "object list refreshed");
        Ok(Refresh::Done(count))
    }

    /// Swap in a detail-loaded object with the same ID. Returns `false`
    /// when the list no longer holds that ID.
    pub fn apply_detail(&self, object: Object) -> bool {
        let object = Arc::new(object);
        self.objects.send_if_modified(|list| {
            let Some(index) = list.iter().position(|o| o.id == object.id) else {
                return false;
            };
            let mut next = Vec::clone(list);
            if let Some(slot) = next.get_mut(index) {
                *slot = Arc::clone(&object);
            }
            *list = Arc::new(next);
            true
        })
    }

    /// Search, filter and count in one pass.
    pub fn view(&self, query: &ObjectQuery) -> ObjectView {
        ObjectView::build(&self.snapshot(), query)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::StatusFlags;
    use pretty_assertions::assert_eq;

    fn object(id: i64, name: &str, flags: (i64, i64, i64, i64)) -> Object {
        Object {
            id: ObjectId(id),
            name: name.to_owned(),
            address: format!("вул. Тестова, {id}"),
            contract: format!("ПС-{id}"),
            sim1: format!("+38067{id}"),
            sim2: String::new(),
            flags: StatusFlags {
                alarm: flags.0,
                guard: flags.1,
                tech_alarm: flags.2,
                conn: flags.3,
            },
            detail: None,
        }
    }

    fn cache_with(objects: Vec<Object>) -> ObjectCache {
        let cache = ObjectCache::new();
        cache
            .objects
            .send_replace(Arc::new(objects.into_iter().map(Arc::new).collect()));
        cache
    }

    #[test]
    fn counts_follow_search_not_filter() {
        let cache = cache_with(vec![
            object(1, "Школа", (1, 1, 0, 1)),
            object(2, "Школа мистецтв", (0, 1, 0, 0)),
            object(3, "Аптека", (0, 0, 0, 1)),
        ]);
        let view = cache.view(&ObjectQuery {
            search: "ШКОЛА".into(),
            filter: ObjectFilter::WithAlarms,
        });
        let ids: Vec<i64> = view.objects.iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(
            view.counts,
            FilterCounts {
                all: 2,
                with_alarms: 1,
                no_link: 1,
                disarmed: 0,
            }
        );
    }

    #[test]
    fn search_covers_id_contract_and_sims() {
        let cache = cache_with(vec![object(1001, "A", (0, 1, 0, 1)), object(2002, "B", (0, 1, 0, 1))]);
        let hits = |q: &str| {
            cache
                .view(&ObjectQuery {
                    search: q.into(),
                    filter: ObjectFilter::All,
                })
                .objects
                .len()
        };
        assert_eq!(hits("1001"), 1);
        assert_eq!(hits("пс-20"), 1);
        assert_eq!(hits("+38067"), 2);
        assert_eq!(hits("nothing"), 0);
    }

    #[test]
    fn apply_detail_keeps_identity() {
        let cache = cache_with(vec![object(5, "Old", (0, 1, 0, 1))]);
        assert!(cache.apply_detail(object(5, "New", (0, 1, 0, 1))));
        assert_eq!(cache.get(ObjectId(5)).unwrap().name, "New");
        assert!(!cache.apply_detail(object(6, "Ghost", (0, 1, 0, 1))));
        assert_eq!(cache.snapshot().len(), 1);
    }

    #[test]
    fn filter_cycle_returns_to_all() {
        let mut f = ObjectFilter::All;
        for _ in 0..4 {
            f = f.next();
        }
        assert_eq!(f, ObjectFilter::All);
    }
}
